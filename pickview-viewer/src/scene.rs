//! The shared scene graph and the render boundary
//!
//! The scene only stores renderables; drawing them is the job of whatever
//! implements [`RenderSink`]. Nodes are addressed through [`NodeHandle`]s,
//! which cannot be cloned, so each node has exactly one owner responsible
//! for detaching it.

use nalgebra::{Matrix4, Rotation3};
use pickview_core::{Color, DecodedGeometry, Point3f, Transform3D, Vector3f};
use std::collections::BTreeMap;

/// Exclusive handle to an attached scene node
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(u64);

/// What a node draws
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Shaded triangles
    Mesh(DecodedGeometry),
    /// Unconnected points, coloured per vertex when the geometry has colours
    Points { geometry: DecodedGeometry, size: f32 },
    /// Connected polyline
    LineStrip(Vec<Point3f>),
    /// Small sphere marking a picked point
    Marker { position: Point3f, radius: f32 },
}

/// A primitive with its colour and model transform
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub primitive: Primitive,
    pub color: Color,
    pub transform: Transform3D,
}

impl Renderable {
    pub fn new(primitive: Primitive, color: Color) -> Self {
        Self {
            primitive,
            color,
            transform: Transform3D::identity(),
        }
    }

    pub fn mesh(geometry: DecodedGeometry, color: Color) -> Self {
        Self::new(Primitive::Mesh(geometry), color)
    }

    pub fn points(geometry: DecodedGeometry, size: f32) -> Self {
        Self::new(Primitive::Points { geometry, size }, Color::WHITE)
    }

    pub fn line_strip(points: Vec<Point3f>, color: Color) -> Self {
        Self::new(Primitive::LineStrip(points), color)
    }

    pub fn marker(position: Point3f, radius: f32, color: Color) -> Self {
        Self::new(Primitive::Marker { position, radius }, color)
    }

    /// Square patch of edge `size` centred on `center`, facing `normal`.
    ///
    /// Returns `None` for a zero or non-finite normal.
    pub fn plane_patch(center: Point3f, normal: Vector3f, size: f32, color: Color) -> Option<Self> {
        let length = normal.norm();
        if !length.is_finite() || length <= f32::EPSILON {
            return None;
        }

        let half = size * 0.5;
        let geometry = DecodedGeometry::mesh(
            vec![
                Point3f::new(-half, -half, 0.0),
                Point3f::new(half, -half, 0.0),
                Point3f::new(half, half, 0.0),
                Point3f::new(-half, half, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );

        // Rotate the patch's +Z onto the normal; antiparallel needs an explicit half turn
        let rotation = Rotation3::rotation_between(&Vector3f::z(), &(normal / length))
            .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3f::x_axis(), std::f32::consts::PI));
        let matrix = Matrix4::new_translation(&center.coords) * rotation.to_homogeneous();

        Some(Self::mesh(geometry, color).with_transform(Transform3D::from(matrix)))
    }

    pub fn with_transform(mut self, transform: Transform3D) -> Self {
        self.transform = transform;
        self
    }
}

/// A renderable plus its visibility flag
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub renderable: Renderable,
    pub visible: bool,
}

/// Attached renderables, iterated in attach order
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<u64, SceneNode>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a renderable; it starts visible
    pub fn attach(&mut self, renderable: Renderable) -> NodeHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            SceneNode {
                renderable,
                visible: true,
            },
        );
        NodeHandle(id)
    }

    /// Detach a node, giving its renderable back
    pub fn detach(&mut self, handle: NodeHandle) -> Option<Renderable> {
        self.nodes.remove(&handle.0).map(|node| node.renderable)
    }

    pub fn set_visible(&mut self, handle: &NodeHandle, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&handle.0) {
            node.visible = visible;
        }
    }

    pub fn node(&self, handle: &NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(&handle.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visible renderables in attach order
    pub fn visible_renderables(&self) -> impl Iterator<Item = &Renderable> {
        self.nodes
            .values()
            .filter(|node| node.visible)
            .map(|node| &node.renderable)
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug)]
pub struct Frame<'a> {
    pub eye: Point3f,
    pub target: Point3f,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub renderables: Vec<&'a Renderable>,
}

/// The external render call, invoked once per tick
pub trait RenderSink {
    fn render(&mut self, frame: &Frame<'_>);
}
