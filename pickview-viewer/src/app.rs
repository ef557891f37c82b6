//! Application context
//!
//! [`AppContext`] owns every viewer component and is the only place state
//! changes: input arrives through [`AppContext::dispatch`], and
//! [`AppContext::tick`] applies finished requests and hands a frame to the
//! renderer. Failures never escape either entry point; they end up on the
//! status line.

use crate::camera::{OrbitCameraController, Viewport};
use crate::config::ViewerConfig;
use crate::events::{AppEvent, EventOutcome};
use crate::registry::{ObjectId, ObjectListView, SceneRegistry};
use crate::remote::{Completion, HttpProcessingService, Operation, ProcessingService};
use crate::scene::{Frame, RenderSink, Renderable, Scene};
use crate::selection::{Activation, Cursor, SelectionController};
use pickview_core::{fit, Color, Error, Result, Transform3D};
use pickview_io::{decode_file, GeometryKind, LoadedGeometry};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use tracing::{debug, info, warn};

const MESH_COLOR: u32 = 0x0077ff;
const POINT_SIZE: f32 = 0.02;

pub struct AppContext {
    config: ViewerConfig,
    scene: Scene,
    registry: SceneRegistry,
    camera: OrbitCameraController,
    selection: SelectionController,
    service: Box<dyn ProcessingService>,
    completions: Receiver<Completion>,
    viewport: Viewport,
    status: String,
}

impl AppContext {
    /// Build a context around an existing service and the receiving end of
    /// the channel it reports completions on
    pub fn new(
        config: ViewerConfig,
        service: Box<dyn ProcessingService>,
        completions: Receiver<Completion>,
    ) -> Self {
        Self {
            camera: OrbitCameraController::new(config.camera.clone()),
            selection: SelectionController::new(config.selection.clone(), config.service.clone()),
            scene: Scene::new(),
            registry: SceneRegistry::new(),
            service,
            completions,
            viewport: Viewport::default(),
            status: String::new(),
            config,
        }
    }

    /// Build a context that talks to the configured HTTP service, spawning
    /// requests on `runtime`
    pub fn with_http_service(config: ViewerConfig, runtime: tokio::runtime::Handle) -> Result<Self> {
        config.validate()?;
        let (sender, receiver) = mpsc::channel();
        let service = HttpProcessingService::new(&config.service, runtime, sender)?;
        Ok(Self::new(config, Box::new(service), receiver))
    }

    pub fn set_list_view(&mut self, view: Box<dyn ObjectListView>) {
        self.registry.set_view(view);
    }

    /// Route one input event to the component it concerns
    pub fn dispatch(&mut self, event: AppEvent) -> EventOutcome {
        match event {
            AppEvent::PointerDown { x, y } => self.camera.pointer_down(x, y),
            AppEvent::PointerMove { x, y } => self.camera.pointer_move(x, y),
            AppEvent::PointerUp => self.camera.pointer_up(),
            AppEvent::Wheel { delta_y } => {
                self.camera.wheel(delta_y);
                return EventOutcome::PreventDefault;
            }
            AppEvent::Click { x, y } => self.click(x, y),
            AppEvent::Resize { width, height } => self.viewport = Viewport::new(width, height),
            AppEvent::ActivatePlane => self.activate(Operation::PlaneSegmentation),
            AppEvent::ActivateSpline => self.activate(Operation::TrajectoryFitting),
            AppEvent::CancelSelection => {
                if self.selection.mode().is_picking() {
                    self.selection.cancel(&mut self.scene);
                    self.status = "Selection cancelled".to_string();
                }
            }
            AppEvent::ToggleVisibility(id) => self.registry.toggle_visibility(&mut self.scene, id),
            AppEvent::RemoveObject(id) => self.registry.remove(&mut self.scene, id),
            AppEvent::LoadFile { name, bytes } => {
                self.status = format!("Loading {name}...");
                if let Err(e) = self.load_file(&name, &bytes) {
                    warn!(%name, error = %e, "failed to load file");
                    self.status = match e {
                        Error::UnsupportedFormat(message) => message,
                        _ => format!("Error parsing {name}"),
                    };
                }
            }
            AppEvent::RequestCompleted(completion) => self.apply_completion(completion),
        }
        EventOutcome::Handled
    }

    /// Decode, normalize and register a file buffer.
    ///
    /// Empty decoder output is reported as [`Error::InvalidData`] and adds
    /// nothing. Geometry whose bounds cannot be normalized is still added,
    /// untransformed.
    pub fn load_file(&mut self, name: &str, bytes: &[u8]) -> Result<ObjectId> {
        info!(%name, bytes = bytes.len(), "loading file");
        let LoadedGeometry { kind, geometry } = decode_file(name, bytes)?;
        if geometry.is_empty() {
            return Err(Error::InvalidData(format!("{name} contains no geometry")));
        }

        let transform = match fit(&geometry, &self.config.fit) {
            Ok(fitted) => {
                self.camera.set_distance(self.config.fit.framing_distance());
                fitted.to_transform()
            }
            Err(e) => {
                warn!(%name, error = %e, "leaving geometry unnormalized");
                Transform3D::identity()
            }
        };

        let count = geometry.vertex_count();
        let renderable = match kind {
            GeometryKind::Mesh => Renderable::mesh(geometry, Color::from_hex(MESH_COLOR)),
            GeometryKind::PointCloud => Renderable::points(geometry, POINT_SIZE),
        }
        .with_transform(transform);

        let id = self.registry.add(&mut self.scene, name, renderable);
        self.status = format!("Loaded {name} ({count} {})", kind.element_noun());
        Ok(id)
    }

    /// Apply finished requests, then hand the current frame to `sink`
    pub fn tick(&mut self, sink: &mut dyn RenderSink) {
        loop {
            match self.completions.try_recv() {
                Ok(completion) => self.apply_completion(completion),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("completion channel closed");
                    break;
                }
            }
        }

        let camera = self.camera.camera(self.viewport);
        let frame = Frame {
            eye: camera.position,
            target: camera.target,
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            renderables: self.scene.visible_renderables().collect(),
        };
        sink.render(&frame);
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn camera(&self) -> &OrbitCameraController {
        &self.camera
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn cursor(&self) -> Cursor {
        self.selection.cursor()
    }

    fn activate(&mut self, operation: Operation) {
        match self
            .selection
            .activate(operation, &mut self.scene, self.service.as_ref())
        {
            Ok(Activation::Started(_)) => self.status = self.pick_prompt(operation),
            Ok(Activation::Submitted { points, .. }) => {
                self.status = format!("{}: sent {points} points, waiting for results...", operation.label());
            }
            Err(e) => {
                warn!(error = %e, "selection action refused");
                self.status = e.to_string();
            }
        }
    }

    fn click(&mut self, x: f32, y: f32) {
        let Some(operation) = self.selection.mode().operation() else {
            return;
        };
        let Some(ray) = self.camera.camera(self.viewport).ray_through_pixel(x, y, self.viewport) else {
            return;
        };

        if self.selection.click(&mut self.scene, &self.registry, &ray).is_some() {
            self.status = self.pick_prompt(operation);
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        let label = completion.ticket.operation.label();
        match self.selection.complete(completion, &mut self.scene, &mut self.registry) {
            Ok(Some(id)) => {
                if let Some(entry) = self.registry.get(id) {
                    info!(%id, name = %entry.name, "added processing result");
                    self.status = format!("Added {}", entry.name);
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "{label} failed");
                self.status = format!("{label} failed: {e}");
            }
        }
    }

    fn pick_prompt(&self, operation: Operation) -> String {
        format!(
            "{}: click the model to pick points ({}/{}), then press the button again",
            operation.label(),
            self.selection.pick_count(),
            self.selection.required_points(operation),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{ProcessingRequest, RequestTicket};

    struct NullService;

    impl ProcessingService for NullService {
        fn submit(&self, _ticket: RequestTicket, _request: ProcessingRequest) -> Result<()> {
            Ok(())
        }
    }

    fn context() -> AppContext {
        let (_sender, receiver) = mpsc::channel();
        AppContext::new(ViewerConfig::default(), Box::new(NullService), receiver)
    }

    #[test]
    fn test_load_mesh_sets_status_and_camera() {
        let mut app = context();
        app.dispatch(AppEvent::LoadFile {
            name: "tri.obj".to_string(),
            bytes: b"v 0 0 0\nv 4 0 0\nv 0 4 0\nf 1 2 3\n".to_vec(),
        });

        assert_eq!(app.status(), "Loaded tri.obj (3 vertices)");
        assert_eq!(app.registry().len(), 1);
        assert_eq!(app.camera().pose().distance, 6.0);
    }

    #[test]
    fn test_load_point_cloud() {
        let mut app = context();
        let ply = b"ply\nformat ascii 1.0\nelement vertex 2\nend_header\n0 0 0\n1 1 1\n";
        let id = app.load_file("scan.ply", ply).unwrap();
        assert_eq!(app.status(), "Loaded scan.ply (2 points)");
        assert_eq!(app.registry().get(id).unwrap().name, "scan.ply");
    }

    #[test]
    fn test_unsupported_extension_message() {
        let mut app = context();
        app.dispatch(AppEvent::LoadFile {
            name: "part.stl".to_string(),
            bytes: b"solid".to_vec(),
        });
        assert_eq!(app.status(), "STL format not yet supported. Use OBJ or PLY.");
        assert!(app.registry().is_empty());
    }

    #[test]
    fn test_empty_file_is_a_parse_error() {
        let mut app = context();
        app.dispatch(AppEvent::LoadFile {
            name: "empty.obj".to_string(),
            bytes: b"# nothing here\n".to_vec(),
        });
        assert_eq!(app.status(), "Error parsing empty.obj");
        assert!(app.registry().is_empty());
    }

    #[test]
    fn test_degenerate_bounds_still_loads() {
        let mut app = context();
        let ply = b"ply\nformat ascii 1.0\nelement vertex 1\nend_header\n1 2 3\n";
        let id = app.load_file("dot.ply", ply).unwrap();
        let entry = app.registry().get(id).unwrap();
        let node = app.scene().node(&entry.node).unwrap();
        assert!(node.renderable.transform.is_identity(1e-6));
        assert_eq!(app.camera().pose().distance, 5.0);
    }

    #[test]
    fn test_wheel_prevents_default() {
        let mut app = context();
        assert_eq!(app.dispatch(AppEvent::Wheel { delta_y: 1.0 }), EventOutcome::PreventDefault);
        assert_eq!(app.dispatch(AppEvent::PointerUp), EventOutcome::Handled);
    }

    #[test]
    fn test_selection_prompts() {
        let mut app = context();
        app.dispatch(AppEvent::ActivateSpline);
        assert_eq!(app.cursor(), Cursor::Crosshair);
        assert!(app.status().contains("(0/2)"));

        app.dispatch(AppEvent::ActivateSpline);
        assert_eq!(app.status(), "Trajectory fitting needs at least 2 points, 0 picked so far");

        app.dispatch(AppEvent::CancelSelection);
        assert_eq!(app.cursor(), Cursor::Default);
        assert_eq!(app.status(), "Selection cancelled");
    }
}
