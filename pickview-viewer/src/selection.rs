//! Point-selection state machine
//!
//! A session starts when a picking mode is entered, collects one point (and
//! one marker) per successful click, and ends when the operator confirms,
//! cancels, or switches mode. Confirmation hands the points to the
//! processing service; the reply is turned into a new registry entry.

use crate::config::{SelectionParams, ServiceConfig};
use crate::picking::{raycast, Ray};
use crate::registry::{ObjectId, SceneRegistry};
use crate::remote::{
    Completion, Operation, PlaneSegmentationRequest, ProcessingRequest, ProcessingResponse,
    ProcessingService, RequestTicket, TrajectoryRequest,
};
use crate::scene::{NodeHandle, Renderable, Scene};
use pickview_core::{point_from_array, point_to_array, Color, Error, Point3f, Result, Vector3f};
use tracing::{debug, info, warn};

const PLANE_MARKER_COLOR: u32 = 0xff4444;
const SPLINE_MARKER_COLOR: u32 = 0x44ff44;
const PLANE_PATCH_COLOR: u32 = 0x00c8ff;
const TRAJECTORY_COLOR: u32 = 0xffaa00;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Idle,
    PickingForPlane,
    PickingForSpline,
}

impl SelectionMode {
    pub fn picking(operation: Operation) -> Self {
        match operation {
            Operation::PlaneSegmentation => SelectionMode::PickingForPlane,
            Operation::TrajectoryFitting => SelectionMode::PickingForSpline,
        }
    }

    pub fn operation(self) -> Option<Operation> {
        match self {
            SelectionMode::Idle => None,
            SelectionMode::PickingForPlane => Some(Operation::PlaneSegmentation),
            SelectionMode::PickingForSpline => Some(Operation::TrajectoryFitting),
        }
    }

    pub fn is_picking(self) -> bool {
        self != SelectionMode::Idle
    }
}

/// Pointer affordance the host should show over the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Crosshair,
}

/// What activating an operation control did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// A new picking session started
    Started(SelectionMode),
    /// The session's points were submitted and the mode is back to idle
    Submitted { ticket: RequestTicket, points: usize },
}

#[derive(Debug)]
struct Pick {
    position: Point3f,
    marker: NodeHandle,
}

#[derive(Debug)]
struct PendingRequest {
    ticket: RequestTicket,
    markers: Vec<NodeHandle>,
}

#[derive(Debug)]
pub struct SelectionController {
    mode: SelectionMode,
    picks: Vec<Pick>,
    session: u64,
    pending: Option<PendingRequest>,
    params: SelectionParams,
    service: ServiceConfig,
}

impl SelectionController {
    pub fn new(params: SelectionParams, service: ServiceConfig) -> Self {
        Self {
            mode: SelectionMode::Idle,
            picks: Vec::new(),
            session: 0,
            pending: None,
            params,
            service,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn cursor(&self) -> Cursor {
        if self.mode.is_picking() {
            Cursor::Crosshair
        } else {
            Cursor::Default
        }
    }

    /// Points recorded in the current session, in click order
    pub fn points(&self) -> Vec<Point3f> {
        self.picks.iter().map(|p| p.position).collect()
    }

    pub fn pick_count(&self) -> usize {
        self.picks.len()
    }

    /// Markers currently attached by this controller, including those of an
    /// outstanding request
    pub fn marker_count(&self) -> usize {
        self.picks.len() + self.pending.as_ref().map_or(0, |p| p.markers.len())
    }

    pub fn is_request_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Points needed before `operation` can be submitted
    pub fn required_points(&self, operation: Operation) -> usize {
        match operation {
            Operation::PlaneSegmentation => self.params.min_plane_points,
            Operation::TrajectoryFitting => self.params.min_spline_points,
        }
    }

    /// Handle the control for `operation`: start picking for it, or submit
    /// when already picking for it
    pub fn activate(
        &mut self,
        operation: Operation,
        scene: &mut Scene,
        service: &dyn ProcessingService,
    ) -> Result<Activation> {
        let target = SelectionMode::picking(operation);
        if self.mode == target {
            let points = self.picks.len();
            let ticket = self.submit(scene, service)?;
            Ok(Activation::Submitted { ticket, points })
        } else {
            self.begin(target, scene);
            Ok(Activation::Started(target))
        }
    }

    /// Tear down the current session and start a fresh one in `mode`
    pub fn begin(&mut self, mode: SelectionMode, scene: &mut Scene) {
        self.teardown(scene);
        self.mode = mode;
        info!(?mode, session = self.session, "selection session started");
    }

    /// Abandon the current session without submitting
    pub fn cancel(&mut self, scene: &mut Scene) {
        self.teardown(scene);
        self.mode = SelectionMode::Idle;
    }

    /// Record the nearest visible surface point under `ray`, if any
    pub fn click(&mut self, scene: &mut Scene, registry: &SceneRegistry, ray: &Ray) -> Option<Point3f> {
        let color = match self.mode {
            SelectionMode::Idle => return None,
            SelectionMode::PickingForPlane => PLANE_MARKER_COLOR,
            SelectionMode::PickingForSpline => SPLINE_MARKER_COLOR,
        };

        let hit = raycast(scene, registry, ray, self.params.point_pick_threshold)?;
        let marker = scene.attach(Renderable::marker(
            hit.point,
            self.params.marker_radius,
            Color::from_hex(color),
        ));
        self.picks.push(Pick {
            position: hit.point,
            marker,
        });

        debug!(object = %hit.object, point = ?hit.point, picks = self.picks.len(), "picked point");
        Some(hit.point)
    }

    /// Send the session's points to the service.
    ///
    /// Refuses, leaving the session untouched, when there are too few points
    /// or another request is still outstanding. If the service rejects the
    /// request outright the session is torn down.
    pub fn submit(&mut self, scene: &mut Scene, service: &dyn ProcessingService) -> Result<RequestTicket> {
        let Some(operation) = self.mode.operation() else {
            return Err(Error::InvalidData("no selection session is active".to_string()));
        };

        let required = self.required_points(operation);
        if self.picks.len() < required {
            return Err(Error::NotEnoughPoints {
                operation: operation.label(),
                required,
                picked: self.picks.len(),
            });
        }
        if self.pending.is_some() {
            warn!("refusing to submit while a request is in flight");
            return Err(Error::RequestPending);
        }

        let points: Vec<[f32; 3]> = self.picks.iter().map(|p| point_to_array(&p.position)).collect();
        let request = match operation {
            Operation::PlaneSegmentation => ProcessingRequest::SegmentPlane(PlaneSegmentationRequest {
                points,
                threshold: self.service.plane_threshold,
                max_iterations: self.service.plane_max_iterations,
            }),
            Operation::TrajectoryFitting => ProcessingRequest::FitTrajectory(TrajectoryRequest {
                control_points: points,
                degree: self.service.spline_degree,
                num_samples: self.service.spline_samples,
                method: self.service.spline_method,
            }),
        };

        let ticket = RequestTicket {
            session: self.session,
            operation,
        };
        if let Err(e) = service.submit(ticket, request) {
            self.cancel(scene);
            return Err(e);
        }

        let markers = self.picks.drain(..).map(|p| p.marker).collect();
        self.pending = Some(PendingRequest { ticket, markers });
        self.mode = SelectionMode::Idle;
        Ok(ticket)
    }

    /// Apply a finished request.
    ///
    /// Completions that do not belong to the outstanding request, or whose
    /// session has since been replaced, are dropped and return `Ok(None)`. A
    /// failed or unusable reply clears the markers and returns the error.
    pub fn complete(
        &mut self,
        completion: Completion,
        scene: &mut Scene,
        registry: &mut SceneRegistry,
    ) -> Result<Option<ObjectId>> {
        if self.pending.as_ref().map(|p| p.ticket) != Some(completion.ticket) {
            warn!(ticket = ?completion.ticket, "ignoring completion for an unknown request");
            return Ok(None);
        }
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        for marker in pending.markers {
            scene.detach(marker);
        }

        if completion.ticket.session != self.session {
            info!(ticket = ?completion.ticket, "discarding reply for a superseded session");
            return Ok(None);
        }
        self.session += 1;

        let id = match completion.result? {
            ProcessingResponse::Plane(response) => {
                let patch = Renderable::plane_patch(
                    point_from_array(response.plane.point),
                    Vector3f::from(response.plane.normal),
                    self.params.patch_size,
                    Color::from_hex(PLANE_PATCH_COLOR),
                )
                .ok_or_else(|| Error::Remote("plane normal is degenerate".to_string()))?;
                registry.add(scene, format!("Plane ({} inliers)", response.num_inliers), patch)
            }
            ProcessingResponse::Trajectory(response) => {
                if response.curve_points.len() < 2 {
                    return Err(Error::Remote("trajectory has fewer than two points".to_string()));
                }
                let points: Vec<Point3f> = response.curve_points.into_iter().map(point_from_array).collect();
                let name = format!("Trajectory ({} points)", points.len());
                registry.add(scene, name, Renderable::line_strip(points, Color::from_hex(TRAJECTORY_COLOR)))
            }
        };

        Ok(Some(id))
    }

    /// Detach every marker this controller owns and invalidate the session
    fn teardown(&mut self, scene: &mut Scene) {
        for pick in self.picks.drain(..) {
            scene.detach(pick.marker);
        }
        if let Some(pending) = self.pending.as_mut() {
            for marker in pending.markers.drain(..) {
                scene.detach(marker);
            }
        }
        self.session += 1;
    }
}
