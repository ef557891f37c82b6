//! Viewer core for pickview
//!
//! Headless, renderer-agnostic state for an interactive model viewer: an
//! orbit camera, a scene of renderables with a user-facing object registry,
//! ray picking, and a point-selection workflow that sends picked points to a
//! remote processing service for plane segmentation or trajectory fitting.

pub mod app;
pub mod camera;
pub mod config;
pub mod events;
pub mod picking;
pub mod registry;
pub mod remote;
pub mod scene;
pub mod selection;

pub use app::AppContext;
pub use camera::{Camera, CameraPose, OrbitCameraController, Viewport};
pub use config::{CameraParams, SelectionParams, ServiceConfig, ViewerConfig};
pub use events::{AppEvent, EventOutcome};
pub use picking::{raycast, Hit, Ray};
pub use registry::{ListRow, ObjectId, ObjectListView, SceneEntry, SceneRegistry};
pub use remote::{
    Completion, HttpProcessingService, Operation, ProcessingRequest, ProcessingResponse,
    ProcessingService, RequestTicket, SplineMethod,
};
pub use scene::{Frame, NodeHandle, Primitive, RenderSink, Renderable, Scene};
pub use selection::{Activation, Cursor, SelectionController, SelectionMode};
