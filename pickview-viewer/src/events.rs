//! Typed input events fed to [`crate::app::AppContext::dispatch`]

use crate::registry::ObjectId;
use crate::remote::Completion;

/// Everything the host can tell the viewer
#[derive(Debug)]
pub enum AppEvent {
    /// Primary button pressed on the canvas (starts an orbit drag)
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    /// Wheel over the canvas; positive zooms out
    Wheel { delta_y: f32 },
    /// Click on the canvas, used for picking while a selection is active
    Click { x: f32, y: f32 },
    Resize { width: f32, height: f32 },
    /// The plane control was pressed
    ActivatePlane,
    /// The spline control was pressed
    ActivateSpline,
    CancelSelection,
    ToggleVisibility(ObjectId),
    RemoveObject(ObjectId),
    /// A file was chosen; `name` is used for extension dispatch and display
    LoadFile { name: String, bytes: Vec<u8> },
    /// A processing request finished. Normally delivered through the
    /// completion queue drained by `tick`.
    RequestCompleted(Completion),
}

/// How the host should treat the native event after dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Handled,
    /// Suppress the host's default action (page scroll for wheel events)
    PreventDefault,
}
