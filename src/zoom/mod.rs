//! Auto zoom and pan
//!
//! The virtual camera that crops the raw frame, the easing it animates with,
//! and the policy deciding when to zoom in and out.

pub mod camera;
pub mod easing;
pub mod geometry;
pub mod policy;

pub use camera::{VirtualCameraController, ZoomAnimation};
pub use geometry::{CursorPosition, SourceRect};
pub use policy::{TriggerPolicy, ZoomSignal};
