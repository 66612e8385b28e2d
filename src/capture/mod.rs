//! Capture collaborators
//!
//! Source and display descriptions, the stream traits implemented by the host
//! platform layer, and the input activity bridge.

pub mod input;
pub mod traits;

// Re-export traits
pub use traits::{
    resolve_display, AudioChunk, AudioStream, AudioTrackInfo, CaptureRegistry, CaptureSource,
    DisplayBounds, DisplayInfo, DisplayProvider, SourceKind, VideoStream,
};
