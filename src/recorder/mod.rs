//! Recording system module
//!
//! - Acquired media tracks and recording errors
//! - RecordingCoordinator owning the session state machine and the per-tick pipeline
//! - Recorder, the shared handle running the render loop
//! - EncoderSink seam to the external encoder

pub mod channel;
pub mod coordinator;
pub mod driver;
pub mod sink;
pub mod state;

pub use channel::{RecordingError, RecordingResult, TrackSet};
pub use coordinator::{RecorderServices, RecordingCoordinator, RecordingEvent, ZoomStatus};
pub use driver::Recorder;
pub use sink::{CombinedStream, EncoderFactory, EncoderOptions, EncoderSink};
pub use state::{
    AudioInput, CropInfo, RecordingOptions, RecordingOutput, RecordingSegment, RecordingState,
    VideoQuality,
};
