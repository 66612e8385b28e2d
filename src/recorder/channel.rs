//! Recording errors and acquired media tracks
//!
//! A session owns at most one primary video stream, one webcam stream and one
//! microphone stream. They are released through [`TrackSet::stop_all`], which
//! stops each track exactly once no matter how often it is called.

use crate::capture::traits::{AudioStream, VideoStream};
use thiserror::Error;

/// Errors that can occur during recording
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Capture source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Streams acquired for one recording session
#[derive(Default)]
pub struct TrackSet {
    pub primary: Option<Box<dyn VideoStream>>,
    pub webcam: Option<Box<dyn VideoStream>>,
    pub microphone: Option<Box<dyn AudioStream>>,
}

impl TrackSet {
    /// Stop and release every track still held
    pub fn stop_all(&mut self) {
        if let Some(mut stream) = self.primary.take() {
            tracing::debug!("Stopping primary stream {}", stream.id());
            stream.stop();
        }
        if let Some(mut stream) = self.webcam.take() {
            tracing::debug!("Stopping webcam stream {}", stream.id());
            stream.stop();
        }
        if let Some(mut stream) = self.microphone.take() {
            tracing::debug!("Stopping microphone stream {}", stream.id());
            stream.stop();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.webcam.is_none() && self.microphone.is_none()
    }

    /// Short description for logs
    pub fn summary(&self) -> String {
        format!(
            "primary={}, webcam={}, microphone={}",
            self.primary.is_some(),
            self.webcam.is_some(),
            self.microphone.is_some()
        )
    }
}

impl Drop for TrackSet {
    fn drop(&mut self) {
        self.stop_all();
    }
}
