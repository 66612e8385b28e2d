//! Capture trait definitions
//!
//! Platform-agnostic descriptions of capture sources and the collaborator
//! traits the recorder consumes. Actual acquisition lives in the host.

use crate::compositor::frame::{Frame, FrameSize};
use crate::recorder::channel::RecordingResult;
use crate::zoom::geometry::CursorPosition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of a selectable capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Screen,
    Window,
}

/// A selectable screen or window
///
/// Ids follow the `screen:<displayId>:<n>` / `window:<handle>:<n>` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSource {
    pub id: String,
    pub name: String,
    /// Thumbnail as a data URL, if the registry produced one
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl CaptureSource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            thumbnail: None,
        }
    }

    /// Source kind encoded in the id prefix
    pub fn kind(&self) -> Option<SourceKind> {
        match self.id.split(':').next() {
            Some("screen") => Some(SourceKind::Screen),
            Some("window") => Some(SourceKind::Window),
            _ => None,
        }
    }

    /// Display identifier for screen sources
    pub fn display_id(&self) -> Option<u32> {
        let mut parts = self.id.split(':');
        match (parts.next(), parts.next()) {
            (Some("screen"), Some(id)) => id.parse().ok(),
            _ => None,
        }
    }
}

/// Display rectangle in global screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds matching a frame one-to-one at the origin
    pub fn from_size(size: FrameSize) -> Self {
        Self::new(0.0, 0.0, size.width as f64, size.height as f64)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    pub fn center(&self) -> CursorPosition {
        CursorPosition::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Information about a display/screen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    /// Unique display ID
    pub id: u32,

    /// Display bounds in global coordinates (logical points)
    pub bounds: DisplayBounds,

    /// Scale factor (e.g., 2.0 for Retina)
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Whether this is the primary display
    #[serde(default)]
    pub is_primary: bool,
}

fn default_scale_factor() -> f64 {
    1.0
}

/// Format of a microphone track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrackInfo {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Interleaved f32 samples captured from the microphone
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// A live video stream (screen, window or webcam)
#[async_trait]
pub trait VideoStream: Send {
    fn id(&self) -> &str;

    /// Resolves once stream metadata and the first frame are available
    async fn wait_ready(&mut self) -> RecordingResult<()>;

    /// Native frame size, `None` until metadata has loaded
    fn dimensions(&self) -> Option<FrameSize>;

    /// Most recent RGBA frame
    fn latest_frame(&mut self) -> Option<Arc<Frame>>;

    fn stop(&mut self);
}

/// A live microphone stream
pub trait AudioStream: Send {
    fn id(&self) -> &str;

    fn track_info(&self) -> AudioTrackInfo;

    /// Samples captured since the previous call
    fn drain_samples(&mut self) -> Vec<AudioChunk>;

    fn stop(&mut self);
}

/// Enumerates capture targets and acquires their streams
#[async_trait]
pub trait CaptureRegistry: Send + Sync {
    async fn list_sources(&self, kind: SourceKind) -> RecordingResult<Vec<CaptureSource>>;

    async fn acquire_stream(
        &self,
        source: &CaptureSource,
        frame_rate: u32,
    ) -> RecordingResult<Box<dyn VideoStream>>;

    async fn acquire_webcam(
        &self,
        device_id: Option<&str>,
    ) -> RecordingResult<Box<dyn VideoStream>>;

    async fn acquire_microphone(
        &self,
        device_id: Option<&str>,
    ) -> RecordingResult<Box<dyn AudioStream>>;
}

/// Reports connected displays and their bounds
pub trait DisplayProvider: Send + Sync {
    fn list_displays(&self) -> Vec<DisplayInfo>;
}

/// Resolve the display a source is captured from
///
/// Screen sources use the display encoded in their id. Window sources, and
/// screens whose display is gone, use the primary display (or the first one).
pub fn resolve_display(source: &CaptureSource, displays: &[DisplayInfo]) -> Option<DisplayInfo> {
    let by_id = source
        .display_id()
        .and_then(|id| displays.iter().find(|d| d.id == id));

    by_id
        .or_else(|| displays.iter().find(|d| d.is_primary))
        .or_else(|| displays.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(id: u32, x: f64, primary: bool) -> DisplayInfo {
        DisplayInfo {
            id,
            bounds: DisplayBounds::new(x, 0.0, 1920.0, 1080.0),
            scale_factor: 1.0,
            is_primary: primary,
        }
    }

    #[test]
    fn test_source_id_parsing() {
        let screen = CaptureSource::new("screen:2:0", "Display 2");
        assert_eq!(screen.kind(), Some(SourceKind::Screen));
        assert_eq!(screen.display_id(), Some(2));

        let window = CaptureSource::new("window:1234:0", "Editor");
        assert_eq!(window.kind(), Some(SourceKind::Window));
        assert_eq!(window.display_id(), None);

        let bogus = CaptureSource::new("screen:abc:0", "Broken");
        assert_eq!(bogus.display_id(), None);
        assert_eq!(CaptureSource::new("camera:1", "x").kind(), None);
    }

    #[test]
    fn test_resolve_display() {
        let displays = vec![display(1, 0.0, true), display(2, 1920.0, false)];

        let second = CaptureSource::new("screen:2:0", "Display 2");
        assert_eq!(resolve_display(&second, &displays).map(|d| d.id), Some(2));

        let window = CaptureSource::new("window:99:0", "Terminal");
        assert_eq!(resolve_display(&window, &displays).map(|d| d.id), Some(1));

        let missing = CaptureSource::new("screen:7:0", "Unplugged");
        assert_eq!(resolve_display(&missing, &displays).map(|d| d.id), Some(1));

        assert!(resolve_display(&window, &[]).is_none());
    }

    #[test]
    fn test_bounds_contains_is_half_open() {
        let bounds = DisplayBounds::new(1920.0, 0.0, 1920.0, 1080.0);
        assert!(bounds.contains(1920.0, 0.0));
        assert!(bounds.contains(3839.0, 1079.0));
        assert!(!bounds.contains(3840.0, 500.0));
        assert!(!bounds.contains(100.0, 500.0));
    }

    #[test]
    fn test_bounds_center_is_global() {
        let bounds = DisplayBounds::new(1920.0, 0.0, 1920.0, 1080.0);
        assert_eq!(bounds.center(), CursorPosition::new(2880.0, 540.0));
    }
}
