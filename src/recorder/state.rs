//! Recording state management
//!
//! Defines the recording state machine, per-segment timing and the options a
//! recording is started with.

use crate::compositor::layout::OutputResolution;
use crate::settings::RecordingSettings;
use crate::zoom::geometry::SourceRect;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Container produced by the encoder sink
pub const RECORDING_MIME_TYPE: &str = "video/webm; codecs=vp9";

/// Audio bitrate used for every quality preset
pub const AUDIO_BITRATE: u32 = 128_000;

/// Current state of the recording system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No recording in progress
    #[default]
    Idle,
    /// Acquiring streams and starting the encoder
    Preparing,
    /// Currently recording
    Recording,
    /// Recording is paused, the preview keeps running
    Paused,
    /// Waiting for the encoder to finalize
    Stopping,
}

impl RecordingState {
    /// Whether a session exists in this state
    pub fn is_active(&self) -> bool {
        !matches!(self, RecordingState::Idle)
    }
}

/// A continuous stretch of recording between pauses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSegment {
    pub index: usize,
    pub duration_ms: f64,
    /// Process time relative to session start
    pub process_time_start_ms: f64,
    pub process_time_end_ms: f64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl RecordingSegment {
    pub fn new(index: usize, process_time_ms: f64) -> Self {
        Self {
            index,
            duration_ms: 0.0,
            process_time_start_ms: process_time_ms,
            process_time_end_ms: process_time_ms,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Close the segment; closing twice keeps the first end time
    pub fn end(&mut self, process_time_ms: f64) {
        if !self.is_open() {
            return;
        }
        self.process_time_end_ms = process_time_ms.max(self.process_time_start_ms);
        self.duration_ms = self.process_time_end_ms - self.process_time_start_ms;
        self.ended_at = Some(Utc::now());
    }

    /// Duration so far, counting an open segment up to `process_time_ms`
    pub fn elapsed_ms(&self, process_time_ms: f64) -> f64 {
        if self.is_open() {
            (process_time_ms - self.process_time_start_ms).max(0.0)
        } else {
            self.duration_ms
        }
    }
}

/// Video quality preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl VideoQuality {
    /// Target video bitrate in bits per second
    pub fn video_bitrate(&self) -> u32 {
        match self {
            VideoQuality::Low => 250_000,
            VideoQuality::Medium => 2_500_000,
            VideoQuality::High => 5_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioInput {
    #[default]
    None,
    Microphone,
}

/// Custom capture area in logical display points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropInfo {
    pub rect: SourceRect,
    pub scale_factor: f64,
}

impl CropInfo {
    /// The crop in raw video pixels
    pub fn to_raw(&self) -> SourceRect {
        let scale = if self.scale_factor.is_finite() && self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        };
        SourceRect::new(
            self.rect.x * scale,
            self.rect.y * scale,
            self.rect.width * scale,
            self.rect.height * scale,
        )
    }
}

/// Options for starting a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordingOptions {
    pub frame_rate: u32,
    pub quality: VideoQuality,
    pub resolution: OutputResolution,
    pub audio_input: AudioInput,
    pub microphone_device_id: Option<String>,
    pub include_webcam: bool,
    pub webcam_device_id: Option<String>,
    /// Record only this part of the source
    pub crop: Option<CropInfo>,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self::from_settings(&RecordingSettings::default())
    }
}

impl RecordingOptions {
    pub fn from_settings(settings: &RecordingSettings) -> Self {
        Self {
            frame_rate: settings.frame_rate,
            quality: settings.default_quality,
            resolution: settings.resolution,
            audio_input: settings.audio_input,
            microphone_device_id: None,
            include_webcam: settings.include_webcam,
            webcam_device_id: None,
            crop: None,
        }
    }

    /// Frame rate used for capture and the render loop
    pub fn effective_frame_rate(&self) -> u32 {
        self.frame_rate.clamp(1, 240)
    }

    pub fn wants_microphone(&self) -> bool {
        self.audio_input == AudioInput::Microphone
    }
}

/// Result of a completed recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub total_duration_ms: f64,
    pub segment_count: usize,
    pub suggested_file_name: String,
}

impl RecordingOutput {
    pub fn new(bytes: Vec<u8>, segments: &[RecordingSegment], finished_at: DateTime<Utc>) -> Self {
        Self {
            bytes,
            mime_type: RECORDING_MIME_TYPE.to_string(),
            total_duration_ms: segments.iter().map(|s| s.duration_ms).sum(),
            segment_count: segments.len(),
            suggested_file_name: format!(
                "captrix-recording-{}.webm",
                finished_at.timestamp_millis()
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RecordingState::Stopping).unwrap(),
            "\"stopping\""
        );
        assert_eq!(RecordingState::default(), RecordingState::Idle);
        assert!(!RecordingState::Idle.is_active());
        assert!(RecordingState::Paused.is_active());
    }

    #[test]
    fn test_segment_end_is_sticky() {
        let mut segment = RecordingSegment::new(0, 100.0);
        assert_eq!(segment.elapsed_ms(350.0), 250.0);

        segment.end(400.0);
        segment.end(900.0);
        assert_eq!(segment.duration_ms, 300.0);
        assert_eq!(segment.elapsed_ms(5000.0), 300.0);
        assert!(!segment.is_open());
    }

    #[test]
    fn test_quality_bitrates() {
        assert_eq!(VideoQuality::Low.video_bitrate(), 250_000);
        assert_eq!(VideoQuality::Medium.video_bitrate(), 2_500_000);
        assert_eq!(VideoQuality::High.video_bitrate(), 5_000_000);
    }

    #[test]
    fn test_crop_scaled_to_raw() {
        let crop = CropInfo {
            rect: SourceRect::new(10.0, 20.0, 300.0, 200.0),
            scale_factor: 2.0,
        };
        assert_eq!(crop.to_raw(), SourceRect::new(20.0, 40.0, 600.0, 400.0));

        let bad_scale = CropInfo {
            scale_factor: 0.0,
            ..crop
        };
        assert_eq!(bad_scale.to_raw(), crop.rect);
    }

    #[test]
    fn test_options_from_settings() {
        let settings = RecordingSettings {
            audio_input: AudioInput::Microphone,
            frame_rate: 0,
            ..Default::default()
        };
        let options = RecordingOptions::from_settings(&settings);
        assert!(options.wants_microphone());
        assert_eq!(options.quality, VideoQuality::High);
        assert_eq!(options.effective_frame_rate(), 1);
    }

    #[test]
    fn test_options_partial_json() {
        let options: RecordingOptions =
            serde_json::from_str(r#"{"quality":"low","includeWebcam":false}"#).unwrap();
        assert_eq!(options.quality, VideoQuality::Low);
        assert!(!options.include_webcam);
        assert_eq!(options.frame_rate, 60);
    }

    #[test]
    fn test_output_metadata() {
        let mut a = RecordingSegment::new(0, 0.0);
        a.end(1000.0);
        let mut b = RecordingSegment::new(1, 3000.0);
        b.end(3500.0);

        let finished = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let output = RecordingOutput::new(vec![1, 2, 3], &[a, b], finished);

        assert_eq!(output.total_duration_ms, 1500.0);
        assert_eq!(output.segment_count, 2);
        assert_eq!(output.mime_type, "video/webm; codecs=vp9");
        assert_eq!(
            output.suggested_file_name,
            "captrix-recording-1700000000000.webm"
        );
    }
}
