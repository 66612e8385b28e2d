//! Encoder sink interface
//!
//! The encoder itself lives outside this crate. A session creates one sink
//! over the combined stream (the composited canvas plus microphone audio),
//! pushes samples into it each tick and collects the encoded chunks.

use super::channel::RecordingResult;
use super::state::{VideoQuality, AUDIO_BITRATE, RECORDING_MIME_TYPE};
use crate::capture::traits::{AudioChunk, AudioTrackInfo};
use crate::compositor::frame::{Frame, FrameSize};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderOptions {
    pub video_bitrate: u32,
    pub audio_bitrate: u32,
    pub mime_type: String,
}

impl EncoderOptions {
    pub fn for_quality(quality: VideoQuality) -> Self {
        Self {
            video_bitrate: quality.video_bitrate(),
            audio_bitrate: AUDIO_BITRATE,
            mime_type: RECORDING_MIME_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTrackInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

/// Tracks fed to the encoder: one canvas video track and any audio tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedStream {
    pub video: VideoTrackInfo,
    pub audio: Vec<AudioTrackInfo>,
}

impl CombinedStream {
    pub fn new(canvas: FrameSize, frame_rate: u32) -> Self {
        Self {
            video: VideoTrackInfo {
                width: canvas.width,
                height: canvas.height,
                frame_rate,
            },
            audio: Vec::new(),
        }
    }

    pub fn with_audio(mut self, track: AudioTrackInfo) -> Self {
        self.audio.push(track);
        self
    }

    pub fn has_audio(&self) -> bool {
        !self.audio.is_empty()
    }
}

/// A running encoder
///
/// All tracks are attached at creation, so a single `start` covers audio and
/// video together.
pub trait EncoderSink: Send {
    fn start(&mut self) -> RecordingResult<()>;

    fn pause(&mut self) -> RecordingResult<()>;

    fn resume(&mut self) -> RecordingResult<()>;

    fn write_video(&mut self, frame: &Frame, timestamp_ms: f64) -> RecordingResult<()>;

    fn write_audio(&mut self, chunk: &AudioChunk) -> RecordingResult<()>;

    /// Encoded chunks produced since the last call
    fn take_data(&mut self) -> Vec<Vec<u8>>;

    /// Request finalization; the receiver resolves once the last chunk has
    /// been produced and can be collected with [`EncoderSink::take_data`]
    fn stop(&mut self) -> oneshot::Receiver<RecordingResult<()>>;
}

pub trait EncoderFactory: Send + Sync {
    fn create(
        &self,
        stream: &CombinedStream,
        options: &EncoderOptions,
    ) -> RecordingResult<Box<dyn EncoderSink>>;
}
