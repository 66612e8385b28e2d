//! Output canvas sizing and overlay placement

use super::frame::FrameSize;
use serde::{Deserialize, Serialize};

/// Aspect ratio assumed for a webcam whose metadata has not loaded yet
pub const WEBCAM_FALLBACK_ASPECT: f64 = 16.0 / 9.0;

/// Output resolution preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputResolution {
    #[default]
    Source,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
}

impl OutputResolution {
    /// Maximum canvas size for the preset, `None` keeps the source size
    pub fn bounds(&self) -> Option<FrameSize> {
        match self {
            OutputResolution::Source => None,
            OutputResolution::P1080 => Some(FrameSize::new(1920, 1080)),
            OutputResolution::P720 => Some(FrameSize::new(1280, 720)),
        }
    }
}

/// Canvas size for a source region of `width`×`height` raw pixels
///
/// Sources larger than the preset are scaled down preserving aspect ratio.
/// Both dimensions are rounded to even numbers for the encoder.
pub fn canvas_size(width: f64, height: f64, resolution: OutputResolution) -> FrameSize {
    let (mut w, mut h) = (width.max(1.0), height.max(1.0));

    if let Some(target) = resolution.bounds() {
        let (tw, th) = (target.width as f64, target.height as f64);
        if w > tw || h > th {
            let aspect = w / h;
            if aspect > tw / th {
                w = tw;
                h = w / aspect;
            } else {
                h = th;
                w = h * aspect;
            }
        }
    }

    FrameSize::new(round_even(w), round_even(h))
}

fn round_even(value: f64) -> u32 {
    ((value / 2.0).round() as u32 * 2).max(2)
}

/// Webcam picture-in-picture placement
#[derive(Debug, Clone, PartialEq)]
pub struct CompositorLayout {
    /// Webcam width as a fraction of the canvas width
    pub webcam_width_ratio: f64,
    /// Gap between the webcam and the bottom-right canvas edges
    pub webcam_margin: u32,
    /// Used while the webcam's native size is unknown
    pub webcam_fallback_aspect: f64,
    /// Corner radius as a fraction of the shorter webcam side (0 = square)
    pub webcam_corner_radius: f64,
}

impl Default for CompositorLayout {
    fn default() -> Self {
        Self {
            webcam_width_ratio: 0.2,
            webcam_margin: 20,
            webcam_fallback_aspect: WEBCAM_FALLBACK_ASPECT,
            webcam_corner_radius: 0.0,
        }
    }
}

/// Integer destination rectangle on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CompositorLayout {
    /// Where the webcam is drawn on a `canvas`-sized output
    pub fn webcam_rect(&self, canvas: FrameSize, native: Option<FrameSize>) -> Option<PixelRect> {
        let aspect = native
            .and_then(|size| size.aspect_ratio())
            .unwrap_or(self.webcam_fallback_aspect);

        let width = (canvas.width as f64 * self.webcam_width_ratio).round() as u32;
        let height = (width as f64 / aspect).round() as u32;
        if width == 0 || height == 0 {
            return None;
        }

        let x = canvas.width.checked_sub(width + self.webcam_margin)?;
        let y = canvas.height.checked_sub(height + self.webcam_margin)?;

        Some(PixelRect {
            x,
            y,
            width,
            height,
        })
    }
}
