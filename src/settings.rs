//! Persisted application settings
//!
//! Stored as camelCase JSON. Every field has a default, so a partial or older
//! settings file is merged over the defaults when loaded.

use crate::compositor::layout::OutputResolution;
use crate::recorder::state::{AudioInput, VideoQuality};
use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Auto zoom policy consumed by the virtual camera and the trigger policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomSettings {
    /// Whether activity triggers zoom at all
    pub enabled: bool,
    /// Magnification while zoomed in (>= 1)
    pub zoom_factor: f64,
    /// Length of the eased zoom in/out transition
    pub animation_duration_ms: f64,
    /// Fraction of the remaining distance covered per tick while following
    pub smoothing_factor: f64,
    /// Quiet period after which the camera zooms back out
    pub inactivity_timeout_ms: f64,
    /// Quiet period a burst of key presses needs before it counts
    pub key_debounce_ms: f64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            zoom_factor: 2.0,
            animation_duration_ms: 600.0,
            smoothing_factor: 0.1,
            inactivity_timeout_ms: 3000.0,
            key_debounce_ms: 200.0,
        }
    }
}

impl ZoomSettings {
    pub fn validate(&self) -> AppResult<()> {
        if self.zoom_factor.is_nan() || self.zoom_factor < 1.0 {
            return Err(AppError::Config(format!(
                "zoomFactor must be at least 1, got {}",
                self.zoom_factor
            )));
        }
        if self.smoothing_factor.is_nan()
            || self.smoothing_factor <= 0.0
            || self.smoothing_factor > 1.0
        {
            return Err(AppError::Config(format!(
                "smoothingFactor must be in (0, 1], got {}",
                self.smoothing_factor
            )));
        }
        let negative = |ms: f64| ms.is_nan() || ms < 0.0;
        if negative(self.animation_duration_ms) || negative(self.inactivity_timeout_ms) {
            return Err(AppError::Config("durations must not be negative".to_string()));
        }
        Ok(())
    }

    /// Copy with every field forced into its valid range
    pub fn sanitized(&self) -> Self {
        let or = |value: f64, fallback: f64| if value.is_finite() { value } else { fallback };
        let defaults = Self::default();

        Self {
            enabled: self.enabled,
            zoom_factor: or(self.zoom_factor, defaults.zoom_factor).max(1.0),
            animation_duration_ms: or(self.animation_duration_ms, defaults.animation_duration_ms)
                .max(0.0),
            smoothing_factor: or(self.smoothing_factor, defaults.smoothing_factor)
                .clamp(f64::EPSILON, 1.0),
            inactivity_timeout_ms: or(self.inactivity_timeout_ms, defaults.inactivity_timeout_ms)
                .max(0.0),
            key_debounce_ms: or(self.key_debounce_ms, defaults.key_debounce_ms).max(0.0),
        }
    }
}

/// Recording defaults offered by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordingSettings {
    pub default_quality: VideoQuality,
    pub frame_rate: u32,
    pub resolution: OutputResolution,
    pub include_webcam: bool,
    pub audio_input: AudioInput,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            default_quality: VideoQuality::High,
            frame_rate: 60,
            resolution: OutputResolution::Source,
            include_webcam: true,
            audio_input: AudioInput::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub recording: RecordingSettings,
    pub zoom: ZoomSettings,
}

impl AppSettings {
    /// Load settings, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: AppSettings = serde_json::from_str(&content)?;
        settings.zoom.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        self.zoom.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }
}
