//! Rectangles and coordinate mapping for the virtual camera

use crate::capture::traits::DisplayBounds;
use crate::compositor::frame::FrameSize;
use serde::{Deserialize, Serialize};

/// Cursor location in global display coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

impl CursorPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Crop window into the raw video frame, in raw pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole frame
    pub fn full(size: FrameSize) -> Self {
        Self::new(0.0, 0.0, size.width as f64, size.height as f64)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Component-wise linear interpolation
    pub fn lerp(&self, other: &SourceRect, t: f64) -> SourceRect {
        SourceRect::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.width + (other.width - self.width) * t,
            self.height + (other.height - self.height) * t,
        )
    }

    /// Shrink and shift so the rect lies inside `bounds`
    pub fn clamped_to(&self, bounds: &SourceRect) -> SourceRect {
        let width = self.width.min(bounds.width);
        let height = self.height.min(bounds.height);
        SourceRect::new(
            self.x.min(bounds.right() - width).max(bounds.x),
            self.y.min(bounds.bottom() - height).max(bounds.y),
            width,
            height,
        )
    }

    /// Whether the rect lies inside `bounds`, allowing `epsilon` of float error
    pub fn is_within(&self, bounds: &SourceRect, epsilon: f64) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x >= bounds.x - epsilon
            && self.y >= bounds.y - epsilon
            && self.right() <= bounds.right() + epsilon
            && self.bottom() <= bounds.bottom() + epsilon
    }
}

/// Map a global cursor position into raw frame pixels
///
/// The display origin is removed first, then each axis is scaled by
/// `raw / display`. Degenerate displays fall back to a 1:1 scale.
pub fn display_to_raw(
    cursor: CursorPosition,
    display: &DisplayBounds,
    frame: FrameSize,
) -> (f64, f64) {
    let scale = |raw: u32, shown: f64| {
        if shown > 0.0 {
            raw as f64 / shown
        } else {
            1.0
        }
    };

    (
        (cursor.x - display.x) * scale(frame.width, display.width),
        (cursor.y - display.y) * scale(frame.height, display.height),
    )
}

/// A `width`×`height` window centred on `center`, kept inside `bounds`
pub fn window_around(
    center: (f64, f64),
    width: f64,
    height: f64,
    bounds: &SourceRect,
) -> SourceRect {
    let (cx, cy) = if center.0.is_finite() && center.1.is_finite() {
        center
    } else {
        bounds.center()
    };

    SourceRect::new(cx - width / 2.0, cy - height / 2.0, width, height).clamped_to(bounds)
}
