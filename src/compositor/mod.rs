//! Frame compositor
//!
//! Produces one finished RGBA frame per tick: the primary video cropped to the
//! camera's source rect and scaled to fill the canvas, then the webcam as a
//! bottom-right picture-in-picture. Sampling is nearest-neighbour.

pub mod frame;
pub mod layout;

use crate::zoom::geometry::SourceRect;
use frame::{Frame, FrameSize};
use layout::{CompositorLayout, PixelRect};
use std::sync::Arc;
use thiserror::Error;

/// Reasons a frame could not be composited; the tick is skipped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositeError {
    #[error("No primary frame available")]
    NoFrame,

    #[error("Frame has zero size")]
    EmptyFrame,

    #[error("Frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    #[error("Source rect does not intersect the frame: {0:?}")]
    InvalidSourceRect(SourceRect),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Webcam input for one composite
#[derive(Debug, Clone, Copy)]
pub struct WebcamLayer<'a> {
    pub frame: &'a Frame,
    /// Native size from stream metadata, `None` until it has loaded
    pub native_size: Option<FrameSize>,
}

pub struct Compositor {
    canvas: Arc<Frame>,
    /// Previously published canvas, reused once nobody else holds it
    spare: Option<Arc<Frame>>,
    layout: CompositorLayout,
    frames_drawn: u64,
    frames_skipped: u64,
}

impl Compositor {
    pub fn new(size: FrameSize, layout: CompositorLayout) -> Self {
        Self {
            canvas: Arc::new(Frame::new(size)),
            spare: None,
            layout,
            frames_drawn: 0,
            frames_skipped: 0,
        }
    }

    pub fn canvas(&self) -> &Frame {
        &self.canvas
    }

    /// Shared handle to the current canvas, no pixel copy
    pub fn snapshot(&self) -> Arc<Frame> {
        Arc::clone(&self.canvas)
    }

    /// Hand back a snapshot that is no longer published
    pub fn recycle(&mut self, frame: Arc<Frame>) {
        if frame.size() == self.size() && !Arc::ptr_eq(&frame, &self.canvas) {
            self.spare = Some(frame);
        }
    }

    pub fn size(&self) -> FrameSize {
        self.canvas.size()
    }

    pub fn layout(&self) -> &CompositorLayout {
        &self.layout
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Composite one frame onto the canvas
    ///
    /// On error the canvas keeps its previous content.
    pub fn render(
        &mut self,
        primary: Option<&Frame>,
        source: &SourceRect,
        webcam: Option<WebcamLayer<'_>>,
    ) -> Result<(), CompositeError> {
        let result = self.draw(primary, source, webcam);
        match result {
            Ok(()) => self.frames_drawn += 1,
            Err(_) => self.frames_skipped += 1,
        }
        result
    }

    fn draw(
        &mut self,
        primary: Option<&Frame>,
        source: &SourceRect,
        webcam: Option<WebcamLayer<'_>>,
    ) -> Result<(), CompositeError> {
        let primary = primary.ok_or(CompositeError::NoFrame)?;
        primary.validate()?;
        let source = visible_region(source, primary.size())?;

        let overlay = match webcam {
            Some(layer) => match layer.frame.validate() {
                Ok(()) => self
                    .layout
                    .webcam_rect(self.size(), layer.native_size)
                    .map(|dest| (layer.frame, dest)),
                Err(e) => {
                    tracing::debug!("Skipping webcam overlay: {}", e);
                    None
                }
            },
            None => None,
        };
        let corner_radius = self.layout.webcam_corner_radius;

        let canvas = self.writable_canvas();
        canvas.clear();
        draw_source(canvas, primary, &source);
        if let Some((frame, dest)) = overlay {
            draw_webcam(canvas, frame, dest, corner_radius);
        }

        Ok(())
    }

    /// Canvas buffer that no snapshot shares
    ///
    /// Every pixel is redrawn afterwards, so a shared canvas is swapped for
    /// the spare or a fresh buffer instead of being copied.
    fn writable_canvas(&mut self) -> &mut Frame {
        if Arc::get_mut(&mut self.canvas).is_none() {
            let size = self.canvas.size();
            self.canvas = match self.spare.take() {
                Some(spare) if Arc::strong_count(&spare) == 1 => spare,
                _ => Arc::new(Frame::new(size)),
            };
        }
        Arc::make_mut(&mut self.canvas)
    }
}

/// Scale the `source` region of `frame` over the whole canvas
fn draw_source(canvas: &mut Frame, frame: &Frame, source: &SourceRect) {
    let (cw, ch) = (canvas.width as usize, canvas.height as usize);
    let (fw, fh) = (frame.width as usize, frame.height as usize);
    let step_x = source.width / cw as f64;
    let step_y = source.height / ch as f64;

    let columns: Vec<usize> = (0..cw)
        .map(|dx| sample_index(source.x + (dx as f64 + 0.5) * step_x, fw))
        .collect();

    for dy in 0..ch {
        let sy = sample_index(source.y + (dy as f64 + 0.5) * step_y, fh);
        let src_row = sy * fw * 4;
        let dst_row = dy * cw * 4;

        for (dx, &sx) in columns.iter().enumerate() {
            let src = src_row + sx * 4;
            let dst = dst_row + dx * 4;
            canvas.data[dst..dst + 4].copy_from_slice(&frame.data[src..src + 4]);
        }
    }
}

/// Draw the webcam scaled into `dest`, masking rounded corners if set
fn draw_webcam(canvas: &mut Frame, webcam: &Frame, dest: PixelRect, corner_radius: f64) {
    let canvas_width = canvas.width;
    let radius = (dest.width.min(dest.height) as f64 * corner_radius) as i32;

    for dy in 0..dest.height {
        let src_y = ((dy as u64 * webcam.height as u64) / dest.height as u64) as u32;
        let src_y = src_y.min(webcam.height - 1);
        let canvas_y = dest.y + dy;

        for dx in 0..dest.width {
            if radius > 0
                && !is_inside_rounded_rect(
                    dx as i32,
                    dy as i32,
                    dest.width as i32,
                    dest.height as i32,
                    radius,
                )
            {
                continue;
            }

            let src_x = ((dx as u64 * webcam.width as u64) / dest.width as u64) as u32;
            let src_x = src_x.min(webcam.width - 1);

            let src = ((src_y * webcam.width + src_x) * 4) as usize;
            let dst = ((canvas_y * canvas_width + dest.x + dx) * 4) as usize;

            canvas.data[dst..dst + 3].copy_from_slice(&webcam.data[src..src + 3]);
            canvas.data[dst + 3] = 255;
        }
    }
}

/// Clamp a source rect to the frame it samples from
fn visible_region(source: &SourceRect, frame: FrameSize) -> Result<SourceRect, CompositeError> {
    let bounds = SourceRect::full(frame);
    let finite = [source.x, source.y, source.width, source.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite || source.width <= 0.0 || source.height <= 0.0 {
        return Err(CompositeError::InvalidSourceRect(*source));
    }
    Ok(source.clamped_to(&bounds))
}

fn sample_index(position: f64, len: usize) -> usize {
    (position.max(0.0) as usize).min(len - 1)
}

/// Check if a point is inside a rounded rectangle
fn is_inside_rounded_rect(x: i32, y: i32, width: i32, height: i32, radius: i32) -> bool {
    let corner = |cx: i32, cy: i32| {
        let (dx, dy) = (x - cx, y - cy);
        dx * dx + dy * dy <= radius * radius
    };

    let left = x < radius;
    let right = x >= width - radius;
    let top = y < radius;
    let bottom = y >= height - radius;

    match (left, right, top, bottom) {
        (true, _, true, _) => corner(radius, radius),
        (_, true, true, _) => corner(width - radius - 1, radius),
        (true, _, _, true) => corner(radius, height - radius - 1),
        (_, true, _, true) => corner(width - radius - 1, height - radius - 1),
        _ => true,
    }
}
