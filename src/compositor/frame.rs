//! RGBA frame buffers

use super::CompositeError;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, `None` for empty sizes
    pub fn aspect_ratio(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.width as f64 / self.height as f64)
    }

    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Tightly packed RGBA8 image
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Transparent black frame
    pub fn new(size: FrameSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            data: vec![0; size.byte_len()],
        }
    }

    pub fn filled(size: FrameSize, rgba: [u8; 4]) -> Self {
        let mut frame = Self::new(size);
        for pixel in frame.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
        frame
    }

    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CompositeError> {
        let frame = Self {
            width,
            height,
            data,
        };
        frame.validate()?;
        Ok(frame)
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    /// Check the buffer length matches the dimensions
    pub fn validate(&self) -> Result<(), CompositeError> {
        let size = self.size();
        if size.is_empty() {
            return Err(CompositeError::EmptyFrame);
        }
        if self.data.len() != size.byte_len() {
            return Err(CompositeError::FrameSizeMismatch {
                expected: size.byte_len(),
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data
            .get(idx..idx + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Encode as PNG, e.g. for a preview thumbnail
    pub fn encode_png(&self) -> Result<Vec<u8>, CompositeError> {
        self.validate()?;

        let mut out = Vec::new();
        let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| CompositeError::Encode(e.to_string()))?;
        writer
            .write_image_data(&self.data)
            .map_err(|e| CompositeError::Encode(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| CompositeError::Encode(e.to_string()))?;

        Ok(out)
    }
}
