//! Image samples pulled from capture devices
//!
//! Frames are packed BGR24, rows top to bottom, no padding.

use crate::utils::error::{RecorderError, RecorderResult};

/// Bytes per pixel of a packed BGR24 frame
pub const BYTES_PER_PIXEL: usize = 3;

/// A single image sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap raw BGR24 bytes, checking the buffer matches the dimensions
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> RecorderResult<Self> {
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(RecorderError::Frame(format!(
                "{}x{} frame needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// An all-black frame
    pub fn black(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; Self::byte_len(width, height)],
        }
    }

    fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to a single row
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// Mirror the image around its horizontal axis, in place.
    ///
    /// Host samples arrive bottom-up; the encoder expects top-down rows.
    pub fn flip_vertical(&mut self) {
        let stride = self.stride();
        let rows = self.height as usize;
        if stride == 0 || rows < 2 {
            return;
        }

        for top in 0..rows / 2 {
            let bottom = rows - 1 - top;
            let (head, tail) = self.data.split_at_mut(bottom * stride);
            head[top * stride..(top + 1) * stride].swap_with_slice(&mut tail[..stride]);
        }
    }

    /// Consuming variant of [`Frame::flip_vertical`]
    pub fn flipped(mut self) -> Self {
        self.flip_vertical();
        self
    }

    /// Check the frame has the given dimensions
    pub fn ensure_size(&self, width: u32, height: u32) -> RecorderResult<()> {
        if self.width != width || self.height != height {
            return Err(RecorderError::Frame(format!(
                "expected {}x{} sample, got {}x{}",
                width, height, self.width, self.height
            )));
        }
        Ok(())
    }
}
