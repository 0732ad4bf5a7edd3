//! Encoder types and seams
//!
//! The recorder only sees [`EncoderBackend`] and [`FrameWriter`]; the
//! production backend lives in `encoder::ffmpeg`.

use crate::capture::Frame;
use crate::utils::error::{RecorderError, RecorderResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Four-character codec tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// MPEG-4 Part 2, the tag recordings are written with
    pub const MP4V: FourCc = FourCc(*b"MP4V");

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> [u8; 4] {
        self.0
    }

    /// FFmpeg encoder for this tag, if it is one we know
    pub fn ffmpeg_codec(&self) -> Option<&'static str> {
        let upper = self.0.map(|b| b.to_ascii_uppercase());
        match &upper {
            b"MP4V" | b"FMP4" | b"DIVX" | b"XVID" => Some("mpeg4"),
            b"AVC1" | b"H264" | b"X264" => Some("libx264"),
            b"HEV1" | b"HVC1" | b"H265" => Some("libx265"),
            b"MJPG" => Some("mjpeg"),
            _ => None,
        }
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl FromStr for FourCc {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| RecorderError::InvalidConfig(format!("fourcc must be 4 bytes: {:?}", s)))?;
        if !bytes.iter().all(|b| b.is_ascii_graphic()) {
            return Err(RecorderError::InvalidConfig(format!("fourcc must be printable ASCII: {:?}", s)));
        }
        Ok(Self(bytes))
    }
}

/// Recording dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for VideoSize {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl fmt::Display for VideoSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Everything needed to open an encoder
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderRequest {
    pub path: PathBuf,
    pub fourcc: FourCc,
    pub fps: f64,
    pub size: VideoSize,
}

/// An open video file accepting frames
pub trait FrameWriter: Send {
    /// Append the next frame
    fn write_frame(&mut self, frame: &Frame) -> RecorderResult<()>;

    fn is_opened(&self) -> bool;

    fn frames_written(&self) -> u64;

    /// Flush and close the file
    fn finish(self: Box<Self>) -> RecorderResult<()>;
}

/// Opens frame writers
pub trait EncoderBackend {
    fn open(&self, request: &EncoderRequest) -> RecorderResult<Box<dyn FrameWriter>>;
}
