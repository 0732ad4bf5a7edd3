//! Video encoding
//!
//! Recordings are written through the [`EncoderBackend`] seam; the default
//! backend drives an external ffmpeg process.

pub mod ffmpeg;
pub mod types;

pub use ffmpeg::{build_encoder_args, FfmpegBackend, FfmpegWriter};
pub use types::{EncoderBackend, EncoderRequest, FourCc, FrameWriter, VideoSize};
