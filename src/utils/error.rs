//! Error types and handling
//!
//! Common error types used across the plugin.

use crate::recorder::InstanceId;
use thiserror::Error;

/// Plugin-wide error type
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Unknown instance: {0}")]
    UnknownInstance(InstanceId),

    #[error("No capture device available")]
    NoCaptureDevice,

    #[error("Instance {0} is already recording")]
    AlreadyRecording(InstanceId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl RecorderError {
    /// Short machine-readable code, used when reporting to the host console
    pub fn code(&self) -> &'static str {
        match self {
            RecorderError::Io(_) => "IO_ERROR",
            RecorderError::Serialization(_) => "SERIALIZATION_ERROR",
            RecorderError::Persistence(_) => "PERSISTENCE_ERROR",
            RecorderError::UnknownInstance(_) => "UNKNOWN_INSTANCE",
            RecorderError::NoCaptureDevice => "NO_CAPTURE_DEVICE",
            RecorderError::AlreadyRecording(_) => "ALREADY_RECORDING",
            RecorderError::InvalidConfig(_) => "INVALID_CONFIG",
            RecorderError::Encoder(_) => "ENCODER_ERROR",
            RecorderError::Frame(_) => "FRAME_ERROR",
            RecorderError::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// Result type alias using RecorderError
pub type RecorderResult<T> = Result<T, RecorderError>;
