//! Recording state management
//!
//! Per-instance settings and the Idle/Recording state machine.

use crate::encoder::{FrameWriter, VideoSize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Host-assigned instance identifier
pub type InstanceId = i64;

/// Smallest accepted recording dimension
pub const MIN_DIMENSION: u32 = 320;

/// Largest accepted recording dimension
pub const MAX_DIMENSION: u32 = 4096;

/// Preload slot range offered in the panel
pub const PRELOAD_INDEX_RANGE: (i32, i32) = (1, 1000);

/// Clamp a dimension into [320, 4096] and round down to a multiple of 4
pub fn clamp_dimension(value: i64) -> u32 {
    let clamped = value.clamp(MIN_DIMENSION as i64, MAX_DIMENSION as i64) as u32;
    clamped / 4 * 4
}

/// Clamp both dimensions of a requested size
pub fn clamp_size(width: i64, height: i64) -> VideoSize {
    VideoSize::new(clamp_dimension(width), clamp_dimension(height))
}

/// Where a recording is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum StorageMode {
    /// A fresh temp file per recording
    #[default]
    Temporary,
    /// The user-provided `file_path`, replaced on every recording
    SpecifiedFile,
}

/// Persisted per-instance configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderSettings {
    /// Capture device name
    pub capture_device: String,

    /// Recording size, always clamped
    pub video_size: VideoSize,

    /// Target preload slot
    pub preload_index: i32,

    /// Assign the recording to the preload slot when it stops
    pub load_into_preload_after_record: bool,

    pub storage: StorageMode,

    /// Output path used in [`StorageMode::SpecifiedFile`]
    pub file_path: String,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            capture_device: String::new(),
            video_size: VideoSize::default(),
            preload_index: 1,
            load_into_preload_after_record: true,
            storage: StorageMode::Temporary,
            file_path: String::new(),
        }
    }
}

impl RecorderSettings {
    /// Create settings for the given capture device
    pub fn with_device(capture_device: impl Into<String>) -> Self {
        Self {
            capture_device: capture_device.into(),
            ..Self::default()
        }
    }

    /// Store a new recording size, clamped
    pub fn set_video_size(&mut self, width: i64, height: i64) {
        self.video_size = clamp_size(width, height);
    }

    /// Re-apply clamping, e.g. after restoring from a blob
    pub fn normalize(&mut self) {
        let VideoSize { width, height } = self.video_size;
        self.set_video_size(width as i64, height as i64);

        let (min, max) = PRELOAD_INDEX_RANGE;
        self.preload_index = self.preload_index.clamp(min, max);
    }
}

/// An in-progress recording. Only exists while recording.
///
/// Device and size are fixed for the whole recording, so panel edits made
/// while recording apply to the next one.
pub struct ActiveRecording {
    pub writer: Box<dyn FrameWriter>,

    /// Capture device frames are pulled from
    pub device: String,

    /// Whether `device` was referenced at start and needs releasing
    pub device_referenced: bool,

    /// Encoder frame size
    pub size: VideoSize,

    /// File being written
    pub output_path: PathBuf,

    /// Set when the output is a plugin-created temp file
    pub temp_file: Option<PathBuf>,

    pub started_at: DateTime<Utc>,
}

impl fmt::Debug for ActiveRecording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRecording")
            .field("device", &self.device)
            .field("device_referenced", &self.device_referenced)
            .field("size", &self.size)
            .field("output_path", &self.output_path)
            .field("temp_file", &self.temp_file)
            .field("frames_written", &self.writer.frames_written())
            .field("started_at", &self.started_at)
            .finish()
    }
}

/// Current state of one instance
#[derive(Debug, Default)]
pub enum RecordingState {
    /// No recording in progress
    #[default]
    Idle,
    /// Currently recording
    Recording(ActiveRecording),
}

impl RecordingState {
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording(_))
    }

    pub fn active(&self) -> Option<&ActiveRecording> {
        match self {
            RecordingState::Recording(active) => Some(active),
            RecordingState::Idle => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveRecording> {
        match self {
            RecordingState::Recording(active) => Some(active),
            RecordingState::Idle => None,
        }
    }

    /// Leave the Recording state, handing back the recording if there was one
    pub fn take(&mut self) -> Option<ActiveRecording> {
        match std::mem::take(self) {
            RecordingState::Recording(active) => Some(active),
            RecordingState::Idle => None,
        }
    }
}

/// One configured use of the plugin
#[derive(Debug, Default)]
pub struct Instance {
    pub settings: RecorderSettings,
    pub state: RecordingState,
}

impl Instance {
    pub fn new(settings: RecorderSettings) -> Self {
        Self {
            settings,
            state: RecordingState::Idle,
        }
    }
}

/// Summary of a finished recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingOutcome {
    pub output_path: PathBuf,
    pub frames_written: u64,
    pub duration_ms: i64,
    /// Preload slot the file was assigned to, if any
    pub preload_index: Option<i32>,
}
