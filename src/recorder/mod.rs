//! Recording system module
//!
//! - Per-instance settings and the Idle/Recording state machine
//! - The plugin entry points the host calls
//! - Settings persistence, temp-file management and the settings panel

pub mod panel;
pub mod persist;
pub mod plugin;
pub mod state;
pub mod temp_files;

pub use persist::{decode_settings, encode_settings, SETTINGS_FORMAT_VERSION};
pub use plugin::{VideoWriterPlugin, RECORDING_FOURCC};
pub use state::{
    clamp_dimension, InstanceId, RecorderSettings, RecordingOutcome, RecordingState, StorageMode,
};
pub use temp_files::{sweep_temp_files, SweepReport, TEMP_FILE_PREFIX};
