//! Plugin configuration
//!
//! Loaded once when the plugin is created: an optional TOML file, then
//! environment overrides.

use crate::utils::error::{RecorderError, RecorderResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_FFMPEG: &str = "PRELOAD_RECORDER_FFMPEG";
pub const ENV_TEMP_DIR: &str = "PRELOAD_RECORDER_TEMP_DIR";
pub const ENV_SWEEP: &str = "PRELOAD_RECORDER_SWEEP";
pub const ENV_LOG: &str = "PRELOAD_RECORDER_LOG";

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "preload_recorder=info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// ffmpeg binary, looked up on PATH when not absolute
    pub ffmpeg_path: PathBuf,

    /// Directory for temp recordings
    pub temp_dir: PathBuf,

    /// Delete leftover temp recordings when the plugin loads
    pub sweep_on_startup: bool,

    /// tracing-subscriber filter used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            temp_dir: std::env::temp_dir(),
            sweep_on_startup: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl RecorderConfig {
    /// Load from an optional file, then apply environment overrides.
    ///
    /// A path that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> RecorderResult<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::debug!("Config file {:?} not found, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        let overrides = config.apply_env_overrides();
        if !overrides.is_empty() {
            tracing::debug!("Config overridden from environment: {:?}", overrides);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> RecorderResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_toml(&contents)
            .map_err(|e| RecorderError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse_toml(contents: &str) -> RecorderResult<Self> {
        toml::from_str(contents).map_err(|e| RecorderError::Config(e.to_string()))
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Vec<&'static str> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, returning the keys that were used
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();

        if let Some(v) = lookup(ENV_FFMPEG) {
            self.ffmpeg_path = PathBuf::from(v);
            applied.push(ENV_FFMPEG);
        }
        if let Some(v) = lookup(ENV_TEMP_DIR) {
            self.temp_dir = PathBuf::from(v);
            applied.push(ENV_TEMP_DIR);
        }
        if let Some(v) = lookup(ENV_SWEEP) {
            match parse_flag(&v) {
                Some(flag) => {
                    self.sweep_on_startup = flag;
                    applied.push(ENV_SWEEP);
                }
                None => tracing::warn!("Ignoring {}={:?}: not a boolean", ENV_SWEEP, v),
            }
        }
        if let Some(v) = lookup(ENV_LOG) {
            self.log_filter = v;
            applied.push(ENV_LOG);
        }

        applied
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_parse_partial_toml() {
        let config = RecorderConfig::parse_toml(
            r#"
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
sweep_on_startup = false
"#,
        )
        .unwrap();

        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert!(!config.sweep_on_startup);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.temp_dir, std::env::temp_dir());
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = RecorderConfig::parse_toml("sweep_on_startup = \"maybe\"").unwrap_err();
        assert!(matches!(err, RecorderError::Config(_)));
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recorder.toml");
        std::fs::write(&path, "log_filter = \"preload_recorder=debug\"\n").unwrap();

        let mut config = RecorderConfig::from_file(&path).unwrap();
        config.apply_overrides_from(|_| None);
        assert_eq!(config.log_filter, "preload_recorder=debug");

        let missing = RecorderConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert!(missing.ffmpeg_path.file_name().is_some());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_FFMPEG, "/usr/local/bin/ffmpeg"),
            (ENV_TEMP_DIR, "/var/tmp/rec"),
            (ENV_SWEEP, "no"),
        ]
        .into_iter()
        .collect();

        let mut config = RecorderConfig::default();
        let applied = config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(applied, vec![ENV_FFMPEG, ENV_TEMP_DIR, ENV_SWEEP]);
        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.temp_dir, PathBuf::from("/var/tmp/rec"));
        assert!(!config.sweep_on_startup);
    }

    #[test]
    fn test_bad_sweep_flag_is_ignored() {
        let mut config = RecorderConfig::default();
        let applied = config.apply_overrides_from(|k| (k == ENV_SWEEP).then(|| "sometimes".to_string()));
        assert!(applied.is_empty());
        assert!(config.sweep_on_startup);
    }
}
