//! Temporary recording files
//!
//! Temp recordings must outlive the recording itself because the host plays
//! them from the preload slot afterwards, so they are persisted on creation
//! and only removed by the startup sweep.

use crate::utils::error::{RecorderError, RecorderResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Name prefix shared by every temp recording
pub const TEMP_FILE_PREFIX: &str = "preload_recorder_temp_";

/// Extension of every temp recording
pub const TEMP_FILE_SUFFIX: &str = ".mp4";

/// Prefixes used by earlier releases of the plugin, still swept on startup
pub const LEGACY_TEMP_FILE_PREFIXES: &[&str] = &["mxw_video_writer_temp_"];

/// Whether a file name belongs to a temp recording, current or legacy
pub fn is_temp_recording(file_name: &str) -> bool {
    let prefixed = std::iter::once(TEMP_FILE_PREFIX)
        .chain(LEGACY_TEMP_FILE_PREFIXES.iter().copied())
        .any(|prefix| file_name.starts_with(prefix));
    prefixed && file_name.ends_with(TEMP_FILE_SUFFIX)
}

/// Create a uniquely named, empty temp recording in `dir`
pub fn create_temp_recording(dir: &Path) -> RecorderResult<PathBuf> {
    let path = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(TEMP_FILE_SUFFIX)
        .tempfile_in(dir)?
        .into_temp_path()
        .keep()
        .map_err(|e| RecorderError::Io(e.error))?;

    tracing::debug!("Created temp recording {:?}", path);
    Ok(path)
}

/// Result of a sweep
#[derive(Debug, Default)]
pub struct SweepReport {
    pub deleted: Vec<PathBuf>,
    /// Files that matched but could not be removed, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

/// Delete leftover temp recordings in `dir`.
///
/// Not scoped to this process: a second plugin process recording into the
/// same directory loses its file.
pub fn sweep_temp_files(dir: &Path) -> RecorderResult<SweepReport> {
    let mut report = SweepReport::default();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let matches = entry.file_name().to_str().map(is_temp_recording).unwrap_or(false);
        if !matches || !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted leftover temp recording {:?}", path);
                report.deleted.push(path);
            }
            Err(e) => {
                tracing::warn!("Failed to delete {:?}: {}", path, e);
                report.failed.push((path, e.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_temp_recording() {
        assert!(is_temp_recording("preload_recorder_temp_abc.mp4"));
        assert!(!is_temp_recording("preload_recorder_temp_abc.mov"));
        assert!(!is_temp_recording("other_abc.mp4"));
        assert!(!is_temp_recording("xpreload_recorder_temp_abc.mp4"));
    }

    #[test]
    fn test_is_temp_recording_legacy_prefix() {
        assert!(is_temp_recording("mxw_video_writer_temp_k2j3h.mp4"));
        assert!(!is_temp_recording("mxw_video_writer_temp_k2j3h.avi"));
        assert!(!is_temp_recording("mxw_video_writer_k2j3h.mp4"));
    }

    #[test]
    fn test_create_temp_recording_persists() {
        let dir = tempdir().unwrap();
        let a = create_temp_recording(dir.path()).unwrap();
        let b = create_temp_recording(dir.path()).unwrap();

        assert_ne!(a, b);
        assert!(a.exists());
        assert!(is_temp_recording(a.file_name().unwrap().to_str().unwrap()));
    }

    #[test]
    fn test_sweep_removes_only_matching_files() {
        let dir = tempdir().unwrap();
        let stale = [
            dir.path().join("preload_recorder_temp_1.mp4"),
            dir.path().join("preload_recorder_temp_xyz.mp4"),
            dir.path().join("mxw_video_writer_temp_old.mp4"),
        ];
        let kept = [
            dir.path().join("preload_recorder_temp_1.mov"),
            dir.path().join("recording.mp4"),
            dir.path().join("notes.txt"),
        ];
        for path in stale.iter().chain(kept.iter()) {
            fs::write(path, b"x").unwrap();
        }
        // Directories with a matching name are left alone
        let matching_dir = dir.path().join("preload_recorder_temp_dir.mp4");
        fs::create_dir(&matching_dir).unwrap();

        let report = sweep_temp_files(dir.path()).unwrap();

        assert_eq!(report.deleted.len(), 3);
        assert!(report.failed.is_empty());
        assert!(stale.iter().all(|p| !p.exists()));
        assert!(kept.iter().all(|p| p.exists()));
        assert!(matching_dir.exists());
    }

    #[test]
    fn test_sweep_missing_dir_is_error() {
        let dir = tempdir().unwrap();
        assert!(sweep_temp_files(&dir.path().join("missing")).is_err());
    }
}
