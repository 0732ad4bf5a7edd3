//! Plugin entry points
//!
//! [`VideoWriterPlugin`] owns every instance record and implements the
//! callbacks the host invokes. Calls for one instance are serial; the host
//! passes the instance id explicitly on every call.

use super::panel::render_panel;
use super::persist::{decode_settings, encode_settings};
use super::state::{
    ActiveRecording, Instance, InstanceId, RecorderSettings, RecordingOutcome, RecordingState,
    StorageMode,
};
use super::temp_files::{create_temp_recording, sweep_temp_files, SweepReport};
use crate::capture::default_capture_device;
use crate::config::RecorderConfig;
use crate::encoder::{EncoderBackend, EncoderRequest, FfmpegBackend, FourCc};
use crate::host::{info_console, warn_console, Host, PanelUi};
use crate::utils::error::{RecorderError, RecorderResult};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Codec tag every recording is written with
pub const RECORDING_FOURCC: FourCc = FourCc::MP4V;

/// Video recording plugin for a single host
pub struct VideoWriterPlugin<H: Host> {
    host: H,
    backend: Box<dyn EncoderBackend>,
    config: RecorderConfig,
    instances: HashMap<InstanceId, Instance>,
}

impl<H: Host> VideoWriterPlugin<H> {
    /// Create the plugin with the ffmpeg backend from `config`
    pub fn new(host: H, config: RecorderConfig) -> Self {
        let backend = Box::new(FfmpegBackend::new(config.ffmpeg_path.clone()));
        Self::with_backend(host, backend, config)
    }

    /// Create the plugin with a custom encoder backend.
    ///
    /// Runs the temp-file sweep when enabled in `config`.
    pub fn with_backend(host: H, backend: Box<dyn EncoderBackend>, config: RecorderConfig) -> Self {
        let mut plugin = Self {
            host,
            backend,
            config,
            instances: HashMap::new(),
        };

        if plugin.config.sweep_on_startup {
            plugin.sweep_temp_files();
        }

        plugin
    }

    /// Delete leftover temp recordings from the configured temp directory
    pub fn sweep_temp_files(&mut self) -> SweepReport {
        match sweep_temp_files(&self.config.temp_dir) {
            Ok(report) => {
                for path in &report.deleted {
                    info_console(&mut self.host, format!("deleted {}", path.display()));
                }
                for (path, reason) in &report.failed {
                    warn_console(
                        &mut self.host,
                        format!("failed to delete {} / {}", path.display(), reason),
                    );
                }
                report
            }
            Err(e) => {
                warn_console(
                    &mut self.host,
                    format!("cannot scan {}: {}", self.config.temp_dir.display(), e),
                );
                SweepReport::default()
            }
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Settings of an instance, if it exists
    pub fn settings(&self, id: InstanceId) -> Option<&RecorderSettings> {
        self.instances.get(&id).map(|i| &i.settings)
    }

    /// Mutable settings of an instance, for embedders with their own UI
    pub fn settings_mut(&mut self, id: InstanceId) -> Option<&mut RecorderSettings> {
        self.instances.get_mut(&id).map(|i| &mut i.settings)
    }

    /// Path being recorded to, if the instance is recording
    pub fn recording_path(&self, id: InstanceId) -> Option<&Path> {
        self.instances
            .get(&id)
            .and_then(|i| i.state.active())
            .map(|a| a.output_path.as_path())
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Initialization callback
    pub fn on_create(&mut self, id: InstanceId) -> RecorderResult<()> {
        let devices = self.host.capture_device_names();
        let device = default_capture_device(&devices)
            .ok_or(RecorderError::NoCaptureDevice)?
            .to_string();

        if self.instances.contains_key(&id) {
            tracing::debug!("Instance {} created again, replacing it", id);
            self.on_destroy(id);
        }

        tracing::debug!("Created instance {} with capture device {:?}", id, device);
        self.instances
            .insert(id, Instance::new(RecorderSettings::with_device(device)));
        Ok(())
    }

    /// Serialize callback
    pub fn on_save(&self, id: InstanceId) -> RecorderResult<String> {
        let instance = self
            .instances
            .get(&id)
            .ok_or(RecorderError::UnknownInstance(id))?;
        encode_settings(&instance.settings)
    }

    /// Deserialize callback. Creates the instance if needed.
    pub fn on_load(&mut self, id: InstanceId, blob: &str) -> RecorderResult<()> {
        let settings = decode_settings(blob)?;

        let Self {
            host, instances, ..
        } = self;
        let instance = instances.entry(id).or_default();
        if let Some(active) = instance.state.take() {
            tracing::info!("Instance {} reloaded while recording, closing recording", id);
            if let Err(e) = close_recording(host, active) {
                tracing::debug!("Recording of instance {} closed with error: {}", id, e);
            }
        }
        instance.settings = settings;

        tracing::debug!("Loaded settings for instance {}", id);
        Ok(())
    }

    /// Teardown. Closes any running recording without touching the preload.
    pub fn on_destroy(&mut self, id: InstanceId) {
        let Some(mut instance) = self.instances.remove(&id) else {
            return;
        };
        if let Some(active) = instance.state.take() {
            if let Err(e) = close_recording(&mut self.host, active) {
                tracing::debug!("Recording of instance {} closed with error: {}", id, e);
            }
        }
        tracing::debug!("Destroyed instance {}", id);
    }

    /// Start-of-action callback: opens the encoder and references the device
    pub fn on_action(&mut self, id: InstanceId) -> RecorderResult<()> {
        let Self {
            host,
            backend,
            config,
            instances,
        } = self;
        let instance = instances
            .get_mut(&id)
            .ok_or(RecorderError::UnknownInstance(id))?;

        if instance.state.is_recording() {
            return Err(RecorderError::AlreadyRecording(id));
        }

        let settings = &instance.settings;
        if settings.load_into_preload_after_record {
            host.set_preload_media(settings.preload_index, None);
        }

        let (output_path, temp_file) = match settings.storage {
            StorageMode::Temporary => {
                let path = create_temp_recording(&config.temp_dir)?;
                (path.clone(), Some(path))
            }
            StorageMode::SpecifiedFile => (prepare_specified_file(host, &settings.file_path)?, None),
        };

        let request = EncoderRequest {
            path: output_path.clone(),
            fourcc: RECORDING_FOURCC,
            fps: host.fps(),
            size: settings.video_size,
        };
        let writer = match backend.open(&request) {
            Ok(writer) => writer,
            Err(e) => {
                if let Some(temp) = &temp_file {
                    if let Err(remove_err) = fs::remove_file(temp) {
                        tracing::debug!("Failed to remove unused temp file {:?}: {}", temp, remove_err);
                    }
                }
                warn_console(host, format!("cannot open {}: {}", output_path.display(), e));
                return Err(e);
            }
        };

        let device = settings.capture_device.clone();
        let device_referenced = host.is_valid_device(&device);
        if device_referenced {
            host.reference_device(&device, true);
        } else {
            warn_console(host, format!("capture device {:?} not available", device));
        }

        tracing::info!(
            "Instance {} recording {} from {:?} to {:?}",
            id,
            request.size,
            device,
            output_path
        );

        instance.state = RecordingState::Recording(ActiveRecording {
            writer,
            device,
            device_referenced,
            size: request.size,
            output_path,
            temp_file,
            started_at: Utc::now(),
        });
        Ok(())
    }

    /// Per-frame callback: pulls one sample and appends it to the recording
    pub fn on_new_frame(&mut self, id: InstanceId) -> RecorderResult<()> {
        let Self {
            host, instances, ..
        } = self;
        let instance = instances
            .get_mut(&id)
            .ok_or(RecorderError::UnknownInstance(id))?;

        let Some(active) = instance.state.active_mut() else {
            tracing::trace!("Instance {} not recording, ignoring frame", id);
            return Ok(());
        };

        // A writer closes itself after a failed write; the failure was already reported
        if !active.writer.is_opened() {
            tracing::trace!("Encoder of instance {} closed, dropping frame", id);
            return Ok(());
        }

        if !host.is_valid_device(&active.device) {
            tracing::trace!("Device {:?} invalid, dropping frame", active.device);
            return Ok(());
        }

        let (width, height) = (active.size.width, active.size.height);
        let Some(sample) = host.image_sample(&active.device, width, height) else {
            tracing::trace!("No sample from {:?}, dropping frame", active.device);
            return Ok(());
        };
        sample.ensure_size(width, height)?;

        if let Err(e) = active.writer.write_frame(&sample.flipped()) {
            warn_console(
                host,
                format!("recording to {} failed: {}", active.output_path.display(), e),
            );
            return Err(e);
        }
        Ok(())
    }

    /// End-of-action callback: closes the recording and fills the preload.
    ///
    /// Returns `None` when the instance was not recording.
    pub fn on_post_action(&mut self, id: InstanceId) -> RecorderResult<Option<RecordingOutcome>> {
        let Self {
            host, instances, ..
        } = self;
        let instance = instances
            .get_mut(&id)
            .ok_or(RecorderError::UnknownInstance(id))?;

        let Some(active) = instance.state.take() else {
            tracing::debug!("Instance {} stopped while not recording", id);
            return Ok(None);
        };

        let output_path = active.output_path.clone();
        let started_at = active.started_at;
        let frames_written = active.writer.frames_written();
        close_recording(host, active)?;

        let settings = &instance.settings;
        let preload_index = if settings.load_into_preload_after_record {
            host.set_preload_media(settings.preload_index, Some(&output_path));
            Some(settings.preload_index)
        } else {
            None
        };

        let duration_ms = (Utc::now() - started_at).num_milliseconds();
        info_console(
            host,
            format!(
                "recorded {} frames ({} ms) to {}",
                frames_written,
                duration_ms,
                output_path.display()
            ),
        );

        Ok(Some(RecordingOutcome {
            output_path,
            frames_written,
            duration_ms,
            preload_index,
        }))
    }

    /// Status query for the host's blinking indicator
    pub fn render_blinking(&self, id: InstanceId) -> bool {
        self.instances
            .get(&id)
            .map(|i| i.state.is_recording())
            .unwrap_or(false)
    }

    /// Panel-render callback
    pub fn on_render_panel(&mut self, id: InstanceId, ui: &mut dyn PanelUi) -> RecorderResult<()> {
        let devices = self.host.capture_device_names();
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(RecorderError::UnknownInstance(id))?;
        render_panel(instance, &devices, ui);
        Ok(())
    }
}

impl<H: Host> Drop for VideoWriterPlugin<H> {
    fn drop(&mut self) {
        let ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        for id in ids {
            self.on_destroy(id);
        }
    }
}

/// Finish the encoder and release the device
fn close_recording<H: Host + ?Sized>(host: &mut H, active: ActiveRecording) -> RecorderResult<()> {
    let finished = active.writer.finish();

    if active.device_referenced && host.is_valid_device(&active.device) {
        host.reference_device(&active.device, false);
    }

    if let Err(e) = &finished {
        warn_console(
            host,
            format!("finishing {} failed: {}", active.output_path.display(), e),
        );
    }
    finished
}

/// Clear the way for a recording at a user-specified path
fn prepare_specified_file<H: Host + ?Sized>(host: &mut H, file_path: &str) -> RecorderResult<PathBuf> {
    if file_path.trim().is_empty() {
        return Err(RecorderError::InvalidConfig(
            "no file path specified".to_string(),
        ));
    }
    let path = PathBuf::from(file_path);

    if !host.unload_media(&path) {
        info_console(
            host,
            format!("cannot unload {}, maybe not in use", path.display()),
        );
    }

    if path.is_file() {
        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!("Removed previous recording {:?}", path),
            Err(e) => warn_console(
                host,
                format!("cannot remove {}, maybe still in use / {}", path.display(), e),
            ),
        }
    }

    Ok(path)
}
