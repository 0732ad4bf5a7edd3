//! Settings panel
//!
//! Drawn every UI frame through the host's immediate-mode API. Widget
//! results are written straight back into the instance settings.

use super::state::{Instance, StorageMode, PRELOAD_INDEX_RANGE};
use crate::host::PanelUi;

/// Maximum byte length accepted by the file path field
pub const FILE_PATH_MAX_LEN: usize = 256;

/// Drag speed of the preload index control
pub const PRELOAD_DRAG_SPEED: f32 = 10.0;

/// Draw the panel for one instance
pub fn render_panel(instance: &mut Instance, device_names: &[String], ui: &mut dyn PanelUi) {
    ui.text_unformatted("This plugin records a camera stream");

    if let Some(temp) = instance.state.active().and_then(|a| a.temp_file.as_ref()) {
        ui.text_unformatted(&temp.to_string_lossy());
    }

    let open = instance
        .state
        .active()
        .map(|a| a.writer.is_opened())
        .unwrap_or(false);
    ui.text_unformatted(if open { "Recording" } else { "Not recording" });

    let settings = &mut instance.settings;

    // Unknown devices show as the first entry until the user picks one
    let current = device_names
        .iter()
        .position(|name| *name == settings.capture_device)
        .unwrap_or(0);
    let (changed, selected) = ui.combo("Capture Device", current, device_names);
    if changed {
        if let Some(name) = device_names.get(selected) {
            tracing::debug!("Capture device changed to {}", name);
            settings.capture_device = name.clone();
        }
    }

    let size = [
        settings.video_size.width as i32,
        settings.video_size.height as i32,
    ];
    let (changed, [width, height]) = ui.drag_int2("Recording resolution", size);
    if changed {
        settings.set_video_size(width as i64, height as i64);
    }

    let (changed, value) = ui.checkbox(
        "Load into preload after recording",
        settings.load_into_preload_after_record,
    );
    if changed {
        settings.load_into_preload_after_record = value;
    }

    let (min, max) = PRELOAD_INDEX_RANGE;
    let (changed, value) = ui.drag_int(
        "Target preload index",
        settings.preload_index,
        PRELOAD_DRAG_SPEED,
        min,
        max,
    );
    if changed {
        settings.preload_index = value.clamp(min, max);
    }

    ui.text_unformatted("File Storage Option:");
    if ui.radio_button("Temporary File", settings.storage == StorageMode::Temporary) {
        settings.storage = StorageMode::Temporary;
    }
    if ui.radio_button("Specified File", settings.storage == StorageMode::SpecifiedFile) {
        settings.storage = StorageMode::SpecifiedFile;
    }

    if settings.storage == StorageMode::SpecifiedFile {
        let (changed, path) = ui.input_text("File Path", &settings.file_path, FILE_PATH_MAX_LEN);
        if changed {
            settings.file_path = truncate_to_boundary(path, FILE_PATH_MAX_LEN);
        }
    }
}

fn truncate_to_boundary(mut value: String, max_len: usize) -> String {
    if value.len() > max_len {
        let mut end = max_len;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        value.truncate(end);
    }
    value
}
