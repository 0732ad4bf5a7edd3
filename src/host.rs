//! Host application APIs consumed by the plugin
//!
//! The embedding layer implements these for the real host. Tests use the
//! in-memory host from `crate::testing`.

use crate::capture::MediaHost;
use std::path::Path;

/// Host preload API
pub trait PreloadHost {
    /// Assign a media file to a numbered preload slot; `None` clears the slot.
    fn set_preload_media(&mut self, index: i32, media: Option<&Path>);
}

/// Host console sink
pub trait ConsoleHost {
    fn print_console(&mut self, message: &str);
}

/// Everything the plugin needs from the host besides UI
pub trait Host: MediaHost + PreloadHost + ConsoleHost {}

impl<T: MediaHost + PreloadHost + ConsoleHost> Host for T {}

/// Host immediate-mode UI.
///
/// Value widgets return `(changed, new_value)`.
pub trait PanelUi {
    fn text_unformatted(&mut self, text: &str);

    fn combo(&mut self, label: &str, current: usize, items: &[String]) -> (bool, usize);

    fn drag_int(&mut self, label: &str, value: i32, speed: f32, min: i32, max: i32) -> (bool, i32);

    fn drag_int2(&mut self, label: &str, value: [i32; 2]) -> (bool, [i32; 2]);

    fn checkbox(&mut self, label: &str, value: bool) -> (bool, bool);

    /// Returns `true` when clicked this frame
    fn radio_button(&mut self, label: &str, active: bool) -> bool;

    fn input_text(&mut self, label: &str, value: &str, max_len: usize) -> (bool, String);
}

/// Log a warning to both tracing and the host console
pub(crate) fn warn_console<H: ConsoleHost + ?Sized>(host: &mut H, message: String) {
    tracing::warn!("{}", message);
    host.print_console(&format!("Plugin video writer: {}", message));
}

/// Log an informational line to both tracing and the host console
pub(crate) fn info_console<H: ConsoleHost + ?Sized>(host: &mut H, message: String) {
    tracing::info!("{}", message);
    host.print_console(&format!("Plugin video writer: {}", message));
}
