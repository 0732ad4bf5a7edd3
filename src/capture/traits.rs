//! Capture trait definitions
//!
//! The host owns every capture device. The plugin only sees names, asks the
//! host to resolve them, and brackets a recording with a reference-count
//! increment and decrement.

use super::frame::Frame;
use std::path::Path;

/// Host media API
pub trait MediaHost {
    /// Names of all capture devices, in host order
    fn capture_device_names(&self) -> Vec<String>;

    /// Whether the name currently resolves to a usable device
    fn is_valid_device(&self, name: &str) -> bool;

    /// Increment (`true`) or decrement (`false`) the device's reference count.
    ///
    /// A referenced device is kept capturing by the host.
    fn reference_device(&mut self, name: &str, active: bool);

    /// Fetch the latest image sample from a device, scaled to the given size.
    ///
    /// Samples are bottom-up BGR24.
    fn image_sample(&mut self, name: &str, width: u32, height: u32) -> Option<Frame>;

    /// Global playout frame rate
    fn fps(&self) -> f64;

    /// Drop a media file from the host cache if no clip uses it.
    ///
    /// Returns `false` when nothing was unloaded.
    fn unload_media(&mut self, path: &Path) -> bool;
}

/// Pick the default capture device for a new instance.
///
/// The first entry is usually the host's own output, so the second one is
/// preferred. A single device is still used.
pub fn default_capture_device(names: &[String]) -> Option<&str> {
    names.get(1).or_else(|| names.first()).map(String::as_str)
}
