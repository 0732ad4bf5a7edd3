//! Capture sources
//!
//! Capture devices are provided by the host; this module defines how the
//! plugin talks to them and the frame type they produce.

pub mod frame;
pub mod traits;

pub use frame::Frame;
pub use traits::{default_capture_device, MediaHost};
