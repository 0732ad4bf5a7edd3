//! Preload Recorder - record a host capture device into a preload slot.
//!
//! The host calls the lifecycle callbacks on [`VideoWriterPlugin`]; frames are
//! encoded to MP4 by ffmpeg and the finished file is handed to a numbered
//! preload slot.

pub mod capture;
pub mod config;
pub mod encoder;
pub mod host;
pub mod recorder;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RecorderConfig;
pub use recorder::VideoWriterPlugin;
pub use utils::error::{RecorderError, RecorderResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
///
/// `RUST_LOG` wins over `default_filter`. Safe to call more than once; only
/// the first call installs a subscriber.
pub fn init_tracing(default_filter: &str) {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting Preload Recorder v{}", env!("CARGO_PKG_VERSION"));
    }
}

/// Load configuration, set up logging and create the plugin for `host`
pub fn load_plugin<H: host::Host>(
    host: H,
    config_path: Option<&std::path::Path>,
) -> RecorderResult<VideoWriterPlugin<H>> {
    let config = RecorderConfig::load(config_path)?;
    init_tracing(&config.log_filter);
    Ok(VideoWriterPlugin::new(host, config))
}
