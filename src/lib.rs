pub mod api;
pub mod assembler;
pub mod config;
pub mod cycle;
pub mod error;
pub mod ffmpeg;
pub mod generator;
pub mod init;
pub mod media;
pub mod overlay;
pub mod phrases;
pub mod segment;
pub mod speech;
pub mod topics;
pub mod upload;

pub use error::{Error, Result};

use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber shared by every binary. `RUST_LOG` wins over
/// the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!("{}", message),
        "OK" => tracing::info!(status = "ok", "{}", message),
        _ => tracing::info!("{}", message),
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}
