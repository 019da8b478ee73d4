//! Config defaults: applies sensible default values to parsed config.

use std::path::PathBuf;

use crate::schema::{BridgewireConfig, LoggingConfig, MediaConfig};

pub const DEFAULT_DOWNLOADS_ENABLED: bool = true;

pub const DEFAULT_STORE_FAILED_DOWNLOADS: bool = false;

pub const DEFAULT_INLINE_IMAGES: bool = false;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// `<data_dir>/bridgewire/downloads`, or a relative fallback without a home.
pub fn default_downloads_directory() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("bridgewire"))
        .unwrap_or_else(|| PathBuf::from(".bridgewire"))
        .join("downloads")
}

/// `<data_dir>/bridgewire/logs`, or a relative fallback without a home.
pub fn default_log_directory() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("bridgewire"))
        .unwrap_or_else(|| PathBuf::from(".bridgewire"))
        .join("logs")
}

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: BridgewireConfig) -> BridgewireConfig {
    let config = apply_media_defaults(config);
    apply_logging_defaults(config)
}

fn apply_media_defaults(mut config: BridgewireConfig) -> BridgewireConfig {
    let media = config.media.get_or_insert_with(MediaConfig::default);
    media.downloads_enabled.get_or_insert(DEFAULT_DOWNLOADS_ENABLED);
    media
        .store_failed_downloads
        .get_or_insert(DEFAULT_STORE_FAILED_DOWNLOADS);
    media.inline_images.get_or_insert(DEFAULT_INLINE_IMAGES);
    if media.downloads_directory.is_none() {
        media.downloads_directory =
            Some(default_downloads_directory().to_string_lossy().into_owned());
    }
    config
}

fn apply_logging_defaults(mut config: BridgewireConfig) -> BridgewireConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.directory.is_none() {
        logging.directory = Some(default_log_directory().to_string_lossy().into_owned());
    }
    config
}
