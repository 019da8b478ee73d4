//! Bridgewire runtime configuration schema.
//!
//! Typed for serde YAML/JSON deserialization. Every leaf is optional in the
//! file; `defaults` fills the gaps and `MediaSettings` is the resolved view
//! handed to the media subsystem.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::defaults::{
    default_downloads_directory, default_log_directory, DEFAULT_DOWNLOADS_ENABLED,
    DEFAULT_INLINE_IMAGES, DEFAULT_LOG_LEVEL, DEFAULT_STORE_FAILED_DOWNLOADS,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for Bridgewire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgewireConfig {
    /// Media transfer settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaConfig {
    /// Download media of incoming messages at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_enabled: Option<bool>,

    /// Write an empty placeholder after a failed download so it is not retried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_failed_downloads: Option<bool>,

    /// Where received media and the staged outgoing file live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_directory: Option<String>,

    /// Hand image bytes back to the caller instead of writing them to disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_images: Option<bool>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved view
// ---------------------------------------------------------------------------

/// Fully resolved media settings, passed by reference into every media operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSettings {
    pub downloads_enabled: bool,
    pub store_failed_downloads: bool,
    pub downloads_directory: PathBuf,
    pub inline_images: bool,
}

impl MediaSettings {
    /// Settings with everything enabled except failure placeholders and inlining.
    pub fn new(downloads_directory: impl Into<PathBuf>) -> Self {
        Self {
            downloads_enabled: DEFAULT_DOWNLOADS_ENABLED,
            store_failed_downloads: DEFAULT_STORE_FAILED_DOWNLOADS,
            downloads_directory: downloads_directory.into(),
            inline_images: DEFAULT_INLINE_IMAGES,
        }
    }
}

/// Resolved logging section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub directory: PathBuf,
}

impl BridgewireConfig {
    /// Resolve the media section, falling back to defaults for unset fields.
    pub fn media_settings(&self) -> MediaSettings {
        let media = self.media.clone().unwrap_or_default();
        MediaSettings {
            downloads_enabled: media.downloads_enabled.unwrap_or(DEFAULT_DOWNLOADS_ENABLED),
            store_failed_downloads: media
                .store_failed_downloads
                .unwrap_or(DEFAULT_STORE_FAILED_DOWNLOADS),
            downloads_directory: media
                .downloads_directory
                .map(PathBuf::from)
                .unwrap_or_else(default_downloads_directory),
            inline_images: media.inline_images.unwrap_or(DEFAULT_INLINE_IMAGES),
        }
    }

    pub fn log_settings(&self) -> LogSettings {
        let logging = self.logging.clone().unwrap_or_default();
        LogSettings {
            level: logging.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            directory: logging
                .directory
                .map(PathBuf::from)
                .unwrap_or_else(default_log_directory),
        }
    }
}
