//! Config validation with path-scoped, user-friendly messages.

use crate::schema::BridgewireConfig;
use std::path::Path;
use thiserror::Error;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BridgewireConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_media(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_media(config: &BridgewireConfig, report: &mut ValidationReport) {
    let Some(media) = &config.media else { return };

    if let Some(dir) = &media.downloads_directory {
        if dir.trim().is_empty() {
            report.error("media.downloadsDirectory", "Downloads directory cannot be empty");
        } else if !Path::new(dir).is_absolute() {
            report.warn(
                "media.downloadsDirectory",
                "Relative downloads directory is resolved against the working directory",
            );
        }
    }

    if media.downloads_enabled == Some(false) && media.store_failed_downloads == Some(true) {
        report.warn(
            "media.storeFailedDownloads",
            "Has no effect while downloads are disabled",
        );
    }
}

fn validate_logging(config: &BridgewireConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            report.warn("logging.level", format!("Unknown log level '{level}'"));
        }
    }
}
