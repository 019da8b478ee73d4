//! `bridgewire-config`: runtime configuration for the media bridge.
//!
//! Provides:
//! - Typed config schema (media transfer and logging sections)
//! - YAML loading
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with path-scoped errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::{apply_all_defaults, default_downloads_directory};
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_file_path, load_config};
pub use schema::{BridgewireConfig, LogSettings, LoggingConfig, MediaConfig, MediaSettings};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use bridgewire_core::BridgeError;
use serde_json::Value;
use std::path::Path;

/// Load, apply env substitution, apply defaults, and validate a config file.
///
/// This is the main entry point for loading a config at runtime. Validation
/// errors fail the load; warnings are only logged.
pub async fn load_and_prepare(path: &Path) -> Result<BridgewireConfig> {
    let raw_config = load_config(path).await?;
    prepare(raw_config)
}

fn prepare(raw_config: BridgewireConfig) -> Result<BridgewireConfig> {
    let value: Value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;

    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config: BridgewireConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        let joined = report
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(BridgeError::ConfigError(joined).into());
    }

    Ok(config)
}
