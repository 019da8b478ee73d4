use thiserror::Error;

/// Top-level error type for the Bridgewire runtime.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}
