//! Process-wide `tracing` subscriber.
//!
//! Human-readable lines go to stdout; the same events are appended as NDJSON
//! to a daily file under the configured log directory.

use bridgewire_config::LogSettings;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix of the rolling log; the appender adds `.YYYY-MM-DD`.
pub const LOG_FILE_NAME: &str = "bridgewire.log";

/// Install the subscriber described by `settings`.
///
/// `RUST_LOG` takes precedence over `settings.level`. Returns `false` when a
/// global subscriber was already installed, in which case nothing changes.
pub fn init_logger(settings: &LogSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let file = RollingFileAppender::new(Rotation::DAILY, &settings.directory, LOG_FILE_NAME);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().json().with_ansi(false).with_writer(file))
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(directory = %settings.directory.display(), "Logging initialised");
    }
    installed
}
