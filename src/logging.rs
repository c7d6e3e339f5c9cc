//! Diagnostic logging setup.
//!
//! Library code logs through the [`log`] facade. The binary installs a
//! `flexi_logger` backend writing to stderr, so stdout stays reserved for
//! the progress lines and stats table. Nothing is written to log files.

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Level used when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LEVEL: &str = "info";

/// Start the stderr logger.
///
/// An explicit `level` (e.g. `"debug"`, `"photoprep=trace"`) wins over
/// `RUST_LOG`; otherwise `RUST_LOG` wins over [`DEFAULT_LEVEL`]. Keep the
/// returned handle alive for the life of the program.
pub fn setup_logging(level: Option<&str>) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = match level {
        Some(spec) => Logger::try_with_str(spec)?,
        None => Logger::try_with_env_or_str(DEFAULT_LEVEL)?,
    };
    logger
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
}
