//! Log output for the command-line tools.
//!
//! The library only writes through the `log` facade; binaries call
//! [`init_logger`] once at startup.

use error_stack::{Report, ResultExt};
use log::LevelFilter;

use crate::error::BidderError;

/// Route `log` records to stderr with an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns an error if a logger has already been installed.
pub fn init_logger(level: LevelFilter) -> Result<(), Report<BidderError>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .change_context(BidderError::Configuration {
            message: "Failed to initialize logger".to_string(),
        })
}

/// Map a `-v` count to a level filter.
#[must_use]
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
