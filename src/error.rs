//! Error types for modem-stats

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for modem-stats
pub type Result<T> = std::result::Result<T, Error>;

/// Startup and server errors
///
/// Nothing in the request path returns these; modem failures are rendered
/// into the page as [`CommandError`] text instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single modem command invocation
#[derive(Error, Debug)]
pub enum CommandError {
    /// No program configured
    #[error("no modem program configured")]
    EmptyProgram,

    /// The program could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The program ran but reported failure
    #[error("{0}")]
    Exit(ExitStatus),

    /// The program did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
