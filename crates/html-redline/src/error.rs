//! Error types for redline builds.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors that can occur while building a redline document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading a document through the HTML parser failed.
    #[error("failed to parse HTML: {0}")]
    Parse(#[source] std::io::Error),

    /// A custom word boundary pattern was rejected.
    #[error("invalid word boundary pattern `{pattern}`: {reason}")]
    InvalidBoundary { pattern: String, reason: String },

    /// The external diff command could not be started.
    #[error("failed to run diff command {}: {source}", .command.display())]
    DiffEngineSpawn {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external diff command reported trouble (exit status other than 0 or 1).
    #[error("diff command {} failed with {status}: {stderr}", .command.display())]
    DiffEngineFailed {
        command: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    /// The alignment does not describe the two word lists it was asked about.
    #[error("diff engine produced an inconsistent alignment: {0}")]
    DiffEngineOutput(String),

    /// I/O error while staging diff inputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for redline operations.
pub type Result<T> = std::result::Result<T, Error>;
