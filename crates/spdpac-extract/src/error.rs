//! Error types for the extractor command.

use spdpac_formats::PacError;
use thiserror::Error;

/// Errors raised by the command layer.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid combination or value of command-line options
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Decoding, validation or extraction failed
    #[error(transparent)]
    Pac(#[from] PacError),

    /// Summary could not be encoded
    #[error("Failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to standard output failed
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Some partitions failed under the keep-going policy
    #[error("{failed} of {attempted} partitions failed to extract")]
    Incomplete {
        /// Partitions that failed
        failed: usize,
        /// Partitions with a payload
        attempted: usize,
    },
}
