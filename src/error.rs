//! Level setup errors
//!
//! Everything here is fatal: a level that fails setup cannot run.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for level setup
pub type Result<T> = std::result::Result<T, LevelError>;

/// Errors that can occur while building a level
#[derive(Error, Debug)]
pub enum LevelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed vine data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("vine data contains no vines")]
    NoVines,

    #[error("vine {index} is invalid: {reason}")]
    InvalidVine { index: usize, reason: String },
}
