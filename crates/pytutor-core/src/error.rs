//! Domain error types.
//!
//! Catalog and progress failures are typed so the CLI can report them
//! precisely; everything else travels as `anyhow::Error` with context.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or interpreting a challenge catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested challenge id does not exist.
    #[error("unknown challenge: {0}")]
    UnknownChallenge(String),

    /// The requested lesson id does not exist.
    #[error("unknown lesson: {0}")]
    UnknownLesson(String),

    /// A stage name could not be parsed.
    #[error("unknown stage: {0}")]
    UnknownStage(String),

    /// An expected literal could not be turned into a binding value.
    #[error("unsupported expected value in {context}: {message}")]
    UnsupportedValue { context: String, message: String },
}

/// Errors raised by the progress store.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// The save file exists but is not a valid progress record.
    #[error("malformed progress file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the save file failed.
    #[error("progress file I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
