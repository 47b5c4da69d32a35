// src/error.rs

//! Error types for the packaging pipeline.
//!
//! Every strategy-internal failure is recoverable (the selector falls
//! through to the next strategy); only `Config` aborts the run, since no
//! strategy can produce a correct package from invalid metadata.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid extension metadata. Raised before any file I/O.
    #[error("invalid extension metadata: {0}")]
    Config(String),

    /// A mandatory input asset is absent.
    #[error("required asset missing: {}", .0.display())]
    AssetMissing(PathBuf),

    /// An external tool or script could not be spawned, exited non-zero,
    /// or exceeded its deadline.
    #[error("tool invocation failed: {0}")]
    ToolInvocation(String),

    /// The produced archive failed the descriptor check.
    #[error("archive verification failed: {0}")]
    Verification(String),

    /// I/O failure while writing the output archive.
    #[error("failed to write archive: {0}")]
    ArchiveWrite(String),

    /// Every strategy was attempted and none produced an archive.
    #[error("all packaging strategies failed ({0})")]
    StrategiesExhausted(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Io(err.into())
    }
}
