use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while turning a photo into product assets.
///
/// Only `InputNotFound` and `InvalidConfig` stop a run. The rest are per-item
/// outcomes: the orchestrator counts them and moves on to the next file.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("could not extract a SKU from '{0}'")]
    NoSkuExtracted(String),

    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("failed to encode WebP: {0}")]
    Encode(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ProcessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcessError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessError>;
