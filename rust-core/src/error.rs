use lectern_ocr_worker::EngineError;
use thiserror::Error;

use crate::queue::{FileId, FileStatus};

/// Errors that escape the per-file isolation boundary, plus queue misuse.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to initialize recognition engine for '{language}': {source}")]
    EngineInit {
        language: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to release recognition engine: {0}")]
    EngineRelease(#[source] EngineError),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("unsupported file '{0}': expected a JPG, PNG or PDF")]
    UnsupportedFile(String),

    #[error("unknown file id {0}")]
    UnknownFile(FileId),

    #[error("illegal status transition for {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        id: FileId,
        from: FileStatus,
        to: FileStatus,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
