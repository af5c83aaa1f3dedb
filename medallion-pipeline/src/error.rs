//! Stage errors.

use thiserror::Error;

use medallion_core::data::{FrameError, SourceError};
use medallion_core::engine::EngineError;
use medallion_core::storage::StorageError;

/// Failure of one Bronze, Silver or Gold stage run (or of extraction).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("table: {0}")]
    Frame(#[from] FrameError),

    #[error("engine: {0}")]
    Engine(#[from] EngineError),

    #[error("extract: {0}")]
    Source(#[from] SourceError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("refusing to overwrite existing object {key}")]
    KeyCollision { key: String },

    #[error("no bars to load for {ticker}")]
    EmptyBatch { ticker: String },

    #[error("none of the {attempted} input object(s) for {ticker} could be read")]
    NoReadableInput { ticker: String, attempted: usize },

    #[error("ticker {ticker} panicked: {message}")]
    Panicked { ticker: String, message: String },
}
