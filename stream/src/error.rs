//! Stream execution errors.

use tessera_core::{Type, ValueError};
use tessera_expr::EvalError;
use thiserror::Error;

/// Result type for stream execution.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors raised while a stream runs. Any error aborts the whole run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    #[error("cannot set path {path}: {source}")]
    IncompatiblePath { path: String, source: ValueError },

    #[error("execution cancelled")]
    Cancelled,

    #[error("{stage} buffered more than {limit} documents")]
    BufferLimitExceeded { stage: &'static str, limit: usize },

    #[error("{stage} expected a document, got {found}")]
    NotADocument { stage: &'static str, found: Type },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl StreamError {
    pub fn incompatible_path(path: impl Into<String>, source: ValueError) -> Self {
        Self::IncompatiblePath {
            path: path.into(),
            source,
        }
    }

    pub fn buffer_limit(stage: &'static str, limit: usize) -> Self {
        Self::BufferLimitExceeded { stage, limit }
    }
}
