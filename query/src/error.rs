//! Query error types.

use tessera_core::{Type, ValueError};
use tessera_expr::EvalError;
use tessera_stream::StreamError;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// When an error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// While compiling a statement, before any document is read.
    Compile,
    /// While evaluating constant expressions such as OFFSET and LIMIT.
    Evaluation,
    /// While a compiled stream runs.
    Runtime,
}

/// Errors that can occur while compiling or running a statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("field \"{field}\" must appear in the GROUP BY clause or be used in an aggregate function")]
    InvalidGroupByProjection { field: String },

    #[error("no tables specified")]
    NoTablesSpecified,

    #[error("{clause} expression must evaluate to a number, got \"{found}\"")]
    NotANumber { clause: &'static str, found: Type },

    #[error("{clause} expression must not be negative, got {value}")]
    NegativeCount { clause: &'static str, value: i64 },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl QueryError {
    pub fn invalid_group_by_projection(field: impl Into<String>) -> Self {
        Self::InvalidGroupByProjection {
            field: field.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::InvalidGroupByProjection { .. } | QueryError::NoTablesSpecified => {
                ErrorKind::Compile
            }
            QueryError::NotANumber { .. } | QueryError::NegativeCount { .. } | QueryError::Eval(_) => {
                ErrorKind::Evaluation
            }
            QueryError::Stream(_) => ErrorKind::Runtime,
        }
    }
}

impl From<ValueError> for QueryError {
    fn from(e: ValueError) -> Self {
        Self::Eval(EvalError::Value(e))
    }
}
