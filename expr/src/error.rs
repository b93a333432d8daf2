//! Evaluation error types.

use tessera_core::ValueError;
use thiserror::Error;

/// Result type for expression evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("no document in the current environment")]
    NoDocument,

    #[error("{what} cannot be evaluated as a scalar")]
    NotScalar { what: String },

    #[error("parameter {name} not found")]
    ParamNotFound { name: String },

    #[error("unknown table: {name}")]
    UnknownTable { name: String },

    #[error("unknown sequence: {name}")]
    UnknownSequence { name: String },

    #[error("no catalog available to resolve {what}")]
    NoCatalog { what: String },

    #[error("{function} expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("invalid execution config: {message}")]
    Config { message: String },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl EvalError {
    pub fn not_scalar(what: impl Into<String>) -> Self {
        Self::NotScalar { what: what.into() }
    }

    pub fn param_not_found(name: impl Into<String>) -> Self {
        Self::ParamNotFound { name: name.into() }
    }

    pub fn unknown_table(name: impl Into<String>) -> Self {
        Self::UnknownTable { name: name.into() }
    }

    pub fn unknown_sequence(name: impl Into<String>) -> Self {
        Self::UnknownSequence { name: name.into() }
    }

    pub fn no_catalog(what: impl Into<String>) -> Self {
        Self::NoCatalog { what: what.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
