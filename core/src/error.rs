//! Core error types.

use thiserror::Error;

use crate::Type;

/// Result type for value operations.
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors raised by the value model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("cannot cast {from} as {to}: {value}")]
    Cast { from: Type, to: Type, value: String },

    #[error("invalid path {input:?}: {message}")]
    InvalidPath { input: String, message: String },

    #[error("cannot traverse {path}: segment {segment} expects {expected}, found {found}")]
    IncompatiblePath {
        path: String,
        segment: String,
        expected: Type,
        found: Type,
    },

    #[error("invalid JSON document: {message}")]
    Json { message: String },
}

impl ValueError {
    pub fn cast(from: Type, to: Type, value: impl Into<String>) -> Self {
        Self::Cast {
            from,
            to,
            value: value.into(),
        }
    }

    pub fn incompatible_path(
        path: impl Into<String>,
        segment: impl Into<String>,
        expected: Type,
        found: Type,
    ) -> Self {
        Self::IncompatiblePath {
            path: path.into(),
            segment: segment.into(),
            expected,
            found,
        }
    }

    pub fn invalid_path(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            input: input.into(),
            message: message.into(),
        }
    }
}
