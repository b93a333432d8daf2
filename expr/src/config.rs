//! Execution configuration.
//!
//! Limits and switches that apply to a whole stream run. Configuration is
//! plain data: build it in code with the `with_*` methods or load it from
//! JSON.

use serde::Deserialize;

use crate::{EvalError, EvalResult};

/// Default cap on documents a blocking stage (sort, group, union) may hold.
pub const DEFAULT_MAX_BUFFERED_DOCUMENTS: usize = 1_000_000;

/// Limits and switches for one stream run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Maximum number of documents a blocking stage may buffer. `None`
    /// means unbounded.
    pub max_buffered_documents: Option<usize>,

    /// Whether sources poll the interrupt flag between documents.
    pub interrupt_check: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_buffered_documents: Some(DEFAULT_MAX_BUFFERED_DOCUMENTS),
            interrupt_check: true,
        }
    }
}

impl ExecutionConfig {
    /// A configuration without any buffering limit.
    pub fn unbounded() -> Self {
        Self {
            max_buffered_documents: None,
            ..Default::default()
        }
    }

    pub fn with_max_buffered_documents(mut self, max: usize) -> Self {
        self.max_buffered_documents = Some(max);
        self
    }

    pub fn with_interrupt_check(mut self, enabled: bool) -> Self {
        self.interrupt_check = enabled;
        self
    }

    /// Load a configuration from JSON. Missing keys keep their defaults.
    pub fn from_json(input: &str) -> EvalResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| EvalError::Config {
            message: e.to_string(),
        })
    }
}
