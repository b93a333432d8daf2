//! The stream type: an ordered list of operator stages.

use std::fmt;
use std::ops::ControlFlow;

use tessera_core::Document;
use tessera_expr::Environment;
use tracing::debug;

use crate::exec::run;
use crate::{Operator, StreamError, StreamResult};

/// An immutable chain of operator stages, built by appending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    ops: Vec<Operator>,
}

impl Stream {
    /// A stream starting with `op`.
    pub fn new(op: Operator) -> Self {
        Self { ops: vec![op] }
    }

    /// A stream with no stages. Running it yields the input environment
    /// once.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn pipe(mut self, op: Operator) -> Self {
        self.ops.push(op);
        self
    }

    pub fn operators(&self) -> &[Operator] {
        &self.ops
    }

    pub fn last(&self) -> Option<&Operator> {
        self.ops.last()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run the stream, calling `f` with the environment of every output
    /// document. Returning `ControlFlow::Break` from `f` stops the run
    /// without error.
    pub fn iterate<F>(&self, env: &Environment<'_>, mut f: F) -> StreamResult<()>
    where
        F: FnMut(&Environment<'_>) -> StreamResult<ControlFlow<()>>,
    {
        debug!(stream = %self, "stream started");
        let mut emitted = 0usize;
        let result = run(&self.ops, env, &mut |out| {
            emitted += 1;
            f(out)
        });
        match &result {
            Ok(_) => debug!(emitted, "stream finished"),
            Err(StreamError::Cancelled) => debug!(emitted, "stream cancelled"),
            Err(e) => debug!(emitted, error = %e, "stream failed"),
        }
        result.map(|_| ())
    }

    /// Run the stream and collect every output document.
    pub fn collect(&self, env: &Environment<'_>) -> StreamResult<Vec<Document>> {
        let mut docs = Vec::new();
        self.iterate(env, |out| {
            if let Some(doc) = out.document() {
                docs.push(doc.clone());
            }
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(docs)
    }
}

impl From<Operator> for Stream {
    fn from(op: Operator) -> Self {
        Stream::new(op)
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}
