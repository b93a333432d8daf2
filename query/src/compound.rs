//! UNION / UNION ALL chains.
//!
//! Branches are folded left to right. Adjacent branches joined by the same
//! operator share one multi-input stage; when the operator changes, the
//! stage built so far becomes the first branch of a stage of the new kind.
//! `a UNION ALL b UNION c UNION ALL d` therefore becomes
//! `concat(union(concat(a, b), c), d)`.

use tessera_stream::{Operator, Stream};
use tracing::trace;

use crate::{QueryResult, SelectCoreStmt, StreamStmt};

/// Operator joining two SELECT cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOperator {
    /// `UNION`: duplicates removed.
    Union,
    /// `UNION ALL`: every row kept, in branch order.
    UnionAll,
}

impl CompoundOperator {
    fn combine(self, branches: Vec<Stream>) -> Stream {
        match self {
            CompoundOperator::Union => Stream::new(Operator::Union(branches)),
            CompoundOperator::UnionAll => Stream::new(Operator::Concat(branches)),
        }
    }
}

/// A first SELECT core followed by operator-prefixed cores.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelectStmt {
    pub first: SelectCoreStmt,
    pub rest: Vec<(CompoundOperator, SelectCoreStmt)>,
}

impl CompoundSelectStmt {
    pub fn new(first: SelectCoreStmt) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }

    /// Append a core joined by `op`.
    pub fn with(mut self, op: CompoundOperator, core: SelectCoreStmt) -> Self {
        self.rest.push((op, core));
        self
    }

    /// Compile every core and fold them into one stream. The result is
    /// read-only only when every core is.
    pub fn to_stream(&self) -> QueryResult<StreamStmt> {
        let first = self.first.to_stream()?;
        let mut read_only = first.read_only;

        let mut run: Vec<Stream> = vec![first.stream];
        let mut pending: Option<CompoundOperator> = None;

        for (op, core) in &self.rest {
            let branch = core.to_stream()?;
            read_only &= branch.read_only;

            match pending {
                Some(kind) if kind != *op => {
                    trace!(from = ?kind, to = ?op, branches = run.len(), "compound run closed");
                    let closed = kind.combine(std::mem::take(&mut run));
                    run.push(closed);
                }
                _ => {}
            }
            pending = Some(*op);
            run.push(branch.stream);
        }

        let stream = match pending {
            Some(kind) => kind.combine(run),
            // A single core is its own stream.
            None => run.pop().unwrap_or_default(),
        };

        Ok(StreamStmt::new(stream, read_only))
    }
}
