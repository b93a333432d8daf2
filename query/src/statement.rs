//! Compiled statements and their execution.

use std::ops::ControlFlow;

use tessera_core::Document;
use tessera_expr::{Environment, ExecutionContext, Expr};
use tessera_stream::{Operator, Stream};
use tracing::{debug, info_span};

use crate::{QueryResult, SelectStmt};

/// A compiled statement: the stream to run and whether running it can
/// write.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStmt {
    pub stream: Stream,
    pub read_only: bool,
}

impl StreamStmt {
    pub fn new(stream: Stream, read_only: bool) -> Self {
        Self { stream, read_only }
    }

    /// Run the statement and collect every output document.
    pub fn run(&self, ctx: &ExecutionContext<'_>) -> QueryResult<Vec<Document>> {
        let mut docs = Vec::new();
        self.iterate(ctx, |doc| {
            docs.push(doc.clone());
            ControlFlow::Continue(())
        })?;
        Ok(docs)
    }

    /// Run the statement, calling `f` with each output document until it
    /// returns `ControlFlow::Break`.
    pub fn iterate<F>(&self, ctx: &ExecutionContext<'_>, mut f: F) -> QueryResult<()>
    where
        F: FnMut(&Document) -> ControlFlow<()>,
    {
        let _span = info_span!("statement", read_only = self.read_only).entered();
        let env = Environment::with_context(ctx);
        self.stream.iterate(&env, |out| {
            Ok(match out.document() {
                Some(doc) => f(doc),
                None => ControlFlow::Continue(()),
            })
        })?;
        Ok(())
    }

    /// The rendered plan.
    pub fn explain(&self) -> String {
        self.stream.to_string()
    }
}

/// A statement accepted by the query layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStmt),
    /// Returns the plan of the inner SELECT as a single `plan` row instead
    /// of running it.
    Explain(SelectStmt),
}

impl Statement {
    pub fn to_stream(&self) -> QueryResult<StreamStmt> {
        match self {
            Statement::Select(select) => select.to_stream(),
            Statement::Explain(select) => {
                let plan = select.to_stream()?.explain();
                debug!(plan = %plan, "explain compiled");
                let stream = Stream::new(Operator::Project(vec![Expr::named("plan", Expr::literal(plan))]));
                Ok(StreamStmt::new(stream, true))
            }
        }
    }
}

impl From<SelectStmt> for Statement {
    fn from(select: SelectStmt) -> Self {
        Statement::Select(select)
    }
}
