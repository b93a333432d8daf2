//! Evaluation environments.
//!
//! An `Environment` is the scope an expression is evaluated in: the current
//! document plus a link to the enclosing environment. Shared run state
//! (catalog, parameters, interrupt flag, configuration) lives in an
//! `ExecutionContext` that is inherited through the outer chain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tessera_core::{Document, Value};

use crate::{EvalError, EvalResult, ExecutionConfig};

/// Documents yielded by a table scan, in storage order.
pub type DocumentScan<'a> = Box<dyn Iterator<Item = EvalResult<Document>> + 'a>;

/// Read access to tables and sequences.
pub trait Catalog {
    /// Scan every document of a table in storage order.
    fn scan(&self, table: &str) -> EvalResult<DocumentScan<'_>>;

    /// Advance a sequence and return its new value.
    fn next_sequence_value(&self, sequence: &str) -> EvalResult<i64>;
}

/// Shared cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every run observing this flag.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A bound statement parameter. Unnamed parameters are matched by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub value: Value,
}

impl Param {
    pub fn positional(value: impl Into<Value>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    pub fn named(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

static DEFAULT_CONFIG: ExecutionConfig = ExecutionConfig {
    max_buffered_documents: Some(crate::config::DEFAULT_MAX_BUFFERED_DOCUMENTS),
    interrupt_check: true,
};

/// Run-wide state shared by every environment of one execution.
#[derive(Default)]
pub struct ExecutionContext<'a> {
    catalog: Option<&'a dyn Catalog>,
    params: Vec<Param>,
    interrupt: Interrupt,
    config: ExecutionConfig,
}

impl<'a> ExecutionContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: &'a dyn Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(&self) -> Option<&'a dyn Catalog> {
        self.catalog
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }
}

impl std::fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("has_catalog", &self.catalog.is_some())
            .field("params", &self.params)
            .field("interrupt", &self.interrupt)
            .field("config", &self.config)
            .finish()
    }
}

/// The scope an expression is evaluated in.
#[derive(Debug, Clone, Default)]
pub struct Environment<'a> {
    document: Option<Document>,
    outer: Option<&'a Environment<'a>>,
    context: Option<&'a ExecutionContext<'a>>,
}

impl<'a> Environment<'a> {
    /// An empty environment: no document, no context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A root environment bound to an execution context.
    pub fn with_context(context: &'a ExecutionContext<'a>) -> Self {
        Self {
            document: None,
            outer: None,
            context: Some(context),
        }
    }

    /// A child environment holding `document`, nested inside `outer`.
    pub fn nested(outer: &'a Environment<'a>, document: Document) -> Self {
        Self {
            document: Some(document),
            outer: Some(outer),
            context: None,
        }
    }

    /// Set the current document of this environment.
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// The nearest document, searching outward.
    pub fn document(&self) -> Option<&Document> {
        match &self.document {
            Some(doc) => Some(doc),
            None => self.outer.and_then(|outer| outer.document()),
        }
    }

    pub fn outer(&self) -> Option<&'a Environment<'a>> {
        self.outer
    }

    /// The nearest execution context, searching outward.
    pub fn context(&self) -> Option<&'a ExecutionContext<'a>> {
        match self.context {
            Some(ctx) => Some(ctx),
            None => self.outer.and_then(|outer| outer.context()),
        }
    }

    /// The catalog of the nearest execution context.
    pub fn catalog(&self) -> EvalResult<&'a dyn Catalog> {
        self.context()
            .and_then(|ctx| ctx.catalog())
            .ok_or_else(|| EvalError::no_catalog("catalog access"))
    }

    /// Configuration of the nearest execution context, or the defaults.
    pub fn config(&self) -> &ExecutionConfig {
        match self.context() {
            Some(ctx) => ctx.config(),
            None => &DEFAULT_CONFIG,
        }
    }

    /// Returns true when the run was cancelled and sources should stop.
    pub fn is_interrupted(&self) -> bool {
        match self.context() {
            Some(ctx) => ctx.config().interrupt_check && ctx.interrupt().is_triggered(),
            None => false,
        }
    }

    /// Look up the 1-based positional parameter `index`.
    pub fn positional_param(&self, index: usize) -> EvalResult<Value> {
        let params = self.context().map(|ctx| ctx.params()).unwrap_or(&[]);
        index
            .checked_sub(1)
            .and_then(|i| params.get(i))
            .map(|p| p.value.clone())
            .ok_or_else(|| EvalError::param_not_found(format!("?{}", index)))
    }

    /// Look up a named parameter.
    pub fn named_param(&self, name: &str) -> EvalResult<Value> {
        let params = self.context().map(|ctx| ctx.params()).unwrap_or(&[]);
        params
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
            .map(|p| p.value.clone())
            .ok_or_else(|| EvalError::param_not_found(format!("${}", name)))
    }
}
