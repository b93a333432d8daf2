//! In-memory catalog.

use std::cell::RefCell;
use std::collections::BTreeMap;

use tessera_core::{Document, ValueResult};
use tessera_expr::{Catalog, DocumentScan, EvalError, EvalResult};
use tracing::trace;

/// Tables held as ordered document lists, plus named sequences.
///
/// Sequences hand out 1, 2, 3, ... in order of calls.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: BTreeMap<String, Vec<Document>>,
    sequences: RefCell<BTreeMap<String, i64>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with the given documents, replacing any table of the
    /// same name.
    pub fn with_table(mut self, name: impl Into<String>, docs: impl IntoIterator<Item = Document>) -> Self {
        self.tables.insert(name.into(), docs.into_iter().collect());
        self
    }

    /// Add a table whose documents are given as JSON objects.
    pub fn with_json_table(self, name: impl Into<String>, docs: &[&str]) -> ValueResult<Self> {
        let docs = docs
            .iter()
            .map(|json| Document::from_json_str(json))
            .collect::<ValueResult<Vec<_>>>()?;
        Ok(self.with_table(name, docs))
    }

    pub fn with_sequence(self, name: impl Into<String>) -> Self {
        self.sequences.borrow_mut().insert(name.into(), 0);
        self
    }

    /// Create an empty table if it does not exist yet.
    pub fn create_table(&mut self, name: impl Into<String>) {
        self.tables.entry(name.into()).or_default();
    }

    /// Append a document to a table, creating the table if needed.
    pub fn insert(&mut self, table: &str, doc: Document) {
        self.tables.entry(table.to_string()).or_default().push(doc);
    }

    pub fn table(&self, name: &str) -> Option<&[Document]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    /// The last value handed out by a sequence, 0 if none yet.
    pub fn sequence_value(&self, name: &str) -> Option<i64> {
        self.sequences.borrow().get(name).copied()
    }
}

impl Catalog for MemoryCatalog {
    fn scan(&self, table: &str) -> EvalResult<DocumentScan<'_>> {
        let docs = self
            .tables
            .get(table)
            .ok_or_else(|| EvalError::unknown_table(table))?;
        trace!(table, documents = docs.len(), "memory scan");
        Ok(Box::new(docs.iter().cloned().map(Ok)))
    }

    fn next_sequence_value(&self, sequence: &str) -> EvalResult<i64> {
        let mut sequences = self.sequences.borrow_mut();
        let current = sequences
            .get_mut(sequence)
            .ok_or_else(|| EvalError::unknown_sequence(sequence))?;
        *current = current
            .checked_add(1)
            .ok_or_else(|| EvalError::storage(format!("sequence {} is exhausted", sequence)))?;
        Ok(*current)
    }
}
