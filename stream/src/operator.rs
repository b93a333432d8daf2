//! Operator stages.

use std::fmt;

use tessera_core::Path;
use tessera_expr::{AggregateCall, Expr};

use crate::Stream;

/// One stage of a stream.
///
/// Sources (`SeqScan`, `DocsEmit`, `Union`, `Concat`) produce documents and
/// belong at the head of a stream; any stages before a source are not run.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Every document of a table, in storage order.
    SeqScan(String),
    /// Documents for which the predicate is truthy.
    Filter(Expr),
    /// A new document per input, one field per expression.
    Project(Vec<Expr>),
    /// Ascending stable sort on the key.
    Sort(Expr),
    /// Descending stable sort on the key.
    SortReverse(Expr),
    Skip(u64),
    Take(u64),
    /// One output document per run of adjacent equal keys.
    GroupAggregate {
        key: Option<Expr>,
        aggregators: Vec<AggregateCall>,
    },
    /// Branch outputs in order, dropping documents already emitted.
    Union(Vec<Stream>),
    /// Branch outputs in order.
    Concat(Vec<Stream>),
    PathsSet(Path, Expr),
    PathsUnset(Path),
    /// Documents given as expressions, evaluated in the input environment.
    DocsEmit(Vec<Expr>),
}

impl Operator {
    pub fn seq_scan(table: impl Into<String>) -> Self {
        Operator::SeqScan(table.into())
    }

    pub fn group_aggregate(key: Option<Expr>, aggregators: Vec<AggregateCall>) -> Self {
        Operator::GroupAggregate { key, aggregators }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::SeqScan(table) => write!(f, "table.Scan({})", Path::field(table.as_str())),
            Operator::Filter(e) => write!(f, "docs.Filter({})", e),
            Operator::Project(exprs) => {
                write!(f, "docs.Project(")?;
                write_joined(f, exprs)?;
                write!(f, ")")
            }
            Operator::Sort(e) => write!(f, "docs.Sort({})", e),
            Operator::SortReverse(e) => write!(f, "docs.SortReverse({})", e),
            Operator::Skip(n) => write!(f, "docs.Skip({})", n),
            Operator::Take(n) => write!(f, "docs.Take({})", n),
            Operator::GroupAggregate { key, aggregators } => {
                write!(f, "docs.GroupAggregate(")?;
                match key {
                    Some(key) => write!(f, "{}", key)?,
                    None => write!(f, "NULL")?,
                }
                for agg in aggregators {
                    write!(f, ", {}", agg)?;
                }
                write!(f, ")")
            }
            Operator::Union(streams) => {
                write!(f, "union(")?;
                write_joined(f, streams)?;
                write!(f, ")")
            }
            Operator::Concat(streams) => {
                write!(f, "concat(")?;
                write_joined(f, streams)?;
                write!(f, ")")
            }
            Operator::PathsSet(path, e) => write!(f, "paths.Set({}, {})", path, e),
            Operator::PathsUnset(path) => write!(f, "paths.Unset({})", path),
            Operator::DocsEmit(exprs) => {
                write!(f, "docs.Emit(")?;
                write_joined(f, exprs)?;
                write!(f, ")")
            }
        }
    }
}
