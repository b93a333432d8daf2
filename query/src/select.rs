//! SELECT compilation.
//!
//! A `SelectCoreStmt` is one `SELECT ... FROM ... WHERE ... GROUP BY ...`
//! block. A `SelectStmt` is a compound chain of cores followed by the
//! ORDER BY, OFFSET and LIMIT modifiers that apply to the whole chain.

use tessera_core::{cast_as_integer, Path};
use tessera_expr::{AggregateCall, Environment, Expr};
use tessera_stream::{Operator, Stream};
use tracing::{debug, trace};

use crate::{CompoundSelectStmt, QueryError, QueryResult, StreamStmt};

/// A single SELECT block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectCoreStmt {
    /// `None` for a SELECT without FROM.
    pub table_name: Option<String>,
    pub distinct: bool,
    pub where_expr: Option<Expr>,
    pub group_by_expr: Option<Expr>,
    /// Projected expressions, normally each wrapped in `Expr::Named`.
    pub projection_exprs: Vec<Expr>,
}

impl SelectCoreStmt {
    pub fn new(projection_exprs: Vec<Expr>) -> Self {
        Self {
            projection_exprs,
            ..Default::default()
        }
    }

    pub fn from_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = Some(table.into());
        self
    }

    pub fn with_where(mut self, predicate: Expr) -> Self {
        self.where_expr = Some(predicate);
        self
    }

    pub fn with_group_by(mut self, key: Expr) -> Self {
        self.group_by_expr = Some(key);
        self
    }

    pub fn with_distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Compile into a stream and its read-only flag.
    pub fn to_stream(&self) -> QueryResult<StreamStmt> {
        let mut stream = match &self.table_name {
            Some(table) => Stream::new(Operator::seq_scan(table.as_str())),
            None => Stream::empty(),
        };

        if let Some(predicate) = &self.where_expr {
            stream = stream.pipe(Operator::Filter(predicate.clone()));
        }

        let mut projections = self.projection_exprs.clone();
        match &self.group_by_expr {
            Some(key) => {
                let aggregators = resolve_grouping(key, &mut projections)?;
                stream = stream
                    .pipe(Operator::Sort(key.clone()))
                    .pipe(Operator::group_aggregate(Some(key.clone()), aggregators));
            }
            None => {
                let aggregators: Vec<AggregateCall> = projections
                    .iter()
                    .filter(|e| matches!(e, Expr::Named(_)))
                    .filter_map(|e| e.as_aggregator().cloned())
                    .collect();
                if !aggregators.is_empty() {
                    stream = stream.pipe(Operator::group_aggregate(None, aggregators));
                }
            }
        }

        if self.table_name.is_none() && projections.iter().any(Expr::references_document) {
            return Err(QueryError::NoTablesSpecified);
        }

        let read_only = !projections.iter().any(Expr::requires_write);
        stream = stream.pipe(Operator::Project(projections));

        if self.distinct {
            stream = Stream::new(Operator::Union(vec![stream]));
        }

        debug!(stream = %stream, read_only, "select core compiled");
        Ok(StreamStmt::new(stream, read_only))
    }
}

/// Collect the aggregators of a GROUP BY query and point projections of
/// the key at the grouped output field.
fn resolve_grouping(key: &Expr, projections: &mut [Expr]) -> QueryResult<Vec<AggregateCall>> {
    let mut aggregators = Vec::new();

    for projection in projections.iter_mut() {
        let named = match projection {
            Expr::Named(named) => named,
            other => return Err(QueryError::invalid_group_by_projection(other.to_string())),
        };

        if let Some(call) = named.expr.as_aggregator() {
            trace!(projection = %named.name, "projection is an aggregator");
            aggregators.push(call.clone());
            continue;
        }

        if named.expr.as_ref() == key {
            // The grouping stage stores the key under its rendering.
            trace!(projection = %named.name, "projection reads the group key");
            *named.expr = Expr::path(Path::field(key.to_string()));
            continue;
        }

        return Err(QueryError::invalid_group_by_projection(named.name.as_str()));
    }

    Ok(aggregators)
}

/// Sort direction of ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// A full SELECT statement: a compound chain plus modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub compound: CompoundSelectStmt,
    pub order_by: Option<Path>,
    pub order_direction: OrderDirection,
    pub offset_expr: Option<Expr>,
    pub limit_expr: Option<Expr>,
}

impl SelectStmt {
    pub fn new(compound: CompoundSelectStmt) -> Self {
        Self {
            compound,
            order_by: None,
            order_direction: OrderDirection::Asc,
            offset_expr: None,
            limit_expr: None,
        }
    }

    pub fn with_order_by(mut self, path: Path, direction: OrderDirection) -> Self {
        self.order_by = Some(path);
        self.order_direction = direction;
        self
    }

    pub fn with_offset(mut self, offset: Expr) -> Self {
        self.offset_expr = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: Expr) -> Self {
        self.limit_expr = Some(limit);
        self
    }

    /// Compile into a stream. The read-only flag is the compound chain's.
    pub fn to_stream(&self) -> QueryResult<StreamStmt> {
        let compound = self.compound.to_stream()?;
        let mut stream = compound.stream;

        if let Some(path) = &self.order_by {
            let key = Expr::path(path.clone());
            stream = stream.pipe(match self.order_direction {
                OrderDirection::Asc => Operator::Sort(key),
                OrderDirection::Desc => Operator::SortReverse(key),
            });
        }

        if let Some(offset) = &self.offset_expr {
            stream = stream.pipe(Operator::Skip(eval_count("offset", offset)?));
        }

        if let Some(limit) = &self.limit_expr {
            stream = stream.pipe(Operator::Take(eval_count("limit", limit)?));
        }

        debug!(stream = %stream, read_only = compound.read_only, "select compiled");
        Ok(StreamStmt::new(stream, compound.read_only))
    }
}

impl From<SelectCoreStmt> for SelectStmt {
    fn from(core: SelectCoreStmt) -> Self {
        SelectStmt::new(CompoundSelectStmt::new(core))
    }
}

/// Evaluate an OFFSET or LIMIT expression once, without a document.
fn eval_count(clause: &'static str, expr: &Expr) -> QueryResult<u64> {
    let value = expr.eval(&Environment::new())?;
    if !value.is_number() {
        return Err(QueryError::NotANumber {
            clause,
            found: value.value_type(),
        });
    }

    let count = cast_as_integer(&value)?;
    u64::try_from(count).map_err(|_| QueryError::NegativeCount {
        clause,
        value: count,
    })
}
