//! Tessera Expressions
//!
//! Scalar expressions and the context they are evaluated in.
//!
//! Responsibilities:
//! - Expression tree with canonical rendering and structural equality
//! - Capability queries (aggregator builders, write-requiring nodes)
//! - Evaluation against an `Environment`
//! - Running aggregators for GROUP BY
//! - The `Catalog` seam to storage (table scans, sequences)

mod config;
mod environment;
mod error;
mod eval;
mod expr;
mod functions;

pub use config::ExecutionConfig;
pub use environment::{Catalog, DocumentScan, Environment, ExecutionContext, Interrupt, Param};
pub use error::{EvalError, EvalResult};
pub use expr::{BinaryOp, Expr, NamedExpr, UnaryOp};
pub use functions::{AggregateCall, AggregateFunction, Aggregator, FunctionCall, ScalarFunction};
