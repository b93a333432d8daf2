//! Tessera Query
//!
//! Compile SELECT statements into streams.
//!
//! Responsibilities:
//! - Compile a single SELECT core (scan, filter, grouping, projection)
//! - Validate GROUP BY projections and FROM-less queries
//! - Fold UNION / UNION ALL chains into union and concat stages
//! - Apply ORDER BY, OFFSET and LIMIT
//! - Classify compiled statements as read-only or read-write
//! - Run compiled statements against an execution context

mod compound;
mod error;
mod select;
mod statement;

pub use compound::{CompoundOperator, CompoundSelectStmt};
pub use error::{ErrorKind, QueryError, QueryResult};
pub use select::{OrderDirection, SelectCoreStmt, SelectStmt};
pub use statement::{Statement, StreamStmt};
