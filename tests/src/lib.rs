//! Tessera Tests
//!
//! Scenario-based integration testing: load tables from a JSON fixture,
//! run a list of named statements against them and check each result.
//!
//! ```ignore
//! Scenario::new("orders")
//!     .fixture("shop.json")
//!     .step("count", select(core(vec![count()]).from_table("orders")), |a| {
//!         a.scalar("COUNT(*)", 4)
//!     })
//!     .run()
//!     .unwrap();
//! ```

mod assertion;
mod runner;

pub use assertion::{Assertion, AssertionBuilder, StepOutcome};
pub use error::{ScenarioError, ScenarioResult};
pub use fixture::Fixture;
pub use runner::Runner;
pub use scenario::{Scenario, Step};

/// Build a document from `name => value` pairs, in order.
#[macro_export]
macro_rules! row {
    () => {
        $crate::prelude::Document::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut doc = $crate::prelude::Document::new();
        $(doc.set($name, $crate::prelude::Value::from($value));)+
        doc
    }};
}

pub mod prelude {
    //! Everything a scenario file needs.

    pub use crate::row;
    pub use crate::{AssertionBuilder, Fixture, Scenario};
    pub use tessera_core::{Document, Path, Value};
    pub use tessera_expr::{
        AggregateFunction, BinaryOp, ExecutionConfig, Expr, FunctionCall, Param, ScalarFunction,
    };
    pub use tessera_query::{
        CompoundOperator, CompoundSelectStmt, ErrorKind, OrderDirection, SelectCoreStmt,
        SelectStmt, Statement,
    };

    /// A SELECT core with the given projections.
    pub fn core(projections: Vec<Expr>) -> SelectCoreStmt {
        SelectCoreStmt::new(projections)
    }

    /// A projection of a path, named after the path.
    pub fn col(path: &str) -> Expr {
        match Path::parse(path) {
            Ok(p) => Expr::auto_named(Expr::path(p)),
            Err(e) => panic!("invalid path {:?} in scenario: {}", path, e),
        }
    }

    /// A path expression.
    pub fn field(path: &str) -> Expr {
        match Path::parse(path) {
            Ok(p) => Expr::path(p),
            Err(e) => panic!("invalid path {:?} in scenario: {}", path, e),
        }
    }

    pub fn lit(value: impl Into<Value>) -> Expr {
        Expr::literal(value)
    }

    /// `COUNT(*)` as a projection.
    pub fn count() -> Expr {
        Expr::auto_named(Expr::count_all())
    }

    /// An aggregate projection, named after its rendering.
    pub fn agg(function: AggregateFunction, path: &str) -> Expr {
        Expr::auto_named(Expr::aggregate(function, field(path)))
    }

    /// Wrap a single core into a statement.
    pub fn select(core: SelectCoreStmt) -> SelectStmt {
        SelectStmt::from(core)
    }
}
