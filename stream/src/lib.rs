//! Tessera Streams
//!
//! A stream is an ordered chain of operator stages. Execution is
//! push-style: the source stage produces documents and hands each one,
//! wrapped in an `Environment`, to the stages after it. A callback may
//! stop the run early by returning `ControlFlow::Break`.
//!
//! Sort and GroupAggregate buffer their whole input before emitting;
//! Union keeps the set of documents it has already emitted. All other
//! stages are streaming.

mod catalog;
mod error;
mod exec;
mod operator;
mod stream;

pub use catalog::MemoryCatalog;
pub use error::{StreamError, StreamResult};
pub use operator::Operator;
pub use stream::Stream;

pub use tessera_expr::{Environment, ExecutionConfig, ExecutionContext, Interrupt};
