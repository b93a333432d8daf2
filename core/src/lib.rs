//! Tessera Core Types
//!
//! This crate provides the foundational types used throughout Tessera:
//! - Values (the `Value` enum over scalars, arrays and documents)
//! - Documents (ordered field-name to value mappings)
//! - Paths (field/index addressing inside a value tree)
//! - Casting rules between value types
//! - Common error types

mod cast;
mod document;
mod error;
mod json;
mod path;
mod value;

pub use cast::*;
pub use document::*;
pub use error::*;
pub use path::*;
pub use value::*;
