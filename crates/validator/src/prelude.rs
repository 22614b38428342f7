//! Prelude module for convenient imports.
//!
//! ```rust
//! use strata_validator::prelude::*;
//! ```

pub use crate::combinators::SchemaExt;
pub use crate::error::ParseError;
pub use crate::issue::{CustomError, Issue, IssueKind, PathSegment};
pub use crate::node::{
    ObjectSchema, Schema, array, bigint, boolean, literal, nothing, null, number, record, string,
    undefined, union, unknown,
};
// Brings in both the `object` constructor and the `object!` macro.
pub use crate::object;
pub use crate::options::{ParseMode, ParseOptions};
pub use crate::value::{Map, Value};
