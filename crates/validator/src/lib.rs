//! # strata-validator
//!
//! Runtime schema validation for untyped data.
//!
//! Schemas are built from small constructors and combinators, compiled lazily
//! on first use, and then applied to [`Value`]s. Validation either returns the
//! (possibly transformed) value or a [`ParseError`] describing every failure
//! with its path.
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_validator::prelude::*;
//!
//! let event = union([
//!     object! { "kind" => literal("click"), "x" => number(), "y" => number() }.into(),
//!     object! { "kind" => literal("key"), "code" => string() }.into(),
//! ]);
//!
//! let input = Value::object([("kind", Value::from("key")), ("code", Value::from("Enter"))]);
//! assert!(event.parse(&input).is_ok());
//!
//! let err = event.parse(&Value::object([("kind", Value::from("scroll"))])).unwrap_err();
//! assert_eq!(err.to_string(), r#"invalid_literal at .kind (expected "click" or "key")"#);
//! ```
//!
//! ## Unions
//!
//! Unions are analysed once when first used. When every object alternative
//! carries a distinct literal (or base type) at a shared key, the value at
//! that key picks the single alternative to run. Otherwise the value's own
//! base type and literal value select a bucket; only buckets holding more
//! than one alternative are tried in order, and only those wrap their
//! failures in `invalid_union`.
//!
//! ## Parse modes
//!
//! Undeclared object keys are rejected ([`ParseMode::Strict`], the default),
//! dropped ([`ParseMode::Strip`]) or kept ([`ParseMode::Passthrough`]).

mod macros;

mod combinators;
mod compile;
mod dispatch;
mod error;
mod issue;
mod node;
mod options;
mod parse;
pub mod prelude;
mod value;

pub use combinators::SchemaExt;
pub use compile::Outcome;
pub use error::{ParseError, UnknownParseMode};
pub use issue::{CustomError, Issue, IssueKind, IssueTree, PathSegment};
pub use node::{
    NodeKind, ObjectSchema, ObjectShape, Schema, Terminal, Transform, array, bigint, boolean,
    literal, nothing, null, number, object, record, string, undefined, union, unknown,
};
pub use options::{ParseMode, ParseOptions};
pub use parse::parse;
pub use value::{BaseType, Literal, Map, Value};
