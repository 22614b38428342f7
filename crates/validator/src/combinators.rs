//! Per-schema combinators.
//!
//! [`SchemaExt`] is implemented for everything convertible into a [`Schema`],
//! so combinators chain directly off constructors:
//!
//! ```rust
//! use strata_validator::prelude::*;
//!
//! let port = number()
//!     .assert(|v| v.as_f64().is_some_and(|n| n.fract() == 0.0 && (1.0..=65535.0).contains(&n)))
//!     .with_default(8080);
//!
//! let config = object! { "port" => port };
//! let parsed = config.parse(&Value::from(Map::new())).unwrap();
//! assert_eq!(parsed.get("port").and_then(Value::as_f64), Some(8080.0));
//! ```

use std::sync::Arc;

use crate::issue::CustomError;
use crate::node::{NodeKind, Schema, Transform, TransformFn, Transformed, null, union};
use crate::value::Value;

/// Extension methods for composing schemas.
pub trait SchemaExt: Into<Schema> + Sized {
    /// Accepts `undefined` or an absent object key in addition to the inner
    /// schema.
    #[must_use = "builder methods must be chained or built"]
    fn optional(self) -> Schema {
        Schema::new(NodeKind::Optional(self.into()))
    }

    /// Accepts `null` in addition to the inner schema.
    #[must_use = "builder methods must be chained or built"]
    fn nullable(self) -> Schema {
        union([null(), self.into()])
    }

    /// Fails with a message-less `custom_error` when `predicate` rejects the
    /// validated value.
    #[must_use = "builder methods must be chained or built"]
    fn assert<F>(self, predicate: F) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.assert_with(predicate, CustomError::new())
    }

    /// Like [`assert`](Self::assert) with an explicit error (message and/or
    /// path suffix).
    #[must_use = "builder methods must be chained or built"]
    fn assert_with<F>(self, predicate: F, error: impl Into<CustomError>) -> Schema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let error = error.into();
        transform(self.into(), Arc::new(move |value: &Value| {
            if predicate(value) {
                Transformed::Unchanged
            } else {
                Transformed::Failed(error.clone())
            }
        }))
    }

    /// Maps the validated value. Returning a value identical to the input
    /// keeps the output reference unchanged.
    #[must_use = "builder methods must be chained or built"]
    fn apply<F>(self, map: F) -> Schema
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        transform(self.into(), Arc::new(move |value: &Value| Transformed::Value(map(value))))
    }

    /// Maps the validated value with a fallible function.
    #[must_use = "builder methods must be chained or built"]
    fn chain<F>(self, map: F) -> Schema
    where
        F: Fn(&Value) -> Result<Value, CustomError> + Send + Sync + 'static,
    {
        transform(self.into(), Arc::new(move |value: &Value| match map(value) {
            Ok(new) => Transformed::Value(new),
            Err(error) => Transformed::Failed(error),
        }))
    }

    /// Optional schema that substitutes `default` for `undefined` or a
    /// missing key. An injected key lands after the closest earlier declared
    /// key of its object.
    #[must_use = "builder methods must be chained or built"]
    fn with_default(self, default: impl Into<Value>) -> Schema {
        let default = default.into();
        transform(self.optional(), Arc::new(move |value: &Value| {
            if value.is_undefined() {
                Transformed::Value(default.clone())
            } else {
                Transformed::Unchanged
            }
        }))
    }
}

impl<T: Into<Schema>> SchemaExt for T {}

fn transform(inner: Schema, func: TransformFn) -> Schema {
    Schema::new(NodeKind::Transform(Transform { inner, func }))
}

// ============================================================================
// TESTS
// ============================================================================
