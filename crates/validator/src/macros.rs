//! Declarative shorthand for object schemas.

/// Builds an [`ObjectSchema`](crate::ObjectSchema) from `key => schema` pairs.
///
/// Each value goes through `Schema::from`, so plain schemas and nested
/// object schemas mix freely:
///
/// ```rust
/// use strata_validator::prelude::*;
///
/// let user = object! {
///     "name" => string(),
///     "address" => object! { "city" => string() },
///     "tags" => array(string()).optional(),
/// };
/// assert_eq!(user.shape().fields().count(), 3);
/// ```
#[macro_export]
macro_rules! object {
    () => {
        $crate::object(::std::iter::empty::<(&str, $crate::Schema)>())
    };
    ($($key:expr => $schema:expr),+ $(,)?) => {
        $crate::object([$(($key, $crate::Schema::from($schema))),+])
    };
}

#[cfg(test)]
mod tests {
    use crate::{SchemaExt, Value, number, string};

    #[test]
    fn builds_object_in_order() {
        let schema = object! {
            "b" => number(),
            "a" => string().optional(),
        };
        let keys: Vec<&str> = schema.shape().fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(schema.parse(&Value::object([("b", Value::from(1))])).is_ok());
    }

    #[test]
    fn empty_object() {
        let schema = object! {};
        assert_eq!(schema.shape().fields().count(), 0);
    }
}
