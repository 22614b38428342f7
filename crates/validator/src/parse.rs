//! Parse entry points.

use crate::compile::Outcome;
use crate::error::ParseError;
use crate::node::Schema;
use crate::options::{ParseMode, ParseOptions};
use crate::value::Value;

impl Schema {
    /// Validates `value` in strict mode.
    ///
    /// Returns the input itself (same reference) when nothing was
    /// transformed.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] carrying every issue found.
    pub fn parse(&self, value: &Value) -> Result<Value, ParseError> {
        self.parse_with(value, &ParseOptions::default())
    }

    /// Validates `value` with explicit options.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] carrying every issue found.
    pub fn parse_with(&self, value: &Value, options: &ParseOptions) -> Result<Value, ParseError> {
        self.validate(value, options.mode)
            .into_result(value)
            .map_err(ParseError::new)
    }

    /// Convenience check that discards the output.
    #[must_use]
    pub fn is_valid(&self, value: &Value, mode: ParseMode) -> bool {
        !matches!(self.validate(value, mode), Outcome::Invalid(_))
    }
}

/// Free-function form of [`Schema::parse_with`].
///
/// # Errors
///
/// Returns a [`ParseError`] carrying every issue found.
pub fn parse(schema: &Schema, value: &Value, options: &ParseOptions) -> Result<Value, ParseError> {
    schema.parse_with(value, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueKind;
    use crate::node::{array, number, object, string};
    use crate::value::{BaseType, Map};

    fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
        Value::from(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<Map>(),
        )
    }

    #[test]
    fn primitive_mismatch() {
        let err = number().parse(&Value::from("x")).unwrap_err();
        assert_eq!(
            err.issues()[0].kind,
            IssueKind::InvalidType {
                expected: vec![BaseType::Number]
            }
        );
        assert_eq!(err.to_string(), "invalid_type at . (expected number)");
    }

    #[test]
    fn valid_input_is_returned_as_is() {
        let schema = object([("a", array(string()))]);
        let input = map([("a", Value::from(vec![Value::from("x")]))]);
        let output = schema.parse(&input).unwrap();
        assert!(output.ptr_eq(&input));
    }

    #[test]
    fn options_select_the_mode() {
        let schema = object([("a", number())]);
        let input = map([("a", Value::from(1)), ("b", Value::from(2))]);
        assert!(schema.parse(&input).is_err());
        assert!(schema.parse_with(&input, &ParseOptions::passthrough()).is_ok());
        assert!(parse(&schema, &input, &ParseOptions::strip()).is_ok());
        assert!(schema.is_valid(&input, ParseMode::Passthrough));
        assert!(!schema.is_valid(&input, ParseMode::Strict));
    }
}
