//! Parse configuration.
//!
//! [`ParseOptions`] is plain serde data so a host application can embed it
//! in its own configuration file:
//!
//! ```toml
//! [validation]
//! mode = "strip"
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownParseMode;

/// Policy for object keys that are not part of the declared shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Keep undeclared keys in the output.
    Passthrough,
    /// Reject the first undeclared key with `unrecognized_key`.
    #[default]
    Strict,
    /// Drop undeclared keys from the output.
    Strip,
}

impl ParseMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Strict => "strict",
            Self::Strip => "strip",
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParseMode {
    type Err = UnknownParseMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passthrough" => Ok(Self::Passthrough),
            "strict" => Ok(Self::Strict),
            "strip" => Ok(Self::Strip),
            other => Err(UnknownParseMode {
                value: other.to_owned(),
            }),
        }
    }
}

/// Options accepted by [`Schema::parse_with`](crate::Schema::parse_with).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub mode: ParseMode,
}

impl ParseOptions {
    #[must_use]
    pub fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub fn passthrough() -> Self {
        Self::new(ParseMode::Passthrough)
    }

    #[must_use]
    pub fn strict() -> Self {
        Self::new(ParseMode::Strict)
    }

    #[must_use]
    pub fn strip() -> Self {
        Self::new(ParseMode::Strip)
    }
}

impl From<ParseMode> for ParseOptions {
    fn from(mode: ParseMode) -> Self {
        Self::new(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("passthrough", ParseMode::Passthrough)]
    #[case("strict", ParseMode::Strict)]
    #[case("strip", ParseMode::Strip)]
    fn mode_round_trips_through_strings(#[case] text: &str, #[case] mode: ParseMode) {
        assert_eq!(text.parse::<ParseMode>().unwrap(), mode);
        assert_eq!(mode.to_string(), text);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "lenient".parse::<ParseMode>().unwrap_err();
        assert_eq!(err.value, "lenient");
        assert!(err.to_string().contains("lenient"));
    }

    #[test]
    fn defaults_to_strict() {
        assert_eq!(ParseOptions::default().mode, ParseMode::Strict);
        let parsed: ParseOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ParseOptions::strict());
    }

    #[test]
    fn deserializes_lowercase_modes() {
        let parsed: ParseOptions = serde_json::from_str(r#"{"mode":"strip"}"#).unwrap();
        assert_eq!(parsed.mode, ParseMode::Strip);
        assert!(serde_json::from_str::<ParseOptions>(r#"{"mode":"Strip"}"#).is_err());
    }
}
