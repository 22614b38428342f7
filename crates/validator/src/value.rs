//! Dynamic values validated by schemas.
//!
//! [`Value`] is the untyped data model the engine operates on. Containers are
//! reference counted: cloning a value is O(1), and a schema that accepts its
//! input unchanged hands back the very same allocation, observable through
//! [`Value::ptr_eq`].
//!
//! Object keys keep their insertion order, which makes issue order for
//! undeclared keys deterministic.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Ordered string-keyed map backing [`Value::Object`].
pub type Map = IndexMap<String, Value>;

// ============================================================================
// VALUE
// ============================================================================

/// An untyped input or output value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// An explicitly undefined value (distinct from an absent key).
    #[default]
    Undefined,
    /// `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double precision number.
    Number(f64),
    /// An arbitrary-size integer, kept apart from `Number`.
    BigInt(i128),
    /// A string.
    String(Arc<str>),
    /// An ordered list of values.
    Array(Arc<Vec<Value>>),
    /// A plain object.
    Object(Arc<Map>),
}

impl Value {
    /// Builds an object value from key/value pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Object(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Builds an array value.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::Array(Arc::new(items.into_iter().collect()))
    }

    /// Builds a bigint value.
    #[must_use]
    pub fn bigint(value: i128) -> Self {
        Self::BigInt(value)
    }

    /// Returns the runtime base type of this value.
    #[must_use]
    pub fn base_type(&self) -> BaseType {
        match self {
            Self::Undefined => BaseType::Undefined,
            Self::Null => BaseType::Null,
            Self::Bool(_) => BaseType::Boolean,
            Self::Number(_) => BaseType::Number,
            Self::BigInt(_) => BaseType::BigInt,
            Self::String(_) => BaseType::String,
            Self::Array(_) => BaseType::Array,
            Self::Object(_) => BaseType::Object,
        }
    }

    /// Reference identity for containers.
    ///
    /// Returns `true` only when both values are arrays (or both objects)
    /// sharing the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Strict identity: containers compare by allocation, scalars by value.
    ///
    /// `NaN` is never identical to itself, `-0.0` is identical to `0.0`.
    #[must_use]
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(_), Self::Array(_)) | (Self::Object(_), Self::Object(_)) => {
                self.ptr_eq(other)
            }
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }

    /// Looks up an object key. Returns `None` for non-objects.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Indexes into an array. Returns `None` for non-arrays.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serialize_number(*n, serializer),
            Self::BigInt(n) => serializer.serialize_i128(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => serializer.collect_seq(items.iter()),
            Self::Object(map) => serializer.collect_map(map.iter()),
        }
    }
}

/// Integral numbers serialize as integers so `1` does not come out as `1.0`.
fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::BigInt(n) => write!(f, "{n}n"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(map) => {
                f.write_str("{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        Self::BigInt(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(Arc::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Object(Arc::new(map))
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::String(s) => Self::String(s),
            Literal::Number(n) => Self::Number(n),
            Literal::BigInt(n) => Self::BigInt(n),
            Literal::Boolean(b) => Self::Bool(b),
        }
    }
}

/// JSON numbers become `Number`; JSON never produces `Undefined` or `BigInt`.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::from(s),
            serde_json::Value::Array(items) => {
                Self::Array(Arc::new(items.into_iter().map(Self::from).collect()))
            }
            serde_json::Value::Object(map) => Self::Object(Arc::new(
                map.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            )),
        }
    }
}

// ============================================================================
// BASE TYPE
// ============================================================================

/// Runtime base type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    Object,
    Array,
    String,
    Number,
    BigInt,
    Boolean,
    Null,
    Undefined,
}

impl BaseType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::BigInt => "bigint",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LITERAL
// ============================================================================

/// A literal value a schema can match exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(Arc<str>),
    Number(f64),
    BigInt(i128),
    Boolean(bool),
}

impl Literal {
    #[must_use]
    pub fn base_type(&self) -> BaseType {
        match self {
            Self::String(_) => BaseType::String,
            Self::Number(_) => BaseType::Number,
            Self::BigInt(_) => BaseType::BigInt,
            Self::Boolean(_) => BaseType::Boolean,
        }
    }

    /// Exact equality against a value: `NaN` never matches, `-0` matches `0`.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(a), Value::String(b)) => a == b,
            (Self::Number(a), Value::Number(b)) => a == b,
            (Self::BigInt(a), Value::BigInt(b)) => a == b,
            (Self::Boolean(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }

    pub(crate) fn key(&self) -> LiteralKey {
        match self {
            Self::String(s) => LiteralKey::String(Arc::clone(s)),
            Self::Number(n) => LiteralKey::number(*n),
            Self::BigInt(n) => LiteralKey::BigInt(*n),
            Self::Boolean(b) => LiteralKey::Boolean(*b),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::BigInt(n) => write!(f, "{n}n"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => serialize_number(*n, serializer),
            Self::BigInt(n) => serializer.serialize_i128(*n),
            Self::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i128> for Literal {
    fn from(value: i128) -> Self {
        Self::BigInt(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Hashable form of a literal used by the union dispatch tables.
///
/// Signed zeros share one key and every NaN payload shares one key; the
/// literal node itself still rejects NaN after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum LiteralKey {
    String(Arc<str>),
    Number(u64),
    BigInt(i128),
    Boolean(bool),
}

impl LiteralKey {
    fn number(n: f64) -> Self {
        let canonical = if n == 0.0 {
            0.0_f64
        } else if n.is_nan() {
            f64::NAN
        } else {
            n
        };
        Self::Number(canonical.to_bits())
    }

    /// Key for a runtime value, if the value can equal some literal.
    pub(crate) fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(Arc::clone(s))),
            Value::Number(n) => Some(Self::number(*n)),
            Value::BigInt(n) => Some(Self::BigInt(*n)),
            Value::Bool(b) => Some(Self::Boolean(*b)),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
