//! Schema nodes.
//!
//! A [`Schema`] is a cheap, clonable handle to an immutable node. Nodes form a
//! finite acyclic tree; children are shared through `Arc`, so the same
//! sub-schema can appear in many parents and be validated from many threads.
//!
//! Each node lazily compiles itself on first use (see [`crate::compile`]) and
//! keeps the compiled form for its whole lifetime.

use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use crate::compile::Compiled;
use crate::issue::CustomError;
use crate::value::{BaseType, Literal, Value};

// ============================================================================
// TRANSFORM FUNCTIONS
// ============================================================================

/// Result of a user callback attached with `apply`, `assert` or `chain`.
#[derive(Debug, Clone)]
pub(crate) enum Transformed {
    Unchanged,
    Value(Value),
    Failed(CustomError),
}

pub(crate) type TransformFn = Arc<dyn Fn(&Value) -> Transformed + Send + Sync>;

// ============================================================================
// NODE KINDS
// ============================================================================

/// The closed set of schema node kinds.
pub enum NodeKind {
    /// Accepts only an absent object key.
    Nothing,
    /// Accepts any value.
    Unknown,
    String,
    Number,
    BigInt,
    Boolean,
    Undefined,
    Null,
    Literal(Literal),
    Object(ObjectShape),
    Array(Schema),
    Union(Vec<Schema>),
    Optional(Schema),
    Transform(Transform),
}

impl NodeKind {
    /// Classification tag of the node.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Unknown => "unknown",
            Self::String => "string",
            Self::Number => "number",
            Self::BigInt => "bigint",
            Self::Boolean => "boolean",
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Literal(_) => "literal",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Union(_) => "union",
            Self::Optional(_) => "optional",
            Self::Transform(_) => "transform",
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => f.debug_tuple("Literal").field(literal).finish(),
            Self::Object(shape) => f.debug_tuple("Object").field(shape).finish(),
            Self::Array(item) => f.debug_tuple("Array").field(item).finish(),
            Self::Union(options) => f.debug_tuple("Union").field(options).finish(),
            Self::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Self::Transform(transform) => {
                f.debug_tuple("Transform").field(&transform.inner).finish()
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Declared fields of an object schema plus an optional rest schema.
#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    pub(crate) fields: IndexMap<String, Schema>,
    pub(crate) rest: Option<Schema>,
}

impl ObjectShape {
    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Schema> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn rest(&self) -> Option<&Schema> {
        self.rest.as_ref()
    }
}

/// Inner schema plus the callback run on its successful output.
pub struct Transform {
    pub(crate) inner: Schema,
    pub(crate) func: TransformFn,
}

impl Transform {
    #[must_use]
    pub fn inner(&self) -> &Schema {
        &self.inner
    }
}

// ============================================================================
// TERMINALS
// ============================================================================

/// Leaf classification reachable from a node through optional, union and
/// transform wrappers.
#[derive(Debug, Clone, Copy)]
pub enum Terminal<'a> {
    Nothing,
    Unknown,
    Base(BaseType),
    Literal(&'a Literal),
    Object(&'a ObjectShape),
}

// ============================================================================
// SCHEMA
// ============================================================================

pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) compiled: OnceLock<Compiled>,
}

/// Handle to an immutable schema node.
#[derive(Clone)]
pub struct Schema {
    pub(crate) node: Arc<Node>,
}

impl Schema {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            node: Arc::new(Node {
                kind,
                compiled: OnceLock::new(),
            }),
        }
    }

    /// The node's kind.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.node.kind
    }

    /// Classification tag, e.g. `"object"` or `"union"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.node.kind.name()
    }

    /// True when both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Appends every terminal reachable from this node to `acc`.
    pub fn enumerate_terminals<'a>(&'a self, acc: &mut Vec<Terminal<'a>>) {
        match &self.node.kind {
            NodeKind::Nothing => acc.push(Terminal::Nothing),
            NodeKind::Unknown => acc.push(Terminal::Unknown),
            NodeKind::String => acc.push(Terminal::Base(BaseType::String)),
            NodeKind::Number => acc.push(Terminal::Base(BaseType::Number)),
            NodeKind::BigInt => acc.push(Terminal::Base(BaseType::BigInt)),
            NodeKind::Boolean => acc.push(Terminal::Base(BaseType::Boolean)),
            NodeKind::Undefined => acc.push(Terminal::Base(BaseType::Undefined)),
            NodeKind::Null => acc.push(Terminal::Base(BaseType::Null)),
            NodeKind::Literal(literal) => acc.push(Terminal::Literal(literal)),
            NodeKind::Object(shape) => acc.push(Terminal::Object(shape)),
            NodeKind::Array(_) => acc.push(Terminal::Base(BaseType::Array)),
            NodeKind::Union(options) => {
                for option in options {
                    option.enumerate_terminals(acc);
                }
            }
            NodeKind::Optional(inner) => {
                acc.push(Terminal::Nothing);
                acc.push(Terminal::Base(BaseType::Undefined));
                inner.enumerate_terminals(acc);
            }
            NodeKind::Transform(transform) => transform.inner.enumerate_terminals(acc),
        }
    }

    /// Collected terminals of this node.
    #[must_use]
    pub fn terminals(&self) -> Vec<Terminal<'_>> {
        let mut acc = Vec::new();
        self.enumerate_terminals(&mut acc);
        acc
    }

    /// Whether an enclosing object may omit the key holding this schema.
    pub(crate) fn accepts_missing(&self) -> bool {
        self.terminals()
            .iter()
            .any(|terminal| matches!(terminal, Terminal::Nothing))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.node.kind, f)
    }
}

// ============================================================================
// OBJECT SCHEMA BUILDER
// ============================================================================

/// An object schema with object-specific builder methods.
///
/// Dereferences to [`Schema`], so it can be parsed directly; convert with
/// `Schema::from` (or `.into()`) to place it in a shape or union.
#[derive(Clone)]
pub struct ObjectSchema {
    schema: Schema,
}

impl ObjectSchema {
    pub(crate) fn from_shape(shape: ObjectShape) -> Self {
        Self {
            schema: Schema::new(NodeKind::Object(shape)),
        }
    }

    /// The declared shape.
    #[must_use]
    pub fn shape(&self) -> &ObjectShape {
        match &self.schema.node.kind {
            NodeKind::Object(shape) => shape,
            _ => unreachable!("ObjectSchema always wraps an object node"),
        }
    }

    fn rebuild(&self, edit: impl FnOnce(&mut ObjectShape)) -> Self {
        let mut shape = self.shape().clone();
        edit(&mut shape);
        Self::from_shape(shape)
    }

    /// Validates every undeclared key against `schema` instead of applying
    /// the parse mode.
    #[must_use]
    pub fn rest(&self, schema: impl Into<Schema>) -> Self {
        let rest = schema.into();
        self.rebuild(|shape| shape.rest = Some(rest))
    }

    /// Makes every declared field optional.
    #[must_use]
    pub fn partial(&self) -> Self {
        self.rebuild(|shape| {
            for field in shape.fields.values_mut() {
                *field = Schema::new(NodeKind::Optional(field.clone()));
            }
        })
    }

    /// Adds (or replaces) fields.
    #[must_use]
    pub fn extend<K, I>(&self, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        self.rebuild(|shape| {
            for (key, schema) in fields {
                shape.fields.insert(key.into(), schema);
            }
        })
    }

    /// Keeps only the listed fields.
    #[must_use]
    pub fn pick(&self, keys: &[&str]) -> Self {
        self.rebuild(|shape| shape.fields.retain(|key, _| keys.contains(&key.as_str())))
    }

    /// Drops the listed fields.
    #[must_use]
    pub fn omit(&self, keys: &[&str]) -> Self {
        self.rebuild(|shape| shape.fields.retain(|key, _| !keys.contains(&key.as_str())))
    }

    #[must_use]
    pub fn into_schema(self) -> Schema {
        self.schema
    }
}

impl std::ops::Deref for ObjectSchema {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        &self.schema
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        object.schema
    }
}

impl fmt::Debug for ObjectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.schema, f)
    }
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

/// Accepts only an absent object key.
#[must_use]
pub fn nothing() -> Schema {
    Schema::new(NodeKind::Nothing)
}

/// Accepts any value unchanged.
#[must_use]
pub fn unknown() -> Schema {
    Schema::new(NodeKind::Unknown)
}

#[must_use]
pub fn string() -> Schema {
    Schema::new(NodeKind::String)
}

#[must_use]
pub fn number() -> Schema {
    Schema::new(NodeKind::Number)
}

#[must_use]
pub fn bigint() -> Schema {
    Schema::new(NodeKind::BigInt)
}

#[must_use]
pub fn boolean() -> Schema {
    Schema::new(NodeKind::Boolean)
}

#[must_use]
pub fn undefined() -> Schema {
    Schema::new(NodeKind::Undefined)
}

#[must_use]
pub fn null() -> Schema {
    Schema::new(NodeKind::Null)
}

/// Accepts exactly `value`.
pub fn literal(value: impl Into<Literal>) -> Schema {
    Schema::new(NodeKind::Literal(value.into()))
}

/// An object with the given fields, in declaration order.
///
/// Later duplicates replace earlier ones but keep the first position.
pub fn object<K, I>(fields: I) -> ObjectSchema
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Schema)>,
{
    ObjectSchema::from_shape(ObjectShape {
        fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        rest: None,
    })
}

/// An object of arbitrary keys whose values all match `values`.
pub fn record(values: impl Into<Schema>) -> ObjectSchema {
    ObjectSchema::from_shape(ObjectShape {
        fields: IndexMap::new(),
        rest: Some(values.into()),
    })
}

/// An array whose every element matches `item`.
pub fn array(item: impl Into<Schema>) -> Schema {
    Schema::new(NodeKind::Array(item.into()))
}

/// Accepts a value matching any of `options`, preferring earlier ones.
pub fn union<I>(options: I) -> Schema
where
    I: IntoIterator<Item = Schema>,
{
    Schema::new(NodeKind::Union(options.into_iter().collect()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names(schema: &Schema) -> Vec<String> {
        schema
            .terminals()
            .iter()
            .map(|terminal| match terminal {
                Terminal::Nothing => "nothing".to_owned(),
                Terminal::Unknown => "unknown".to_owned(),
                Terminal::Base(base) => base.to_string(),
                Terminal::Literal(literal) => literal.to_string(),
                Terminal::Object(_) => "object".to_owned(),
            })
            .collect()
    }

    #[test]
    fn primitive_terminals() {
        assert_eq!(names(&string()), vec!["string"]);
        assert_eq!(names(&literal("a")), vec!["\"a\""]);
        assert_eq!(names(&array(number())), vec!["array"]);
        assert_eq!(names(&object([("a", number())])), vec!["object"]);
    }

    #[test]
    fn wrappers_are_transparent() {
        let schema = union([
            string(),
            Schema::new(NodeKind::Optional(union([literal(1), null()]))),
        ]);
        assert_eq!(
            names(&schema),
            vec!["string", "nothing", "undefined", "1", "null"]
        );
    }

    #[test]
    fn missing_acceptance() {
        assert!(nothing().accepts_missing());
        assert!(Schema::new(NodeKind::Optional(number())).accepts_missing());
        assert!(!undefined().accepts_missing());
        assert!(!unknown().accepts_missing());
    }

    #[test]
    fn object_builders_do_not_mutate() {
        let base = object([("a", number()), ("b", string())]);
        let picked = base.pick(&["a"]);
        let omitted = base.omit(&["a"]);
        let extended = base.extend([("c", boolean())]);

        assert_eq!(base.shape().fields.len(), 2);
        assert_eq!(picked.shape().fields().map(|(k, _)| k).collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(omitted.shape().fields().map(|(k, _)| k).collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(extended.shape().fields.len(), 3);
        assert!(base.partial().shape().fields.values().all(Schema::accepts_missing));
    }

    #[test]
    fn record_has_rest_only() {
        let schema = record(number());
        assert!(schema.shape().fields.is_empty());
        assert_eq!(schema.shape().rest().map(Schema::name), Some("number"));
    }

    #[test]
    fn schemas_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
        assert_send_sync::<ObjectSchema>();
    }
}
