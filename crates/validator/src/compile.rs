//! Compilation and execution of schema nodes.
//!
//! Compiling a node precomputes everything that does not depend on the input:
//! the prebuilt failure for primitive checks, the optional/required split of
//! object fields, the dispatch tables of unions. The compiled form is stored
//! in the node's `OnceLock` and reused by every later validation.

use std::sync::Arc;

use crate::dispatch::UnionMatcher;
use crate::issue::{IssueTree, PathSegment};
use crate::node::{NodeKind, ObjectShape, Schema, Transform, Transformed};
use crate::options::ParseMode;
use crate::value::{BaseType, Map, Value};

// ============================================================================
// OUTCOME
// ============================================================================

/// Raw result of running a compiled schema.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Valid; the output is the input itself.
    Unchanged,
    /// Valid; the output is a new value.
    Changed(Value),
    /// Invalid.
    Invalid(IssueTree),
}

impl Outcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }

    /// Resolves the outcome against the input it was produced from.
    pub fn into_result(self, input: &Value) -> Result<Value, IssueTree> {
        match self {
            Self::Unchanged => Ok(input.clone()),
            Self::Changed(value) => Ok(value),
            Self::Invalid(tree) => Err(tree),
        }
    }
}

// ============================================================================
// FLAGS
// ============================================================================

/// Per-call context threaded through validation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Flags {
    pub(crate) mode: ParseMode,
    /// The value is an absent object key (passed as `Undefined`).
    pub(crate) missing: bool,
}

impl Flags {
    pub(crate) fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            missing: false,
        }
    }

    fn present(self) -> Self {
        Self {
            missing: false,
            ..self
        }
    }

    fn absent(self) -> Self {
        Self {
            missing: true,
            ..self
        }
    }
}

// ============================================================================
// COMPILED FORMS
// ============================================================================

/// Input-independent state derived from a node.
pub(crate) enum Compiled {
    /// Nodes that need nothing beyond their kind.
    Plain,
    /// Primitive or array type check with its prebuilt failure.
    Check(IssueTree),
    Object(ObjectPlan),
    Union(UnionMatcher),
}

pub(crate) struct ObjectPlan {
    invalid_type: IssueTree,
    fields: Vec<FieldPlan>,
}

struct FieldPlan {
    key: Arc<str>,
    schema: Schema,
    optional: bool,
}

impl Schema {
    /// Returns the compiled form, building it on first use.
    pub(crate) fn compiled(&self) -> &Compiled {
        self.node.compiled.get_or_init(|| {
            tracing::trace!(kind = self.name(), "compiling schema node");
            compile(&self.node.kind)
        })
    }

    /// Runs the compiled validation function of this node.
    ///
    /// This is the raw entry point behind [`Schema::parse`]; it never
    /// allocates on success when nothing was transformed.
    #[must_use]
    pub fn validate(&self, value: &Value, mode: ParseMode) -> Outcome {
        self.run(value, Flags::new(mode))
    }

    pub(crate) fn run(&self, value: &Value, flags: Flags) -> Outcome {
        match (&self.node.kind, self.compiled()) {
            (NodeKind::Nothing, Compiled::Check(issue)) => {
                if flags.missing {
                    Outcome::Unchanged
                } else {
                    Outcome::Invalid(issue.clone())
                }
            }
            (NodeKind::Unknown, _) => Outcome::Unchanged,
            (NodeKind::Literal(literal), Compiled::Check(issue)) => {
                if literal.matches(value) {
                    Outcome::Unchanged
                } else {
                    Outcome::Invalid(issue.clone())
                }
            }
            (NodeKind::Object(shape), Compiled::Object(plan)) => plan.run(shape, value, flags),
            (NodeKind::Array(item), Compiled::Check(issue)) => run_array(item, issue, value, flags),
            (NodeKind::Union(options), Compiled::Union(matcher)) => {
                matcher.run(options, value, flags)
            }
            (NodeKind::Optional(inner), _) => {
                if value.is_undefined() || flags.missing {
                    Outcome::Unchanged
                } else {
                    inner.run(value, flags)
                }
            }
            (NodeKind::Transform(transform), _) => run_transform(transform, value, flags),
            (kind, Compiled::Check(issue)) => match base_type_of(kind) {
                Some(expected) if value.base_type() == expected => Outcome::Unchanged,
                _ => Outcome::Invalid(issue.clone()),
            },
            (kind, _) => unreachable!("{} node compiled to a mismatched form", kind.name()),
        }
    }
}

fn base_type_of(kind: &NodeKind) -> Option<BaseType> {
    match kind {
        NodeKind::String => Some(BaseType::String),
        NodeKind::Number => Some(BaseType::Number),
        NodeKind::BigInt => Some(BaseType::BigInt),
        NodeKind::Boolean => Some(BaseType::Boolean),
        NodeKind::Undefined => Some(BaseType::Undefined),
        NodeKind::Null => Some(BaseType::Null),
        NodeKind::Array(_) => Some(BaseType::Array),
        NodeKind::Object(_) => Some(BaseType::Object),
        _ => None,
    }
}

fn compile(kind: &NodeKind) -> Compiled {
    match kind {
        NodeKind::Unknown | NodeKind::Optional(_) | NodeKind::Transform(_) => Compiled::Plain,
        NodeKind::Nothing => {
            Compiled::Check(IssueTree::invalid_type(std::iter::empty::<BaseType>(), None))
        }
        NodeKind::Literal(literal) => {
            Compiled::Check(IssueTree::invalid_literal(vec![literal.clone()], None))
        }
        NodeKind::Object(shape) => Compiled::Object(ObjectPlan::new(shape)),
        NodeKind::Union(options) => Compiled::Union(UnionMatcher::new(options)),
        other => match base_type_of(other) {
            Some(expected) => Compiled::Check(IssueTree::invalid_type([expected], None)),
            None => Compiled::Plain,
        },
    }
}

// ============================================================================
// OBJECTS
// ============================================================================

impl ObjectPlan {
    fn new(shape: &ObjectShape) -> Self {
        Self {
            invalid_type: IssueTree::invalid_type([BaseType::Object], None),
            fields: shape
                .fields
                .iter()
                .map(|(key, schema)| FieldPlan {
                    key: Arc::from(key.as_str()),
                    schema: schema.clone(),
                    optional: schema.accepts_missing(),
                })
                .collect(),
        }
    }

    fn run(&self, shape: &ObjectShape, value: &Value, flags: Flags) -> Outcome {
        let Value::Object(input) = value else {
            return Outcome::Invalid(self.invalid_type.clone());
        };

        let mut issues: Option<IssueTree> = None;
        // (field index, new value), in declaration order
        let mut changed: Vec<(usize, Value)> = Vec::new();
        let mut seen = 0_usize;

        for (index, field) in self.fields.iter().enumerate() {
            let outcome = match input.get(&*field.key) {
                Some(present) => {
                    seen += 1;
                    field.schema.run(present, flags.present())
                }
                None if field.optional => field.schema.run(&Value::Undefined, flags.absent()),
                None => {
                    IssueTree::join_into(&mut issues, IssueTree::missing_key(&field.key));
                    continue;
                }
            };
            match outcome {
                Outcome::Unchanged => {}
                Outcome::Changed(new) => changed.push((index, new)),
                Outcome::Invalid(tree) => IssueTree::join_into(
                    &mut issues,
                    IssueTree::prepend(PathSegment::Key(Arc::clone(&field.key)), tree),
                ),
            }
        }

        let mut rest_changed: Vec<(&str, Value)> = Vec::new();
        let mut strip = false;
        if input.len() > seen {
            let mut extra = input
                .iter()
                .filter(|(key, _)| !shape.fields.contains_key(key.as_str()));
            if let Some(rest) = &shape.rest {
                for (key, item) in extra {
                    match rest.run(item, flags.present()) {
                        Outcome::Unchanged => {}
                        Outcome::Changed(new) => rest_changed.push((key.as_str(), new)),
                        Outcome::Invalid(tree) => IssueTree::join_into(
                            &mut issues,
                            IssueTree::prepend(key.as_str(), tree),
                        ),
                    }
                }
            } else {
                match flags.mode {
                    ParseMode::Passthrough => {}
                    ParseMode::Strict => {
                        if let Some((key, _)) = extra.next() {
                            IssueTree::join_into(&mut issues, IssueTree::unrecognized_key(key));
                        }
                    }
                    ParseMode::Strip => strip = true,
                }
            }
        }

        if let Some(tree) = issues {
            return Outcome::Invalid(tree);
        }

        if strip {
            return Outcome::Changed(Value::Object(Arc::new(
                self.stripped(input, changed),
            )));
        }
        if changed.is_empty() && rest_changed.is_empty() {
            return Outcome::Unchanged;
        }

        let mut output = Map::clone(input);
        for (index, new) in changed {
            let key = &*self.fields[index].key;
            if let Some(slot) = output.get_mut(key) {
                *slot = new;
                continue;
            }
            // Injected key: right after the closest earlier declared key.
            let at = self.fields[..index]
                .iter()
                .rev()
                .find_map(|field| output.get_index_of(&*field.key))
                .map_or(0, |i| i + 1);
            output.shift_insert(at, key.to_owned(), new);
        }
        for (key, new) in rest_changed {
            output.insert(key.to_owned(), new);
        }
        Outcome::Changed(Value::Object(Arc::new(output)))
    }

    /// Declared keys only, in declaration order.
    fn stripped(&self, input: &Map, changed: Vec<(usize, Value)>) -> Map {
        let mut changed = changed.into_iter().peekable();
        let mut output = Map::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            let value = match changed.next_if(|(i, _)| *i == index) {
                Some((_, new)) => Some(new),
                None => input.get(&*field.key).cloned(),
            };
            if let Some(value) = value {
                output.insert(field.key.to_string(), value);
            }
        }
        output
    }
}

// ============================================================================
// ARRAYS
// ============================================================================

fn run_array(item: &Schema, invalid_type: &IssueTree, value: &Value, flags: Flags) -> Outcome {
    let Value::Array(items) = value else {
        return Outcome::Invalid(invalid_type.clone());
    };

    let item_flags = flags.present();
    let mut issues: Option<IssueTree> = None;
    let mut output: Option<Vec<Value>> = None;

    for (index, element) in items.iter().enumerate() {
        match item.run(element, item_flags) {
            Outcome::Unchanged => {}
            Outcome::Changed(new) => {
                if issues.is_none() {
                    output.get_or_insert_with(|| Vec::clone(items))[index] = new;
                }
            }
            Outcome::Invalid(tree) => {
                IssueTree::join_into(&mut issues, IssueTree::prepend(index, tree));
            }
        }
    }

    match (issues, output) {
        (Some(tree), _) => Outcome::Invalid(tree),
        (None, Some(items)) => Outcome::Changed(Value::Array(Arc::new(items))),
        (None, None) => Outcome::Unchanged,
    }
}

// ============================================================================
// TRANSFORMS
// ============================================================================

fn run_transform(transform: &Transform, value: &Value, flags: Flags) -> Outcome {
    let inner = transform.inner.run(value, flags);
    let current = match &inner {
        Outcome::Invalid(_) => return inner,
        Outcome::Unchanged => value,
        Outcome::Changed(new) => new,
    };

    match (transform.func)(current) {
        Transformed::Unchanged => inner,
        Transformed::Value(new) => {
            if new.is_identical(value) {
                Outcome::Unchanged
            } else {
                Outcome::Changed(new)
            }
        }
        Transformed::Failed(error) => Outcome::Invalid(IssueTree::custom(error)),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::node::{literal, number, object, string, union};

    fn address(compiled: &Compiled) -> usize {
        std::ptr::from_ref(compiled).addr()
    }

    fn event() -> Schema {
        union([
            object([("kind", literal("click")), ("x", number())]).into(),
            object([("kind", literal("key")), ("code", string())]).into(),
        ])
    }

    #[test]
    fn compiled_form_is_built_once() {
        let schema = event();
        let first = address(schema.compiled());

        let input = Value::object([("kind", Value::from("key")), ("code", Value::from("Enter"))]);
        assert!(schema.validate(&input, ParseMode::Strict).is_valid());

        assert_eq!(address(schema.compiled()), first);
        assert_eq!(address(schema.clone().compiled()), first);
    }

    #[test]
    fn compiled_form_is_shared_across_threads() {
        let schema = event();
        let addresses: Vec<usize> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| address(schema.compiled())))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(addresses.iter().all(|&a| a == address(schema.compiled())));
    }
}
