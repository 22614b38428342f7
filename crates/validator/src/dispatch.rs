//! Union dispatch.
//!
//! Trying every alternative of a union in turn is correct but linear in the
//! number of alternatives and produces noisy errors. Instead, a union is
//! compiled into dispatch tables derived from its alternatives' terminals:
//!
//! 1. **Object discrimination.** When at least two alternatives are objects,
//!    look for a key shared by all of them whose possible values (base types
//!    or literals) never overlap between alternatives. Object inputs are then
//!    routed by the value found under that key.
//! 2. **Generic discrimination.** Otherwise route by the input's base type,
//!    then by exact literal value. `unknown` alternatives are catch-alls
//!    appended to every bucket; `nothing` alternatives only see absent keys.
//!
//! A bucket holding several alternatives is tried in declaration order and
//! the first success wins. If they all fail, the joined issues are wrapped in
//! an `invalid_union`; a lone alternative's issues are returned as they are.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::compile::{Flags, Outcome};
use crate::issue::{IssueTree, PathSegment};
use crate::node::{ObjectShape, Schema, Terminal};
use crate::value::{BaseType, Literal, LiteralKey, Value};

// ============================================================================
// BUCKETS
// ============================================================================

/// Alternatives grouped by the terminals they accept at one position.
#[derive(Default)]
struct Buckets<'a> {
    types: IndexMap<BaseType, Vec<usize>>,
    literals: IndexMap<LiteralKey, (&'a Literal, Vec<usize>)>,
    unknowns: Vec<usize>,
    nothings: Vec<usize>,
    expected: Vec<BaseType>,
}

impl<'a> Buckets<'a> {
    fn classify<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, Terminal<'a>)>,
    {
        let mut buckets = Self::default();
        for (option, terminal) in pairs {
            match terminal {
                Terminal::Nothing => buckets.nothings.push(option),
                Terminal::Unknown => buckets.unknowns.push(option),
                Terminal::Base(base) => buckets.add_type(base, option),
                Terminal::Object(_) => buckets.add_type(BaseType::Object, option),
                Terminal::Literal(literal) => {
                    buckets.note_expected(literal.base_type());
                    buckets
                        .literals
                        .entry(literal.key())
                        .or_insert_with(|| (literal, Vec::new()))
                        .1
                        .push(option);
                }
            }
        }

        // A literal whose whole base type is already accepted adds nothing to
        // dispatch; its alternatives join the type bucket.
        let types = &mut buckets.types;
        buckets
            .literals
            .retain(|_, (literal, options)| match types.get_mut(&literal.base_type()) {
                Some(bucket) => {
                    bucket.extend(options.iter().copied());
                    false
                }
                None => true,
            });

        for options in buckets.types.values_mut() {
            normalize(options);
        }
        for (_, options) in buckets.literals.values_mut() {
            normalize(options);
        }
        normalize(&mut buckets.unknowns);
        normalize(&mut buckets.nothings);
        buckets
    }

    fn add_type(&mut self, base: BaseType, option: usize) {
        self.note_expected(base);
        self.types.entry(base).or_default().push(option);
    }

    fn note_expected(&mut self, base: BaseType) {
        if !self.expected.contains(&base) {
            self.expected.push(base);
        }
    }

    /// True when every concrete value picks at most one alternative, and at
    /// most one alternative accepts anything or nothing.
    fn is_unambiguous(&self) -> bool {
        self.types.values().all(|options| options.len() <= 1)
            && self.literals.values().all(|(_, options)| options.len() <= 1)
            && self.unknowns.len() <= 1
            && self.nothings.len() <= 1
    }
}

/// Declaration order, each alternative once.
fn normalize(options: &mut Vec<usize>) {
    options.sort_unstable();
    options.dedup();
}

// ============================================================================
// MATCHER
// ============================================================================

/// Dispatch table for the value found at one position.
struct Matcher {
    types: IndexMap<BaseType, Vec<usize>>,
    literals: IndexMap<LiteralKey, Vec<usize>>,
    literal_types: Vec<BaseType>,
    unknowns: Vec<usize>,
    nothings: Vec<usize>,
    invalid_type: IssueTree,
    invalid_literal: IssueTree,
}

impl Matcher {
    fn new(buckets: Buckets<'_>, suffix: Option<PathSegment>) -> Self {
        let Buckets {
            types,
            literals,
            unknowns,
            nothings,
            expected,
        } = buckets;

        let with_catch_alls = |mut options: Vec<usize>| {
            options.extend(unknowns.iter().copied());
            normalize(&mut options);
            options
        };

        let mut literal_types = Vec::new();
        let mut expected_literals = Vec::with_capacity(literals.len());
        let mut literal_table = IndexMap::with_capacity(literals.len());
        for (key, (literal, options)) in literals {
            if !literal_types.contains(&literal.base_type()) {
                literal_types.push(literal.base_type());
            }
            expected_literals.push(literal.clone());
            literal_table.insert(key, with_catch_alls(options));
        }

        let types = types
            .into_iter()
            .map(|(base, options)| (base, with_catch_alls(options)))
            .collect();

        Self {
            types,
            literals: literal_table,
            literal_types,
            unknowns,
            nothings,
            invalid_type: IssueTree::invalid_type(expected, suffix.clone()),
            invalid_literal: IssueTree::invalid_literal(expected_literals, suffix),
        }
    }

    /// Alternatives to try for `value`, or the issue to report when none
    /// can accept it.
    fn select(&self, value: &Value, missing: bool) -> Result<&[usize], IssueTree> {
        if missing && !self.nothings.is_empty() {
            return Ok(self.nothings.as_slice());
        }

        let base = value.base_type();
        if let Some(options) = self.types.get(&base) {
            return Ok(options.as_slice());
        }
        if self.literal_types.contains(&base) {
            let found = LiteralKey::of(value).and_then(|key| self.literals.get(&key));
            return match found {
                Some(options) => Ok(options.as_slice()),
                None if !self.unknowns.is_empty() => Ok(self.unknowns.as_slice()),
                None => Err(self.invalid_literal.clone()),
            };
        }
        if !self.unknowns.is_empty() {
            return Ok(self.unknowns.as_slice());
        }
        Err(self.invalid_type.clone())
    }
}

/// Runs `selected` alternatives against `value` in order; first success wins.
fn try_options(options: &[Schema], selected: &[usize], value: &Value, flags: Flags) -> Outcome {
    if let [only] = selected {
        return options[*only].run(value, flags);
    }

    let mut issues: Option<IssueTree> = None;
    for &index in selected {
        match options[index].run(value, flags) {
            Outcome::Invalid(tree) => IssueTree::join_into(&mut issues, tree),
            valid => return valid,
        }
    }
    match issues {
        Some(tree) => Outcome::Invalid(IssueTree::invalid_union(tree)),
        None => Outcome::Unchanged,
    }
}

// ============================================================================
// UNION MATCHER
// ============================================================================

/// Object inputs routed by the value under `key`.
struct Discriminant {
    key: Arc<str>,
    matcher: Matcher,
    missing_key: IssueTree,
}

/// Compiled form of a union node.
pub(crate) struct UnionMatcher {
    discriminant: Option<Discriminant>,
    generic: Matcher,
}

impl UnionMatcher {
    pub(crate) fn new(options: &[Schema]) -> Self {
        let terminals: Vec<(usize, Terminal<'_>)> = options
            .iter()
            .enumerate()
            .flat_map(|(index, option)| {
                option
                    .terminals()
                    .into_iter()
                    .map(move |terminal| (index, terminal))
            })
            .collect();

        let has_catch_all = terminals
            .iter()
            .any(|(_, terminal)| matches!(terminal, Terminal::Unknown));
        let objects: Vec<(usize, &ObjectShape)> = terminals
            .iter()
            .filter_map(|(index, terminal)| match terminal {
                Terminal::Object(shape) => Some((*index, *shape)),
                _ => None,
            })
            .collect();

        let discriminant = if has_catch_all {
            None
        } else {
            find_discriminant(&objects)
        };

        match &discriminant {
            Some(found) => tracing::debug!(
                alternatives = options.len(),
                discriminant = %found.key,
                "compiled union with object discriminant"
            ),
            None => tracing::debug!(
                alternatives = options.len(),
                objects = objects.len(),
                "compiled union with generic dispatch"
            ),
        }

        Self {
            discriminant,
            generic: Matcher::new(Buckets::classify(terminals), None),
        }
    }

    /// Key used to route object inputs, if one was found.
    #[cfg(test)]
    pub(crate) fn discriminant_key(&self) -> Option<&str> {
        self.discriminant.as_ref().map(|found| &*found.key)
    }

    pub(crate) fn run(&self, options: &[Schema], value: &Value, flags: Flags) -> Outcome {
        if let (Some(found), Value::Object(map)) = (&self.discriminant, value) {
            let selected = match map.get(&*found.key) {
                Some(at_key) => found.matcher.select(at_key, false),
                None if !found.matcher.nothings.is_empty() => Ok(found.matcher.nothings.as_slice()),
                None => Err(found.missing_key.clone()),
            };
            return match selected {
                Ok(selected) => try_options(options, selected, value, flags),
                Err(tree) => Outcome::Invalid(tree),
            };
        }

        match self.generic.select(value, flags.missing) {
            Ok(selected) => try_options(options, selected, value, flags),
            Err(tree) => Outcome::Invalid(tree),
        }
    }
}

/// First key common to every object alternative that separates them.
fn find_discriminant(objects: &[(usize, &ObjectShape)]) -> Option<Discriminant> {
    let [(_, first), _, ..] = objects else {
        return None;
    };

    first
        .fields
        .keys()
        .filter(|key| objects.iter().all(|(_, shape)| shape.fields.contains_key(*key)))
        .find_map(|key| {
            let pairs = objects.iter().flat_map(|&(index, shape)| {
                shape.fields[key.as_str()]
                    .terminals()
                    .into_iter()
                    .map(move |terminal| (index, terminal))
            });
            let buckets = Buckets::classify(pairs);
            if !buckets.is_unambiguous() {
                return None;
            }
            Some(Discriminant {
                key: Arc::from(key.as_str()),
                matcher: Matcher::new(buckets, Some(PathSegment::from(key.as_str()))),
                missing_key: IssueTree::missing_key(key),
            })
        })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{array, literal, null, number, object, string, unknown};
    use crate::SchemaExt;

    fn obj<const N: usize>(fields: [(&str, Schema); N]) -> Schema {
        object(fields).into()
    }

    fn key_of(options: &[Schema]) -> Option<String> {
        UnionMatcher::new(options).discriminant_key().map(str::to_owned)
    }

    #[test]
    fn picks_first_separating_key() {
        let options = [
            obj([("id", number()), ("kind", literal("a"))]),
            obj([("id", number()), ("kind", literal("b"))]),
        ];
        assert_eq!(key_of(&options).as_deref(), Some("kind"));
    }

    #[test]
    fn separates_on_base_types() {
        let options = [
            obj([("v", string())]),
            obj([("v", number())]),
        ];
        assert_eq!(key_of(&options).as_deref(), Some("v"));
    }

    #[test]
    fn literal_colliding_with_type_is_ambiguous() {
        let options = [
            obj([("v", string())]),
            obj([("v", literal("x"))]),
        ];
        assert_eq!(key_of(&options), None);
    }

    #[test]
    fn duplicate_literals_are_ambiguous() {
        let options = [
            obj([("kind", literal("a"))]),
            obj([("kind", literal("a"))]),
        ];
        assert_eq!(key_of(&options), None);
    }

    #[test]
    fn one_optional_key_is_allowed_two_are_not() {
        let one = [
            obj([("kind", literal("a").optional())]),
            obj([("kind", literal("b"))]),
        ];
        assert_eq!(key_of(&one).as_deref(), Some("kind"));

        let two = [
            obj([("kind", literal("a").optional())]),
            obj([("kind", literal("b").optional())]),
        ];
        // both alternatives also accept an explicit undefined there
        assert_eq!(key_of(&two), None);
    }

    #[test]
    fn at_most_one_unknown_per_key() {
        let one = [
            obj([("kind", unknown())]),
            obj([("kind", literal("b"))]),
        ];
        assert_eq!(key_of(&one).as_deref(), Some("kind"));

        let two = [
            obj([("kind", unknown())]),
            obj([("kind", unknown())]),
        ];
        assert_eq!(key_of(&two), None);
    }

    #[test]
    fn top_level_catch_all_disables_object_dispatch() {
        let options = [
            obj([("kind", literal("a"))]),
            obj([("kind", literal("b"))]),
            unknown(),
        ];
        assert_eq!(key_of(&options), None);
    }

    #[test]
    fn needs_two_objects() {
        let options = [obj([("kind", literal("a"))]), array(number()), null()];
        assert_eq!(key_of(&options), None);
    }

    #[test]
    fn nested_unions_feed_the_analysis() {
        let inner = crate::node::union([
            obj([("t", literal(1))]),
            obj([("t", literal(2))]),
        ]);
        let options = [inner, obj([("t", literal(3))])];
        assert_eq!(key_of(&options).as_deref(), Some("t"));
    }

    #[test]
    fn generic_buckets_merge_catch_alls() {
        let options = [string(), literal(1), unknown()];
        let buckets = Buckets::classify(
            options
                .iter()
                .enumerate()
                .flat_map(|(i, o)| o.terminals().into_iter().map(move |t| (i, t))),
        );
        let matcher = Matcher::new(buckets, None);
        assert_eq!(matcher.types[&BaseType::String], vec![0, 2]);
        assert_eq!(matcher.literals.values().next().unwrap(), &vec![1, 2]);
        assert_eq!(matcher.unknowns, vec![2]);
    }
}
