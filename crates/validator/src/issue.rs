//! Issue trees and flattened issues.
//!
//! Validation never builds paths eagerly. Each failing node returns an
//! [`IssueTree`] made of three O(1) constructors:
//!
//! - a leaf holding one raw issue,
//! - `prepend(key, tree)` recording that `tree` happened under `key`,
//! - `join(left, right)` recording two sibling failures.
//!
//! Paths are only materialized when somebody asks for [`IssueTree::issues`],
//! which walks the tree depth-first, left to right, so the resulting order is
//! the order in which the failures were encountered.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use smallvec::SmallVec;

use crate::value::{BaseType, Literal};

// ============================================================================
// PATH SEGMENT
// ============================================================================

/// One step of an issue path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(Arc<str>),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(Arc::from(key))
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(Arc::from(key))
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

// ============================================================================
// CUSTOM ERROR
// ============================================================================

/// Failure reported by a user callback (`assert`, `chain`).
///
/// `path` is appended to the path at which the callback ran, so a check on a
/// whole object can point at the offending field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomError {
    pub message: Option<String>,
    pub path: Vec<PathSegment>,
}

impl CustomError {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_path<I, P>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathSegment>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }
}

impl From<&str> for CustomError {
    fn from(message: &str) -> Self {
        Self::new().with_message(message)
    }
}

impl From<String> for CustomError {
    fn from(message: String) -> Self {
        Self::new().with_message(message)
    }
}

// ============================================================================
// FLATTENED ISSUES
// ============================================================================

/// A single validation failure with its full path from the root value.
///
/// Serializes as `{ "code": ..., "path": [...], ...code specific fields }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    #[serde(flatten)]
    pub kind: IssueKind,
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueKind {
    /// The value's base type is not one of `expected`.
    InvalidType { expected: Vec<BaseType> },
    /// The value equals none of `expected`.
    InvalidLiteral { expected: Vec<Literal> },
    /// A required object key is absent.
    MissingKey { key: Arc<str> },
    /// An object key outside the declared shape, in strict mode.
    UnrecognizedKey { key: Arc<str> },
    /// Every alternative of an ambiguous union bucket failed.
    InvalidUnion { issues: Vec<Issue> },
    /// A user callback rejected the value.
    CustomError {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl IssueKind {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidType { .. } => "invalid_type",
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::MissingKey { .. } => "missing_key",
            Self::UnrecognizedKey { .. } => "unrecognized_key",
            Self::InvalidUnion { .. } => "invalid_union",
            Self::CustomError { .. } => "custom_error",
        }
    }

    /// Short human-readable description used in error messages.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::InvalidType { expected } => {
                if expected.is_empty() {
                    "expected nothing".to_owned()
                } else {
                    format!("expected {}", join_or(expected))
                }
            }
            Self::InvalidLiteral { expected } => format!("expected {}", join_or(expected)),
            Self::MissingKey { key } => format!("missing key {key:?}"),
            Self::UnrecognizedKey { key } => format!("unrecognized key {key:?}"),
            Self::InvalidUnion { .. } => "invalid union".to_owned(),
            Self::CustomError { message } => message
                .clone()
                .unwrap_or_else(|| "validation failed".to_owned()),
        }
    }
}

fn join_or<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

impl Issue {
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Renders `"<code> at .<dot.joined.path> (<description>)"`.
    #[must_use]
    pub fn message(&self) -> String {
        let path = self
            .path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        format!("{} at .{} ({})", self.code(), path, self.kind.description())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

// ============================================================================
// ISSUE TREE
// ============================================================================

/// Raw leaf stored in an [`IssueTree`].
#[derive(Debug, Clone)]
pub(crate) enum RawIssue {
    InvalidType {
        expected: SmallVec<[BaseType; 2]>,
        suffix: Option<PathSegment>,
    },
    InvalidLiteral {
        expected: Vec<Literal>,
        suffix: Option<PathSegment>,
    },
    MissingKey(Arc<str>),
    UnrecognizedKey(Arc<str>),
    InvalidUnion(IssueTree),
    Custom(CustomError),
}

/// Unflattened record of validation failures.
///
/// Leaves are reference counted so prebuilt issues (a node's `invalid_type`
/// for instance) are shared instead of reallocated on every failure.
/// Children are shared too, so cloning a tree is O(1) whatever its depth.
#[derive(Clone)]
pub struct IssueTree(Node);

#[derive(Clone)]
enum Node {
    /// Only observed while a tree is being dropped.
    Empty,
    Leaf(Arc<RawIssue>),
    Prepend(PathSegment, Arc<IssueTree>),
    Join(Arc<IssueTree>, Arc<IssueTree>),
}

impl IssueTree {
    pub(crate) fn leaf(issue: RawIssue) -> Self {
        Self(Node::Leaf(Arc::new(issue)))
    }

    pub(crate) fn invalid_type<I>(expected: I, suffix: Option<PathSegment>) -> Self
    where
        I: IntoIterator<Item = BaseType>,
    {
        Self::leaf(RawIssue::InvalidType {
            expected: expected.into_iter().collect(),
            suffix,
        })
    }

    pub(crate) fn invalid_literal(expected: Vec<Literal>, suffix: Option<PathSegment>) -> Self {
        Self::leaf(RawIssue::InvalidLiteral { expected, suffix })
    }

    pub(crate) fn missing_key(key: &str) -> Self {
        Self::leaf(RawIssue::MissingKey(Arc::from(key)))
    }

    pub(crate) fn unrecognized_key(key: &str) -> Self {
        Self::leaf(RawIssue::UnrecognizedKey(Arc::from(key)))
    }

    pub(crate) fn invalid_union(tree: IssueTree) -> Self {
        Self::leaf(RawIssue::InvalidUnion(tree))
    }

    pub(crate) fn custom(error: CustomError) -> Self {
        Self::leaf(RawIssue::Custom(error))
    }

    pub(crate) fn prepend(key: impl Into<PathSegment>, tree: IssueTree) -> Self {
        Self(Node::Prepend(key.into(), Arc::new(tree)))
    }

    pub(crate) fn join(left: IssueTree, right: IssueTree) -> Self {
        Self(Node::Join(Arc::new(left), Arc::new(right)))
    }

    /// Appends `tree` to an optional accumulator.
    pub(crate) fn join_into(acc: &mut Option<IssueTree>, tree: IssueTree) {
        *acc = Some(match acc.take() {
            None => tree,
            Some(left) => Self::join(left, tree),
        });
    }

    /// Flattens the tree into path-qualified issues, depth-first, left to right.
    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.collect(&mut path, &mut out);
        out
    }

    /// Number of leaf issues, without materializing paths.
    #[must_use]
    pub fn count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            match &tree.0 {
                Node::Empty => {}
                Node::Leaf(_) => count += 1,
                Node::Prepend(_, child) => stack.push(child),
                Node::Join(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        count
    }

    /// Explicit work stack: join chains grow linearly with the number of
    /// failing siblings and would otherwise recurse that deep.
    fn collect(&self, path: &mut Vec<PathSegment>, out: &mut Vec<Issue>) {
        enum Step<'a> {
            Visit(&'a IssueTree),
            Pop,
        }

        let mut stack = vec![Step::Visit(self)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Pop => {
                    path.pop();
                }
                Step::Visit(tree) => match &tree.0 {
                    Node::Empty => {}
                    Node::Leaf(raw) => out.push(materialize(raw, path)),
                    Node::Prepend(key, child) => {
                        path.push(key.clone());
                        stack.push(Step::Pop);
                        stack.push(Step::Visit(child));
                    }
                    Node::Join(left, right) => {
                        stack.push(Step::Visit(right));
                        stack.push(Step::Visit(left));
                    }
                },
            }
        }
    }
}

/// Summarizes instead of recursing: a derived impl would walk join chains
/// one stack frame per failing sibling.
impl fmt::Debug for IssueTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssueTree")
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}

impl Drop for IssueTree {
    fn drop(&mut self) {
        let mut pending: Vec<Arc<IssueTree>> = Vec::new();
        let mut node = std::mem::replace(&mut self.0, Node::Empty);
        loop {
            match node {
                Node::Prepend(_, child) => pending.push(child),
                Node::Join(left, right) => {
                    pending.push(left);
                    pending.push(right);
                }
                Node::Empty | Node::Leaf(_) => {}
            }
            // Subtrees still shared with a clone are left to that clone.
            node = loop {
                match pending.pop() {
                    Some(shared) => {
                        if let Ok(mut tree) = Arc::try_unwrap(shared) {
                            break std::mem::replace(&mut tree.0, Node::Empty);
                        }
                    }
                    None => return,
                }
            };
        }
    }
}

fn materialize(raw: &RawIssue, path: &mut Vec<PathSegment>) -> Issue {
    let with_suffix = |suffix: &[PathSegment]| {
        let mut full = path.clone();
        full.extend_from_slice(suffix);
        full
    };

    match raw {
        RawIssue::InvalidType { expected, suffix } => Issue {
            path: with_suffix(suffix.as_slice()),
            kind: IssueKind::InvalidType {
                expected: expected.to_vec(),
            },
        },
        RawIssue::InvalidLiteral { expected, suffix } => Issue {
            path: with_suffix(suffix.as_slice()),
            kind: IssueKind::InvalidLiteral {
                expected: expected.clone(),
            },
        },
        RawIssue::MissingKey(key) => Issue {
            path: path.clone(),
            kind: IssueKind::MissingKey { key: Arc::clone(key) },
        },
        RawIssue::UnrecognizedKey(key) => Issue {
            path: path.clone(),
            kind: IssueKind::UnrecognizedKey { key: Arc::clone(key) },
        },
        RawIssue::InvalidUnion(tree) => {
            let mut issues = Vec::new();
            tree.collect(path, &mut issues);
            Issue {
                path: path.clone(),
                kind: IssueKind::InvalidUnion { issues },
            }
        }
        RawIssue::Custom(error) => Issue {
            path: with_suffix(&error.path),
            kind: IssueKind::CustomError {
                message: error.message.clone(),
            },
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================
