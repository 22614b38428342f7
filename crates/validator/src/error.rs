//! Error types returned by the parse entry points.

use std::fmt;
use std::sync::OnceLock;

use crate::issue::{Issue, IssueTree};

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Failure of [`Schema::parse`](crate::Schema::parse).
///
/// Holds the raw [`IssueTree`]; the flattened issue list is computed on first
/// access and cached.
#[derive(Clone)]
pub struct ParseError {
    tree: IssueTree,
    issues: OnceLock<Vec<Issue>>,
}

impl ParseError {
    pub(crate) fn new(tree: IssueTree) -> Self {
        tracing::trace!(issues = tree.count(), "parse failed");
        Self {
            tree,
            issues: OnceLock::new(),
        }
    }

    /// Every issue, in encounter order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        self.issues.get_or_init(|| self.tree.issues())
    }

    /// The first issue.
    #[must_use]
    pub fn first(&self) -> Option<&Issue> {
        self.issues().first()
    }

    #[must_use]
    pub fn tree(&self) -> &IssueTree {
        &self.tree
    }

    #[must_use]
    pub fn into_tree(self) -> IssueTree {
        self.tree
    }

    /// Human readable summary built from the first issue, e.g.
    /// `invalid_type at .a.0.b (expected number)`.
    #[must_use]
    pub fn message(&self) -> String {
        self.first()
            .map_or_else(|| "validation failed".to_owned(), Issue::message)
    }
}

impl From<IssueTree> for ParseError {
    fn from(tree: IssueTree) -> Self {
        Self::new(tree)
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseError")
            .field("issues", &self.issues())
            .finish()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

/// A parse mode name that is not `passthrough`, `strict` or `strip`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown parse mode `{value}`, expected passthrough, strict or strip")]
pub struct UnknownParseMode {
    pub value: String,
}
