//! Error types surfaced by the index, its query parser and the registries.

use thiserror::Error;

/// Convenience alias for `Result<T, IndexError>`.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors returned by index operations.
///
/// Every error is raised before the tree is touched, so a failed call leaves
/// the index exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// `insert` was called with an identifier the index already tracks.
    #[error("index `{index}`: identifier {id} is already indexed")]
    DuplicateIdentifier { index: String, id: String },

    /// `update` or `remove` was called with an identifier the index does not track.
    #[error("index `{index}`: identifier {id} not found")]
    IdentifierNotFound { index: String, id: String },

    /// A range query named an operator the evaluator does not understand.
    #[error("unsupported range operator `{0}`")]
    UnsupportedOperator(String),

    /// A two-sided operator was given only one bound.
    #[error("range operator `{op}` requires a second bound")]
    MissingBound { op: String },

    /// `validate` found a broken tree invariant.
    #[error("index `{index}`: invariant violated: {detail}")]
    InvariantViolation { index: String, detail: String },

    #[error("unknown comparator `{0}`")]
    UnknownComparator(String),

    #[error("unknown index type `{0}`")]
    UnknownIndexType(String),
}

impl IndexError {
    pub(crate) fn duplicate(index: &str, id: &impl std::fmt::Debug) -> Self {
        Self::DuplicateIdentifier {
            index: index.to_owned(),
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn not_found(index: &str, id: &impl std::fmt::Debug) -> Self {
        Self::IdentifierNotFound {
            index: index.to_owned(),
            id: format!("{id:?}"),
        }
    }

    pub(crate) fn invariant(index: &str, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            index: index.to_owned(),
            detail: detail.into(),
        }
    }
}
