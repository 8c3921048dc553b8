//! Error types for tree mutation and name construction.

use thiserror::Error;

/// A specialized `Result` type for tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by tree mutation and name construction.
///
/// Lookup misses are not errors; query methods return `Option` or `bool`
/// instead. Every error here is raised synchronously at the offending call
/// and leaves the target container unchanged for the failing node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The node is already owned by a branch and must be detached first.
    #[error("{node} could not be added to {target}: the node already has a parent")]
    NodeAlreadyOwned { node: String, target: String },

    /// The node was created by a different document.
    #[error("{node} could not be added to {target}: the node belongs to a different document")]
    ForeignDocument { node: String, target: String },

    /// The add would make the node its own ancestor.
    #[error("{node} could not be added to {target}: the add would make the node its own ancestor")]
    CyclicAdd { node: String, target: String },

    /// The document can hold only one root element.
    #[error("{node} could not be added to the document: it already has a root element")]
    DuplicateRootElement { node: String },

    /// The document can hold only one document type.
    #[error("{node} could not be added to the document: it already has a document type")]
    DuplicateDocType { node: String },

    /// The node kind cannot appear at this position in the tree.
    #[error("a {kind} node cannot appear in {target}")]
    InvalidChildKind {
        kind: &'static str,
        target: &'static str,
    },

    /// An indexed mutation addressed a position outside the sequence.
    #[error("index {index} is out of bounds for content of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The string is not usable as a qualified name or namespace prefix.
    #[error("`{name}` is not a well-formed qualified name")]
    InvalidQualifiedName { name: String },

    /// Strict prefix resolution found no binding in scope.
    #[error("no namespace is bound to the prefix `{prefix}`")]
    UnboundPrefix { prefix: String },
}

impl Error {
    /// True for the family of failures raised when an add would violate
    /// tree-shape invariants.
    pub fn is_illegal_add(&self) -> bool {
        matches!(
            self,
            Error::NodeAlreadyOwned { .. }
                | Error::ForeignDocument { .. }
                | Error::CyclicAdd { .. }
                | Error::DuplicateRootElement { .. }
                | Error::DuplicateDocType { .. }
                | Error::InvalidChildKind { .. }
        )
    }
}
