//! DOM mutation and API errors.
//!
//! Parse errors are a separate, soft signal owned by the parser; everything
//! here is surfaced synchronously to the caller and never corrupts the tree
//! (validation runs before mutation).

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomError {
    /// Structural invariant would be broken by the requested mutation.
    HierarchyRequest,
    /// Reference child is not a child of the target parent.
    NotFound,
    /// Name does not match the XML `Name` production.
    InvalidCharacter,
    /// Qualified-name/namespace mismatch.
    Namespace,
    /// Index out of bounds for a collection or row/cell operation.
    IndexSize,
    /// Operation refused for this node kind (e.g. adopting a document).
    NotSupported,
    /// Malformed string input to a non-parser API.
    Syntax,
    /// Wrong node kind for an operation.
    InvalidNodeType,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DomError::HierarchyRequest => "hierarchy request error",
            DomError::NotFound => "reference node not found",
            DomError::InvalidCharacter => "invalid character in name",
            DomError::Namespace => "namespace error",
            DomError::IndexSize => "index out of bounds",
            DomError::NotSupported => "operation not supported",
            DomError::Syntax => "syntax error",
            DomError::InvalidNodeType => "invalid node type",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for DomError {}
