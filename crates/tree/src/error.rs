//! Engine error kinds
//!
//! None of these are fatal: every operation that returns one leaves the tree
//! and the visibility cache exactly as they were before the call.

use crate::node::NodeId;
use crate::value::{ValueKind, Variant};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// The stored variant tag differs from what the caller asked for
    #[error("type mismatch on {node:?}: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        node: NodeId,
        expected: ValueKind,
        found: ValueKind,
    },

    /// An editor's transient value was rejected
    #[error("{message}")]
    ValidationFailed { value: Variant, message: String },

    /// A non-category node already uses this name in the same scope
    #[error("duplicate property name: {0}")]
    DuplicateName(String),

    /// Insert under a fixed-children parent, deleting the root, and friends
    #[error("structural violation: {0}")]
    StructuralViolation(String),

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("unknown value type: {0}")]
    UnknownValueType(String),

    #[error("unknown choice set: {0}")]
    UnknownChoiceSet(String),

    #[error("parse error: {0}")]
    Parse(String),

    /// A selection change arrived while a commit is still being resolved
    #[error("selection is busy committing")]
    Busy,

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GridError>;
