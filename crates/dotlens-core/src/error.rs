//! Error type for structural graph operations.

use thiserror::Error;

use crate::{element::ElementKind, identifier::Id};

/// Errors raised by [`Graph`](crate::graph::Graph) mutations.
///
/// A mutation that returns an error has not changed the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: ElementKind, id: String },

    #[error("{kind} `{id}` already exists")]
    DuplicateIdentifier { kind: ElementKind, id: String },
}

impl GraphError {
    pub(crate) fn not_found(kind: ElementKind, id: Id) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: ElementKind, id: Id) -> Self {
        Self::DuplicateIdentifier {
            kind,
            id: id.to_string(),
        }
    }
}
