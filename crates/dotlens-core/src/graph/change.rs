//! Change events queued by graph mutations.

use crate::identifier::Id;

/// The element a change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeTarget {
    /// The graph-level element (graph attributes, canvas size, graph label ops).
    Graph,
    Node(Id),
    Edge(Id),
    Subgraph(Id),
}

impl ChangeTarget {
    /// The identifier of the element, `None` for the graph itself.
    pub fn id(self) -> Option<Id> {
        match self {
            Self::Graph => None,
            Self::Node(id) | Self::Edge(id) | Self::Subgraph(id) => Some(id),
        }
    }
}

/// What happened to a [`ChangeTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Added,
    Removed,
    /// Attributes, render operations, endpoints or membership changed.
    Modified,
    /// The element was re-keyed; the target carries the new id.
    Renamed { from: Id },
    SelectionChanged,
}

/// One queued change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    pub target: ChangeTarget,
    pub change: Change,
}

impl ChangeEvent {
    pub fn new(target: ChangeTarget, change: Change) -> Self {
        Self { target, change }
    }
}
