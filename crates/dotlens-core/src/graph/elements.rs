//! Nodes, edges and subgraphs.
//!
//! Each wraps a [`GraphElement`] with the identity and relations of its kind.
//! Relations are stored as identifiers; the owning [`Graph`](super::Graph)
//! keeps them resolvable.

use indexmap::IndexSet;

use crate::{element::GraphElement, identifier::Id};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: Id,
    element: GraphElement,
}

impl Node {
    pub fn new(id: Id, element: GraphElement) -> Self {
        Self { id, element }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn element(&self) -> &GraphElement {
        &self.element
    }

    /// Mutable access to the element data. Does not queue change events.
    pub fn element_mut(&mut self) -> &mut GraphElement {
        &mut self.element
    }

    pub(super) fn set_id(&mut self, id: Id) {
        self.id = id;
        self.element.set_attribute("id", &id.to_string());
    }
}

/// A directed or undirected connection between two nodes.
///
/// Edges reference their endpoints by id and never own them.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: Id,
    source: Id,
    target: Id,
    element: GraphElement,
}

impl Edge {
    pub fn new(id: Id, source: Id, target: Id, element: GraphElement) -> Self {
        Self {
            id,
            source,
            target,
            element,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn element(&self) -> &GraphElement {
        &self.element
    }

    /// Mutable access to the element data. Does not queue change events.
    pub fn element_mut(&mut self) -> &mut GraphElement {
        &mut self.element
    }

    pub fn is_incident_to(&self, node: Id) -> bool {
        self.source == node || self.target == node
    }

    pub(super) fn set_id(&mut self, id: Id) {
        self.id = id;
        self.element.set_attribute("id", &id.to_string());
    }

    /// Re-points endpoints equal to `from` at `to`. Returns true if any moved.
    pub(super) fn repoint(&mut self, from: Id, to: Id) -> bool {
        let mut changed = false;
        if self.source == from {
            self.source = to;
            changed = true;
        }
        if self.target == from {
            self.target = to;
            changed = true;
        }
        changed
    }

    pub(super) fn set_endpoints(&mut self, source: Id, target: Id) -> bool {
        let changed = self.source != source || self.target != target;
        self.source = source;
        self.target = target;
        changed
    }
}

/// A named group of nodes and nested subgraphs.
///
/// Membership is an overlay: member nodes stay in the graph's node
/// collection, and a node may belong to several subgraphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Subgraph {
    id: Id,
    nodes: IndexSet<Id>,
    subgraphs: IndexSet<Id>,
    element: GraphElement,
}

impl Subgraph {
    pub fn new(id: Id, element: GraphElement) -> Self {
        Self {
            id,
            nodes: IndexSet::new(),
            subgraphs: IndexSet::new(),
            element,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Member node ids in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes.iter().copied()
    }

    /// Nested subgraph ids in insertion order.
    pub fn subgraphs(&self) -> impl Iterator<Item = Id> + '_ {
        self.subgraphs.iter().copied()
    }

    pub fn contains_node(&self, node: Id) -> bool {
        self.nodes.contains(&node)
    }

    pub fn contains_subgraph(&self, subgraph: Id) -> bool {
        self.subgraphs.contains(&subgraph)
    }

    pub fn element(&self) -> &GraphElement {
        &self.element
    }

    /// Mutable access to the element data. Does not queue change events.
    pub fn element_mut(&mut self) -> &mut GraphElement {
        &mut self.element
    }

    /// Adds a member node. Does not queue change events.
    pub fn insert_node(&mut self, node: Id) -> bool {
        self.nodes.insert(node)
    }

    /// Adds a nested subgraph. Does not queue change events.
    pub fn insert_subgraph(&mut self, subgraph: Id) -> bool {
        subgraph != self.id && self.subgraphs.insert(subgraph)
    }

    pub(super) fn remove_node(&mut self, node: Id) -> bool {
        self.nodes.shift_remove(&node)
    }

    pub(super) fn remove_subgraph(&mut self, subgraph: Id) -> bool {
        self.subgraphs.shift_remove(&subgraph)
    }

    pub(super) fn set_id(&mut self, id: Id) {
        self.id = id;
        self.element.set_attribute("id", &id.to_string());
    }

    pub(super) fn rename_node(&mut self, from: Id, to: Id) -> bool {
        if !self.nodes.contains(&from) {
            return false;
        }
        self.nodes = self
            .nodes
            .iter()
            .map(|&n| if n == from { to } else { n })
            .collect();
        true
    }

    pub(super) fn rename_subgraph(&mut self, from: Id, to: Id) -> bool {
        if !self.subgraphs.contains(&from) {
            return false;
        }
        self.subgraphs = self
            .subgraphs
            .iter()
            .map(|&s| if s == from { to } else { s })
            .collect();
        true
    }

    /// Replaces membership with `other`'s. Returns true if it differed.
    pub(super) fn sync_members(&mut self, other: &Subgraph) -> bool {
        let same = self.nodes.iter().eq(other.nodes.iter())
            && self.subgraphs.iter().eq(other.subgraphs.iter());
        if !same {
            self.nodes = other.nodes.clone();
            self.subgraphs = other.subgraphs.clone();
        }
        !same
    }
}
