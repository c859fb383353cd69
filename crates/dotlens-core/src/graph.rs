//! The graph model.
//!
//! A [`Graph`] owns every node, edge and subgraph in identifier-keyed,
//! insertion-ordered collections and keeps them referentially consistent:
//!
//! - identifiers are unique across nodes, edges and subgraphs
//! - every edge endpoint names an existing node
//! - every subgraph member names an existing node or subgraph
//!
//! Mutations return [`GraphError`] without touching the graph when they
//! cannot be applied in full. Successful mutations queue [`ChangeEvent`]s
//! that a scene drains with [`Graph::take_changes`].
//!
//! # Examples
//!
//! ```
//! use dotlens_core::{attributes::AttributeStore, graph::Graph, identifier::Id};
//!
//! let mut graph = Graph::new("g", true);
//! let a = graph.add_node(AttributeStore::from_iter([("id", "a")])).unwrap();
//! let b = graph.add_node(AttributeStore::from_iter([("id", "b")])).unwrap();
//! let e = graph.add_edge(a, b, AttributeStore::new()).unwrap();
//!
//! assert_eq!(e, "a->b");
//! graph.remove_node(a).unwrap();
//! assert_eq!(graph.edge_count(), 0);
//! ```

mod change;
mod elements;

use indexmap::IndexMap;
use log::{debug, trace};

pub use change::{Change, ChangeEvent, ChangeTarget};
pub use elements::{Edge, Node, Subgraph};

use crate::{
    GraphError,
    attributes::AttributeStore,
    element::{ElementKind, GraphElement},
    identifier::Id,
};

/// A DOT graph: root attributes plus nodes, edges and subgraphs.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    directed: bool,
    strict: bool,
    root: GraphElement,
    nodes: IndexMap<Id, Node>,
    edges: IndexMap<Id, Edge>,
    subgraphs: IndexMap<Id, Subgraph>,
    width: f64,
    height: f64,
    scale: f64,
    changes: Vec<ChangeEvent>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("", true)
    }
}

impl Graph {
    /// Creates an empty graph.
    pub fn new(name: impl Into<String>, directed: bool) -> Self {
        Self {
            name: name.into(),
            directed,
            strict: false,
            root: GraphElement::new(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            subgraphs: IndexMap::new(),
            width: 0.0,
            height: 0.0,
            scale: 1.0,
            changes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn directed(&self) -> bool {
        self.directed
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// The graph-level element (graph attributes and graph label ops).
    pub fn root(&self) -> &GraphElement {
        &self.root
    }

    /// Mutable access to the graph-level element. Does not queue change events.
    pub fn root_mut(&mut self) -> &mut GraphElement {
        &mut self.root
    }

    /// Canvas width in layout units.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Canvas height in layout units.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Base scale applied on top of the detail level when drawing.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: Id) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn subgraph(&self, id: Id) -> Option<&Subgraph> {
        self.subgraphs.get(&id)
    }

    /// Mutable access to a node's element data. Does not queue change events.
    pub fn node_mut(&mut self, id: Id) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Mutable access to an edge's element data. Does not queue change events.
    pub fn edge_mut(&mut self, id: Id) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    /// Mutable access to a subgraph. Does not queue change events.
    ///
    /// Members inserted through this handle must name existing elements.
    pub fn subgraph_mut(&mut self, id: Id) -> Option<&mut Subgraph> {
        self.subgraphs.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn subgraphs(&self) -> impl Iterator<Item = &Subgraph> {
        self.subgraphs.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn subgraph_count(&self) -> usize {
        self.subgraphs.len()
    }

    /// Ids of edges with `node` as source or target.
    pub fn incident_edges(&self, node: Id) -> Vec<Id> {
        self.edges
            .values()
            .filter(|e| e.is_incident_to(node))
            .map(Edge::id)
            .collect()
    }

    /// Ids of subgraphs that list `node` as a member.
    pub fn subgraphs_of(&self, node: Id) -> Vec<Id> {
        self.subgraphs
            .values()
            .filter(|s| s.contains_node(node))
            .map(Subgraph::id)
            .collect()
    }

    /// Ids of subgraphs that list `subgraph` as a nested member.
    pub fn parents_of(&self, subgraph: Id) -> Vec<Id> {
        self.subgraphs
            .values()
            .filter(|s| s.contains_subgraph(subgraph))
            .map(Subgraph::id)
            .collect()
    }

    /// True if a node, edge or subgraph has this id.
    pub fn contains_element(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
            || self.edges.contains_key(&id)
            || self.subgraphs.contains_key(&id)
    }

    /// Fails with [`GraphError::DuplicateIdentifier`], naming the holder's
    /// kind, if any element has `id`.
    fn ensure_unused(&self, id: Id) -> Result<(), GraphError> {
        let holder = if self.nodes.contains_key(&id) {
            ElementKind::Node
        } else if self.edges.contains_key(&id) {
            ElementKind::Edge
        } else if self.subgraphs.contains_key(&id) {
            ElementKind::Subgraph
        } else {
            return Ok(());
        };
        Err(GraphError::duplicate(holder, id))
    }

    /// The element data of whichever node, edge or subgraph has this id.
    pub fn element(&self, id: Id) -> Option<&GraphElement> {
        self.nodes
            .get(&id)
            .map(Node::element)
            .or_else(|| self.edges.get(&id).map(Edge::element))
            .or_else(|| self.subgraphs.get(&id).map(Subgraph::element))
    }

    /// Drains the queued change events in the order they happened.
    pub fn take_changes(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.changes)
    }

    /// Returns true if change events are waiting to be drained.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn push_change(&mut self, target: ChangeTarget, change: Change) {
        trace!(element:? = target, change:? = change; "Graph change queued");
        self.changes.push(ChangeEvent::new(target, change));
    }

    /// Adds a node.
    ///
    /// The node's id is `attrs["id"]` when present and non-empty, otherwise a
    /// fresh `new_node<n>` id, which is written back into the `id` attribute.
    ///
    /// # Errors
    ///
    /// [`GraphError::DuplicateIdentifier`] if any element has that id.
    pub fn add_node(&mut self, attrs: AttributeStore) -> Result<Id, GraphError> {
        let id = match attrs.value("id").filter(|v| !v.is_empty()) {
            Some(name) => Id::new(name),
            None => self.fresh_id("new_node"),
        };
        self.ensure_unused(id)?;

        let mut element = GraphElement::with_attributes(attrs);
        element.set_attribute("id", &id.to_string());
        self.nodes.insert(id, Node::new(id, element));
        self.push_change(ChangeTarget::Node(id), Change::Added);
        debug!(node:% = id; "Node added");
        Ok(id)
    }

    /// Adds a node and makes it a member of `subgraph`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if the subgraph does not exist,
    /// [`GraphError::DuplicateIdentifier`] if the node id is taken.
    pub fn add_node_to_subgraph(
        &mut self,
        attrs: AttributeStore,
        subgraph: Id,
    ) -> Result<Id, GraphError> {
        if !self.subgraphs.contains_key(&subgraph) {
            return Err(GraphError::not_found(ElementKind::Subgraph, subgraph));
        }
        let node = self.add_node(attrs)?;
        self.add_existing_node_to_subgraph(node, subgraph)?;
        Ok(node)
    }

    /// Makes an existing node a member of `subgraph`.
    ///
    /// Adding a node that is already a member is a no-op.
    pub fn add_existing_node_to_subgraph(
        &mut self,
        node: Id,
        subgraph: Id,
    ) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::not_found(ElementKind::Node, node));
        }
        let sg = self
            .subgraphs
            .get_mut(&subgraph)
            .ok_or_else(|| GraphError::not_found(ElementKind::Subgraph, subgraph))?;
        if sg.insert_node(node) {
            self.push_change(ChangeTarget::Subgraph(subgraph), Change::Modified);
        }
        Ok(())
    }

    /// Drops `node` from the members of `subgraph`. The node stays in the graph.
    pub fn remove_node_from_subgraph(&mut self, node: Id, subgraph: Id) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::not_found(ElementKind::Node, node));
        }
        let sg = self
            .subgraphs
            .get_mut(&subgraph)
            .ok_or_else(|| GraphError::not_found(ElementKind::Subgraph, subgraph))?;
        if sg.remove_node(node) {
            self.push_change(ChangeTarget::Subgraph(subgraph), Change::Modified);
        }
        Ok(())
    }

    /// Drops `node` from every subgraph it belongs to.
    pub fn move_existing_node_to_main_graph(&mut self, node: Id) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::not_found(ElementKind::Node, node));
        }
        let mut touched = Vec::new();
        for sg in self.subgraphs.values_mut() {
            if sg.remove_node(node) {
                touched.push(sg.id());
            }
        }
        for id in touched {
            self.push_change(ChangeTarget::Subgraph(id), Change::Modified);
        }
        Ok(())
    }

    /// Adds a subgraph.
    ///
    /// The id is `attrs["id"]` when present and non-empty, otherwise a fresh
    /// `new_subgraph<n>` id.
    pub fn add_subgraph(&mut self, attrs: AttributeStore) -> Result<Id, GraphError> {
        let id = match attrs.value("id").filter(|v| !v.is_empty()) {
            Some(name) => Id::new(name),
            None => self.fresh_id("new_subgraph"),
        };
        self.ensure_unused(id)?;

        let mut element = GraphElement::with_attributes(attrs);
        element.set_attribute("id", &id.to_string());
        self.subgraphs.insert(id, Subgraph::new(id, element));
        self.push_change(ChangeTarget::Subgraph(id), Change::Added);
        debug!(subgraph:% = id; "Subgraph added");
        Ok(id)
    }

    /// Nests `child` inside `parent`.
    pub fn add_subgraph_to_subgraph(&mut self, child: Id, parent: Id) -> Result<(), GraphError> {
        if !self.subgraphs.contains_key(&child) {
            return Err(GraphError::not_found(ElementKind::Subgraph, child));
        }
        let sg = self
            .subgraphs
            .get_mut(&parent)
            .ok_or_else(|| GraphError::not_found(ElementKind::Subgraph, parent))?;
        if sg.insert_subgraph(child) {
            self.push_change(ChangeTarget::Subgraph(parent), Change::Modified);
        }
        Ok(())
    }

    /// Adds an edge from `source` to `target`.
    ///
    /// Parallel edges are allowed. The id is `attrs["id"]` when present and
    /// non-empty, otherwise `"{source}->{target}"`, suffixed with `#<n>` when
    /// that id is taken.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if either endpoint does not exist,
    /// [`GraphError::DuplicateIdentifier`] if an explicit id is taken.
    pub fn add_edge(
        &mut self,
        source: Id,
        target: Id,
        attrs: AttributeStore,
    ) -> Result<Id, GraphError> {
        for endpoint in [source, target] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(GraphError::not_found(ElementKind::Node, endpoint));
            }
        }

        let id = match attrs.value("id").filter(|v| !v.is_empty()) {
            Some(name) => {
                let id = Id::new(name);
                self.ensure_unused(id)?;
                id
            }
            None => self.edge_id(source, target),
        };

        let mut element = GraphElement::with_attributes(attrs);
        element.set_attribute("id", &id.to_string());
        self.edges
            .insert(id, Edge::new(id, source, target, element));
        self.push_change(ChangeTarget::Edge(id), Change::Added);
        debug!(edge:% = id, source:% = source, target:% = target; "Edge added");
        Ok(id)
    }

    /// The generated id for a new edge between `source` and `target`.
    fn edge_id(&self, source: Id, target: Id) -> Id {
        let base = format!("{source}->{target}");
        let id = Id::new(&base);
        if !self.contains_element(id) {
            return id;
        }
        (1..)
            .map(|n| Id::new(&format!("{base}#{n}")))
            .find(|&id| !self.contains_element(id))
            .unwrap_or(id)
    }

    fn fresh_id(&self, prefix: &str) -> Id {
        (0..)
            .map(|n| Id::new(&format!("{prefix}{n}")))
            .find(|&id| !self.contains_element(id))
            .unwrap_or_else(|| Id::new(prefix))
    }

    /// Removes a node together with its incident edges and memberships.
    ///
    /// The removal is planned first and committed only when the node exists,
    /// so a failed call leaves the graph untouched.
    pub fn remove_node(&mut self, node: Id) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::not_found(ElementKind::Node, node));
        }
        let edges = self.incident_edges(node);
        let memberships = self.subgraphs_of(node);

        for edge in &edges {
            self.edges.shift_remove(edge);
            self.push_change(ChangeTarget::Edge(*edge), Change::Removed);
        }
        for subgraph in &memberships {
            if let Some(sg) = self.subgraphs.get_mut(subgraph) {
                sg.remove_node(node);
            }
            self.push_change(ChangeTarget::Subgraph(*subgraph), Change::Modified);
        }
        self.nodes.shift_remove(&node);
        self.push_change(ChangeTarget::Node(node), Change::Removed);
        debug!(
            node:% = node,
            edges = edges.len(),
            subgraphs = memberships.len();
            "Node removed"
        );
        Ok(())
    }

    pub fn remove_edge(&mut self, edge: Id) -> Result<(), GraphError> {
        if self.edges.shift_remove(&edge).is_none() {
            return Err(GraphError::not_found(ElementKind::Edge, edge));
        }
        self.push_change(ChangeTarget::Edge(edge), Change::Removed);
        debug!(edge:% = edge; "Edge removed");
        Ok(())
    }

    /// Removes a subgraph and drops it from its parents.
    ///
    /// Member nodes and nested subgraphs stay in the graph.
    pub fn remove_subgraph(&mut self, subgraph: Id) -> Result<(), GraphError> {
        if !self.subgraphs.contains_key(&subgraph) {
            return Err(GraphError::not_found(ElementKind::Subgraph, subgraph));
        }
        let parents = self.parents_of(subgraph);
        for parent in &parents {
            if let Some(sg) = self.subgraphs.get_mut(parent) {
                sg.remove_subgraph(subgraph);
            }
            self.push_change(ChangeTarget::Subgraph(*parent), Change::Modified);
        }
        self.subgraphs.shift_remove(&subgraph);
        self.push_change(ChangeTarget::Subgraph(subgraph), Change::Removed);
        debug!(subgraph:% = subgraph; "Subgraph removed");
        Ok(())
    }

    /// Removes whichever node, edge or subgraph has this id, in that order.
    pub fn remove_element(&mut self, id: Id) -> Result<(), GraphError> {
        if self.nodes.contains_key(&id) {
            self.remove_node(id)
        } else if self.edges.contains_key(&id) {
            self.remove_edge(id)
        } else if self.subgraphs.contains_key(&id) {
            self.remove_subgraph(id)
        } else {
            Err(GraphError::not_found(ElementKind::Element, id))
        }
    }

    /// Re-keys a node from `old` to `new`.
    ///
    /// The node keeps its position in the collection; incident edges and
    /// subgraph memberships are re-pointed. Renaming to the same id is a no-op.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if `old` does not exist,
    /// [`GraphError::DuplicateIdentifier`] if any element already has `new`.
    pub fn rename_node(&mut self, old: Id, new: Id) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&old) {
            return Err(GraphError::not_found(ElementKind::Node, old));
        }
        if old == new {
            return Ok(());
        }
        self.ensure_unused(new)?;

        if let Some((index, _, mut node)) = self.nodes.shift_remove_full(&old) {
            node.set_id(new);
            self.nodes.shift_insert(index, new, node);
        }
        self.push_change(ChangeTarget::Node(new), Change::Renamed { from: old });

        let mut moved_edges = Vec::new();
        for edge in self.edges.values_mut() {
            if edge.repoint(old, new) {
                moved_edges.push(edge.id());
            }
        }
        for edge in moved_edges {
            self.push_change(ChangeTarget::Edge(edge), Change::Modified);
        }

        let mut touched = Vec::new();
        for sg in self.subgraphs.values_mut() {
            if sg.rename_node(old, new) {
                touched.push(sg.id());
            }
        }
        for subgraph in touched {
            self.push_change(ChangeTarget::Subgraph(subgraph), Change::Modified);
        }
        debug!(from:% = old, to:% = new; "Node renamed");
        Ok(())
    }

    /// Re-keys a subgraph from `old` to `new`, re-pointing parent subgraphs.
    pub fn rename_subgraph(&mut self, old: Id, new: Id) -> Result<(), GraphError> {
        if !self.subgraphs.contains_key(&old) {
            return Err(GraphError::not_found(ElementKind::Subgraph, old));
        }
        if old == new {
            return Ok(());
        }
        self.ensure_unused(new)?;

        if let Some((index, _, mut subgraph)) = self.subgraphs.shift_remove_full(&old) {
            subgraph.set_id(new);
            self.subgraphs.shift_insert(index, new, subgraph);
        }
        self.push_change(ChangeTarget::Subgraph(new), Change::Renamed { from: old });

        let mut touched = Vec::new();
        for sg in self.subgraphs.values_mut() {
            if sg.rename_subgraph(old, new) {
                touched.push(sg.id());
            }
        }
        for parent in touched {
            self.push_change(ChangeTarget::Subgraph(parent), Change::Modified);
        }
        debug!(from:% = old, to:% = new; "Subgraph renamed");
        Ok(())
    }

    /// Re-keys an edge from `old` to `new`.
    pub fn rename_edge(&mut self, old: Id, new: Id) -> Result<(), GraphError> {
        if !self.edges.contains_key(&old) {
            return Err(GraphError::not_found(ElementKind::Edge, old));
        }
        if old == new {
            return Ok(());
        }
        self.ensure_unused(new)?;

        if let Some((index, _, mut edge)) = self.edges.shift_remove_full(&old) {
            edge.set_id(new);
            self.edges.shift_insert(index, new, edge);
        }
        self.push_change(ChangeTarget::Edge(new), Change::Renamed { from: old });
        Ok(())
    }

    /// Sets an attribute on the node, edge or subgraph with this id.
    ///
    /// Setting `id` renames the element. Returns whether the value changed.
    pub fn set_attribute(&mut self, element: Id, key: &str, value: &str) -> Result<bool, GraphError> {
        if key == "id" {
            let new = Id::new(value);
            if self.nodes.contains_key(&element) {
                self.rename_node(element, new)?;
            } else if self.edges.contains_key(&element) {
                self.rename_edge(element, new)?;
            } else if self.subgraphs.contains_key(&element) {
                self.rename_subgraph(element, new)?;
            } else {
                return Err(GraphError::not_found(ElementKind::Element, element));
            }
            return Ok(element != new);
        }

        let (target, data) = self.element_entry_mut(element)?;
        let changed = data.set_attribute(key, value);
        if changed {
            self.push_change(target, Change::Modified);
        }
        Ok(changed)
    }

    /// Removes an attribute from the node, edge or subgraph with this id.
    ///
    /// The `id` attribute cannot be removed. Returns whether something was removed.
    pub fn remove_attribute(&mut self, element: Id, key: &str) -> Result<bool, GraphError> {
        let (target, data) = self.element_entry_mut(element)?;
        if key == "id" {
            return Ok(false);
        }
        let removed = data.remove_attribute(key);
        if removed {
            self.push_change(target, Change::Modified);
        }
        Ok(removed)
    }

    fn element_entry_mut(
        &mut self,
        id: Id,
    ) -> Result<(ChangeTarget, &mut GraphElement), GraphError> {
        if let Some(node) = self.nodes.get_mut(&id) {
            return Ok((ChangeTarget::Node(id), node.element_mut()));
        }
        if let Some(edge) = self.edges.get_mut(&id) {
            return Ok((ChangeTarget::Edge(id), edge.element_mut()));
        }
        if let Some(subgraph) = self.subgraphs.get_mut(&id) {
            return Ok((ChangeTarget::Subgraph(id), subgraph.element_mut()));
        }
        Err(GraphError::not_found(ElementKind::Element, id))
    }

    /// Sets graph-level attributes. Queues one event if any value changed.
    pub fn set_graph_attributes(&mut self, attrs: &AttributeStore) -> bool {
        let mut changed = false;
        for (key, value) in attrs.iter() {
            changed |= self.root.set_attribute(key, value);
        }
        if changed {
            self.push_change(ChangeTarget::Graph, Change::Modified);
        }
        changed
    }

    /// Selects `node` and deselects every other element.
    pub fn select_node(&mut self, node: Id) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::not_found(ElementKind::Node, node));
        }
        let mut changed = Vec::new();
        for n in self.nodes.values_mut() {
            let id = n.id();
            if n.element_mut().set_selected(id == node) {
                changed.push(ChangeTarget::Node(id));
            }
        }
        changed.extend(self.deselect_edges_and_subgraphs());
        for target in changed {
            self.push_change(target, Change::SelectionChanged);
        }
        Ok(())
    }

    /// Deselects every element.
    pub fn clear_selection(&mut self) {
        let mut changed = Vec::new();
        for n in self.nodes.values_mut() {
            if n.element_mut().set_selected(false) {
                changed.push(ChangeTarget::Node(n.id()));
            }
        }
        changed.extend(self.deselect_edges_and_subgraphs());
        for target in changed {
            self.push_change(target, Change::SelectionChanged);
        }
    }

    fn deselect_edges_and_subgraphs(&mut self) -> Vec<ChangeTarget> {
        let mut changed = Vec::new();
        for e in self.edges.values_mut() {
            if e.element_mut().set_selected(false) {
                changed.push(ChangeTarget::Edge(e.id()));
            }
        }
        for s in self.subgraphs.values_mut() {
            if s.element_mut().set_selected(false) {
                changed.push(ChangeTarget::Subgraph(s.id()));
            }
        }
        changed
    }

    /// Ids of selected nodes.
    pub fn selected_nodes(&self) -> Vec<Id> {
        self.nodes
            .values()
            .filter(|n| n.element().is_selected())
            .map(Node::id)
            .collect()
    }

    /// Reconciles this graph with a freshly laid-out version of itself.
    ///
    /// Elements present in both are merged with
    /// [`GraphElement::update_with_element`], queuing `Modified` when that
    /// reports a change; elements only in `fresh` are inserted with `Added`;
    /// elements only here are removed with `Removed`. The canvas size is taken
    /// from `fresh`. Selection of surviving elements is preserved.
    pub fn update_with_graph(&mut self, fresh: &Graph) {
        self.name = fresh.name.clone();
        self.directed = fresh.directed;
        self.strict = fresh.strict;
        self.width = fresh.width;
        self.height = fresh.height;
        if self.root.update_with_element(&fresh.root) {
            self.push_change(ChangeTarget::Graph, Change::Modified);
        }

        let stale_edges: Vec<Id> = self
            .edges
            .keys()
            .filter(|id| !fresh.edges.contains_key(*id))
            .copied()
            .collect();
        for id in stale_edges {
            self.edges.shift_remove(&id);
            self.push_change(ChangeTarget::Edge(id), Change::Removed);
        }
        let stale_subgraphs: Vec<Id> = self
            .subgraphs
            .keys()
            .filter(|id| !fresh.subgraphs.contains_key(*id))
            .copied()
            .collect();
        for id in stale_subgraphs {
            self.subgraphs.shift_remove(&id);
            self.push_change(ChangeTarget::Subgraph(id), Change::Removed);
        }
        let stale_nodes: Vec<Id> = self
            .nodes
            .keys()
            .filter(|id| !fresh.nodes.contains_key(*id))
            .copied()
            .collect();
        for id in stale_nodes {
            self.nodes.shift_remove(&id);
            self.push_change(ChangeTarget::Node(id), Change::Removed);
        }

        for (id, node) in &fresh.nodes {
            match self.nodes.get_mut(id) {
                Some(live) => {
                    if live.element_mut().update_with_element(node.element()) {
                        self.push_change(ChangeTarget::Node(*id), Change::Modified);
                    }
                }
                None => {
                    self.nodes.insert(*id, node.clone());
                    self.push_change(ChangeTarget::Node(*id), Change::Added);
                }
            }
        }

        for (id, edge) in &fresh.edges {
            match self.edges.get_mut(id) {
                Some(live) => {
                    let moved = live.set_endpoints(edge.source(), edge.target());
                    let merged = live.element_mut().update_with_element(edge.element());
                    if moved || merged {
                        self.push_change(ChangeTarget::Edge(*id), Change::Modified);
                    }
                }
                None => {
                    self.edges.insert(*id, edge.clone());
                    self.push_change(ChangeTarget::Edge(*id), Change::Added);
                }
            }
        }

        for (id, subgraph) in &fresh.subgraphs {
            match self.subgraphs.get_mut(id) {
                Some(live) => {
                    let regrouped = live.sync_members(subgraph);
                    let merged = live.element_mut().update_with_element(subgraph.element());
                    if regrouped || merged {
                        self.push_change(ChangeTarget::Subgraph(*id), Change::Modified);
                    }
                }
                None => {
                    self.subgraphs.insert(*id, subgraph.clone());
                    self.push_change(ChangeTarget::Subgraph(*id), Change::Added);
                }
            }
        }

        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            subgraphs = self.subgraphs.len(),
            changes = self.changes.len();
            "Graph updated from layout"
        );
    }
}
