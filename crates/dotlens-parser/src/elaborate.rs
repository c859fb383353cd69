//! Elaboration of a DOT syntax tree into a [`Graph`].
//!
//! This phase resolves what the grammar leaves implicit: scoped `node` and
//! `edge` defaults, subgraph membership, edge chains and subgraph endpoints,
//! strict-graph edge merging, xdot drawing attributes and the canvas size.

use indexmap::IndexSet;
use log::{debug, info, trace};

use dotlens_core::{
    GraphError,
    attributes::AttributeStore,
    element::{DRAW_ATTRIBUTES, GraphElement, is_draw_attribute},
    graph::Graph,
    identifier::Id,
};

use crate::{
    ast::{AttrTarget, Attribute, Document, EdgeEndpoint, EdgeOp, Statement, SubgraphBlock},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Span, Spanned},
    xdot,
};

/// Attribute defaults and the enclosing subgraph of a statement list.
#[derive(Debug, Clone, Default)]
struct Scope {
    node_defaults: AttributeStore,
    edge_defaults: AttributeStore,
    subgraph: Option<Id>,
}

/// One node an edge endpoint expands to, with the port written after it.
type EndpointNode<'d> = (Id, Option<&'d Spanned<String>>);

pub struct Builder {
    graph: Graph,
    diagnostics: DiagnosticCollector,
    /// Span of the `graph`/`digraph` keyword
    kind_span: Span,
    next_anonymous: usize,
}

impl Builder {
    pub fn new(document: &Document) -> Self {
        let name = document
            .name
            .as_ref()
            .map(|name| name.inner().clone())
            .unwrap_or_default();
        let mut graph = Graph::new(name, *document.directed.inner());
        graph.set_strict(document.strict);

        Self {
            graph,
            diagnostics: DiagnosticCollector::new(),
            kind_span: document.directed.span(),
            next_anonymous: 0,
        }
    }

    pub fn build(mut self, document: &Document) -> Result<Graph, ParseError> {
        debug!(
            name = self.graph.name(),
            directed = self.graph.directed(),
            strict = self.graph.strict();
            "Elaborating graph",
        );

        let mut scope = Scope::default();
        self.statements(&document.statements, &mut scope);
        let graph = self.finish()?;

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            subgraphs = graph.subgraph_count();
            "Graph elaborated",
        );
        Ok(graph)
    }

    // ============================================================================
    // Statements
    // ============================================================================

    fn statements(&mut self, statements: &[Statement], scope: &mut Scope) {
        for statement in statements {
            let result = match statement {
                Statement::Node { id, attributes, .. } => {
                    self.node_statement(id, attributes, scope)
                }
                Statement::Edge {
                    endpoints,
                    operators,
                    attributes,
                } => self.edge_statement(endpoints, operators, attributes, scope),
                Statement::Attr { target, attributes } => {
                    self.attr_statement(*target, attributes, scope);
                    Ok(())
                }
                Statement::Assign(attribute) => {
                    self.graph_attribute(attribute, scope);
                    Ok(())
                }
                Statement::Subgraph(block) => self.subgraph_block(block, scope).map(|_| ()),
            };

            if let Err(err) = result {
                self.diagnostics.emit(
                    Diagnostic::error(err.to_string())
                        .with_label(statement_span(statement), "in this statement"),
                );
            }
        }
    }

    fn node_statement(
        &mut self,
        id: &Spanned<String>,
        attributes: &[Attribute],
        scope: &Scope,
    ) -> Result<(), GraphError> {
        let node = self.ensure_node(id, scope)?;
        for attribute in attributes {
            let (name, value) = (attribute.name.inner(), attribute.value.inner());
            if name == "id" {
                if value != id.inner() {
                    self.ignored_id(attribute, "a node is identified by its name");
                }
                continue;
            }
            self.check_draw_attribute(attribute);
            if let Some(node) = self.graph.node_mut(node) {
                node.element_mut().set_attribute(name, value);
            }
        }
        Ok(())
    }

    fn attr_statement(&mut self, target: AttrTarget, attributes: &[Attribute], scope: &mut Scope) {
        for attribute in attributes {
            let (name, value) = (attribute.name.inner(), attribute.value.inner());
            match target {
                AttrTarget::Graph => self.graph_attribute(attribute, scope),
                AttrTarget::Node | AttrTarget::Edge if name == "id" => {
                    self.ignored_id(attribute, "`id` cannot be a default; set it per element");
                }
                AttrTarget::Node => {
                    scope.node_defaults.set(name.as_str(), value.as_str());
                }
                AttrTarget::Edge => {
                    scope.edge_defaults.set(name.as_str(), value.as_str());
                }
            }
        }
    }

    /// Sets a graph attribute on the enclosing subgraph, or the root graph.
    fn graph_attribute(&mut self, attribute: &Attribute, scope: &Scope) {
        let (name, value) = (attribute.name.inner(), attribute.value.inner());
        self.check_draw_attribute(attribute);
        match scope.subgraph {
            Some(subgraph) => {
                if name == "id" {
                    self.ignored_id(attribute, "a subgraph is identified by its name");
                    return;
                }
                if let Some(sg) = self.graph.subgraph_mut(subgraph) {
                    sg.element_mut().set_attribute(name, value);
                }
            }
            None => {
                self.graph.root_mut().set_attribute(name, value);
            }
        }
    }

    fn subgraph_block(&mut self, block: &SubgraphBlock, scope: &Scope) -> Result<Id, GraphError> {
        let id = match &block.name {
            Some(name) => Id::new(name.inner()),
            None => self.anonymous_subgraph_id(),
        };

        if self.graph.subgraph(id).is_none() {
            self.graph
                .add_subgraph(AttributeStore::from_iter([("id", id.to_string())]))?;
        }
        if let Some(parent) = scope.subgraph {
            if !self.is_ancestor_or_self(id, parent) {
                self.graph.add_subgraph_to_subgraph(id, parent)?;
            }
        }

        trace!(subgraph:% = id; "Entering subgraph");
        let mut inner = Scope {
            subgraph: Some(id),
            ..scope.clone()
        };
        self.statements(&block.statements, &mut inner);
        Ok(id)
    }

    fn edge_statement(
        &mut self,
        endpoints: &[EdgeEndpoint],
        operators: &[Spanned<EdgeOp>],
        attributes: &[Attribute],
        scope: &Scope,
    ) -> Result<(), GraphError> {
        for op in operators {
            self.check_edge_op(op);
        }

        let mut groups = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            groups.push(self.endpoint_nodes(endpoint, scope)?);
        }

        for pair in groups.windows(2) {
            for &(tail, tail_port) in &pair[0] {
                for &(head, head_port) in &pair[1] {
                    self.add_edge(tail, head, tail_port, head_port, attributes, scope)?;
                }
            }
        }
        Ok(())
    }

    // ============================================================================
    // Elements
    // ============================================================================

    /// Creates the node with the scope's defaults if it does not exist yet,
    /// and records it as a member of the enclosing subgraph.
    fn ensure_node(&mut self, id: &Spanned<String>, scope: &Scope) -> Result<Id, GraphError> {
        let node = Id::new(id.inner());
        if self.graph.node(node).is_none() {
            let mut attrs = scope.node_defaults.clone();
            attrs.set("id", id.inner().as_str());
            self.graph.add_node(attrs)?;
        }
        if let Some(subgraph) = scope.subgraph {
            self.graph.add_existing_node_to_subgraph(node, subgraph)?;
        }
        Ok(node)
    }

    /// The nodes an edge endpoint stands for: the node itself, or every node
    /// of a subgraph including its nested subgraphs.
    fn endpoint_nodes<'d>(
        &mut self,
        endpoint: &'d EdgeEndpoint,
        scope: &Scope,
    ) -> Result<Vec<EndpointNode<'d>>, GraphError> {
        match endpoint {
            EdgeEndpoint::Node { id, port } => Ok(vec![(self.ensure_node(id, scope)?, port.as_ref())]),
            EdgeEndpoint::Subgraph(block) => {
                let subgraph = self.subgraph_block(block, scope)?;
                Ok(self
                    .subgraph_nodes(subgraph)
                    .into_iter()
                    .map(|node| (node, None))
                    .collect())
            }
        }
    }

    fn add_edge(
        &mut self,
        tail: Id,
        head: Id,
        tail_port: Option<&Spanned<String>>,
        head_port: Option<&Spanned<String>>,
        attributes: &[Attribute],
        scope: &Scope,
    ) -> Result<(), GraphError> {
        let mut attrs = scope.edge_defaults.clone();
        let mut explicit_id = None;
        for attribute in attributes {
            if attribute.name.inner() == "id" {
                explicit_id = Some(attribute);
                continue;
            }
            self.check_draw_attribute(attribute);
            attrs.set(attribute.name.inner().as_str(), attribute.value.inner().as_str());
        }
        if let Some(port) = tail_port {
            attrs.set("tailport", port.inner().as_str());
        }
        if let Some(port) = head_port {
            attrs.set("headport", port.inner().as_str());
        }

        if self.graph.strict() {
            if let Some(existing) = self.find_edge(tail, head) {
                trace!(edge:% = existing; "Merging edge in strict graph");
                if let Some(edge) = self.graph.edge_mut(existing) {
                    for (key, value) in attrs.iter() {
                        edge.element_mut().set_attribute(key, value);
                    }
                }
                return Ok(());
            }
        }

        if let Some(attribute) = explicit_id {
            let value = attribute.value.inner();
            if self.graph.contains_element(Id::new(value)) {
                self.diagnostics.emit(
                    Diagnostic::warning(format!("edge id `{value}` is already in use"))
                        .with_code(ErrorCode::E201)
                        .with_label(attribute.span(), "duplicate edge id")
                        .with_help("a generated id is used for this edge instead"),
                );
            } else {
                attrs.set("id", value.as_str());
            }
        }

        self.graph.add_edge(tail, head, attrs)?;
        Ok(())
    }

    /// An existing edge joining `tail` and `head`, in either direction for
    /// undirected graphs.
    fn find_edge(&self, tail: Id, head: Id) -> Option<Id> {
        let directed = self.graph.directed();
        self.graph
            .edges()
            .find(|edge| {
                (edge.source() == tail && edge.target() == head)
                    || (!directed && edge.source() == head && edge.target() == tail)
            })
            .map(|edge| edge.id())
    }

    fn anonymous_subgraph_id(&mut self) -> Id {
        loop {
            let id = Id::from_anonymous(self.next_anonymous);
            self.next_anonymous += 1;
            if !self.graph.contains_element(id) {
                return id;
            }
        }
    }

    /// All nodes of `subgraph` and its nested subgraphs, in declaration order.
    fn subgraph_nodes(&self, subgraph: Id) -> Vec<Id> {
        let mut nodes = IndexSet::new();
        let mut visited = IndexSet::new();
        let mut pending = vec![subgraph];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(sg) = self.graph.subgraph(current) {
                nodes.extend(sg.nodes());
                pending.extend(sg.subgraphs().collect::<Vec<_>>().into_iter().rev());
            }
        }
        nodes.into_iter().collect()
    }

    /// True if `candidate` is `subgraph` or one of its ancestors.
    fn is_ancestor_or_self(&self, candidate: Id, subgraph: Id) -> bool {
        let mut visited = IndexSet::new();
        let mut pending = vec![subgraph];
        while let Some(current) = pending.pop() {
            if current == candidate {
                return true;
            }
            if visited.insert(current) {
                pending.extend(self.graph.parents_of(current));
            }
        }
        false
    }

    // ============================================================================
    // Diagnostics
    // ============================================================================

    fn check_edge_op(&mut self, op: &Spanned<EdgeOp>) {
        let directed = self.graph.directed();
        let (message, help) = match (*op.inner(), directed) {
            (EdgeOp::Directed, false) => (
                "`->` used in an undirected graph",
                "use `--` or declare the graph with `digraph`",
            ),
            (EdgeOp::Undirected, true) => (
                "`--` used in a directed graph",
                "use `->` or declare the graph with `graph`",
            ),
            _ => return,
        };
        let declared = if directed {
            "graph declared directed here"
        } else {
            "graph declared undirected here"
        };
        self.diagnostics.emit(
            Diagnostic::error(message)
                .with_code(ErrorCode::E200)
                .with_label(op.span(), "edge operator")
                .with_secondary_label(self.kind_span, declared)
                .with_help(help),
        );
    }

    /// Reports malformed xdot in a drawing attribute at the value's span.
    fn check_draw_attribute(&mut self, attribute: &Attribute) {
        if !is_draw_attribute(attribute.name.inner()) {
            return;
        }
        if let Err(err) = xdot::parse_render_ops(attribute.value.inner()) {
            self.diagnostics
                .emit(err.to_diagnostic(attribute.value.span()));
        }
    }

    fn ignored_id(&mut self, attribute: &Attribute, help: &'static str) {
        self.diagnostics.emit(
            Diagnostic::warning("`id` attribute ignored")
                .with_label(attribute.span(), "ignored attribute")
                .with_help(help),
        );
    }

    // ============================================================================
    // Finishing
    // ============================================================================

    fn finish(mut self) -> Result<Graph, ParseError> {
        let bounding_box = self.graph.root().attributes().value("bb").map(str::to_owned);
        if let Some(bb) = bounding_box {
            match parse_bounding_box(&bb) {
                Some((width, height)) => self.graph.set_canvas_size(width, height),
                None => {
                    self.diagnostics.emit(
                        Diagnostic::warning(format!("malformed bounding box `{bb}`"))
                            .with_help("expected `llx,lly,urx,ury`; the canvas size is left at 0"),
                    );
                }
            }
        }

        finish_element(self.graph.root_mut());
        let nodes: Vec<Id> = self.graph.nodes().map(|n| n.id()).collect();
        for id in nodes {
            if let Some(node) = self.graph.node_mut(id) {
                finish_element(node.element_mut());
            }
        }
        let edges: Vec<Id> = self.graph.edges().map(|e| e.id()).collect();
        for id in edges {
            if let Some(edge) = self.graph.edge_mut(id) {
                finish_element(edge.element_mut());
            }
        }
        let subgraphs: Vec<Id> = self.graph.subgraphs().map(|s| s.id()).collect();
        for id in subgraphs {
            if let Some(sg) = self.graph.subgraph_mut(id) {
                finish_element(sg.element_mut());
            }
        }

        // A freshly parsed graph has no history.
        self.graph.take_changes();

        self.diagnostics.finish()?;
        Ok(self.graph)
    }
}

/// Decodes drawing attributes into render ops and records the element's
/// attribute keys as its original set.
fn finish_element(element: &mut GraphElement) {
    let mut ops = Vec::new();
    for key in DRAW_ATTRIBUTES {
        if let Some(value) = element.attributes().value(key) {
            // Malformed streams were reported when the attribute was set.
            ops.extend(xdot::parse_render_ops(value).unwrap_or_default());
        }
    }
    if !ops.is_empty() {
        element.set_render_ops(ops);
    }
    element.store_original_attributes();
}

/// Canvas size from a `bb` value `llx,lly,urx,ury`.
///
/// The canvas extends from the layout origin, so its size is the upper-right
/// corner.
fn parse_bounding_box(value: &str) -> Option<(f64, f64)> {
    let coords: Vec<f64> = value
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect::<Option<_>>()?;
    match coords.as_slice() {
        [_, _, urx, ury] => Some((*urx, *ury)),
        _ => None,
    }
}

fn statement_span(statement: &Statement) -> Span {
    match statement {
        Statement::Node { id, .. } => id.span(),
        Statement::Edge { operators, .. } => operators
            .iter()
            .map(|op| op.span())
            .reduce(Span::union)
            .unwrap_or_default(),
        Statement::Attr { attributes, .. } => attributes
            .iter()
            .map(Attribute::span)
            .reduce(Span::union)
            .unwrap_or_default(),
        Statement::Assign(attribute) => attribute.span(),
        Statement::Subgraph(block) => block.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounding_box() {
        assert_eq!(parse_bounding_box("0,0,62,108"), Some((62.0, 108.0)));
        assert_eq!(parse_bounding_box("0, 0, 62.5, 108"), Some((62.5, 108.0)));
        assert_eq!(parse_bounding_box("0,0,62"), None);
        assert_eq!(parse_bounding_box("a,b,c,d"), None);
    }

    #[test]
    fn test_finish_element_collects_ops_in_draw_order() {
        let mut element = GraphElement::with_attributes(AttributeStore::from_iter([
            ("_ldraw_", "T 27 14 0 7 1 -a"),
            ("_draw_", "e 27 18 27 18"),
            ("label", "a"),
        ]));
        finish_element(&mut element);

        let codes: Vec<char> = element.render_ops().iter().map(|op| op.kind().code()).collect();
        assert_eq!(codes, ['e', 'T']);
        assert!(element.original_attribute_keys().unwrap().contains("label"));
    }
}
