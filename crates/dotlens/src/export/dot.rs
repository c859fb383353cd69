//! DOT writer.
//!
//! The document has the shape
//!
//! ```text
//! digraph "name" {
//!   graph [bgcolor="white"]
//!   subgraph "cluster_0" { graph [label="group"] "a"; }
//!   "a" [label="A"]
//!   "a" -> "b" [id="a->b"]
//! }
//! ```
//!
//! Subgraphs come first, nested under their first parent and listing their
//! member nodes, then nodes, then edges, each in collection order.
//!
//! Per element, attributes are written as `key="value"` with newlines
//! escaped as `\n` and quotes as `\"`. Empty values and xdot draw
//! attributes are skipped. When the element remembers which attributes the
//! source gave it, only those are written.
//!
//! With layout enabled the output is an xdot document: draw attributes and
//! the layout geometry keys are written for every element.

use std::{collections::HashSet, fmt::Write as _, fs, path::Path};

use log::{debug, info};

use dotlens_core::{
    element::{GraphElement, is_draw_attribute},
    graph::Graph,
    identifier::Id,
};

use super::Error;

/// Geometry Graphviz adds when laying a graph out.
const LAYOUT_ATTRIBUTES: [&str; 8] = [
    "bb", "pos", "width", "height", "lp", "xlp", "head_lp", "tail_lp",
];

/// Writes `graph` as DOT text without layout attributes.
///
/// # Examples
///
/// ```
/// use dotlens::export::dot::write_dot;
///
/// let graph = dotlens_parser::parse("digraph g { a -> b [color=red] }").unwrap();
/// let text = write_dot(&graph);
/// assert!(text.starts_with("digraph \"g\" {"));
/// assert!(text.contains("\"a\" -> \"b\" [color=\"red\", id=\"a->b\"]"));
/// ```
pub fn write_dot(graph: &Graph) -> String {
    DotWriter::new(graph).write()
}

/// Writes `graph` to a DOT file.
pub fn save_dot(graph: &Graph, path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    info!(path = path.display().to_string(); "Saving DOT file");
    fs::write(path, write_dot(graph)).map_err(Error::Io)
}

/// Configurable DOT writer.
#[derive(Debug)]
pub struct DotWriter<'a> {
    graph: &'a Graph,
    layout: bool,
}

impl<'a> DotWriter<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            layout: false,
        }
    }

    /// Also writes the xdot draw attributes and layout geometry, producing an
    /// xdot document.
    pub fn with_layout(mut self, layout: bool) -> Self {
        self.layout = layout;
        self
    }

    pub fn write(&self) -> String {
        let graph = self.graph;
        let mut out = String::new();

        if graph.strict() {
            out.push_str("strict ");
        }
        let kind = if graph.directed() { "digraph" } else { "graph" };
        let _ = writeln!(out, "{kind} {} {{", quote(graph.name()));

        let root = self.attribute_list(graph.root(), false);
        if !root.is_empty() {
            let _ = writeln!(out, "  graph [{root}]");
        }

        let mut written = HashSet::new();
        for subgraph in graph.subgraphs() {
            if graph.parents_of(subgraph.id()).is_empty() {
                self.write_subgraph(&mut out, subgraph.id(), 1, &mut written);
            }
        }
        // Subgraphs only reachable through a cycle of parents.
        for subgraph in graph.subgraphs() {
            if !written.contains(&subgraph.id()) {
                self.write_subgraph(&mut out, subgraph.id(), 1, &mut written);
            }
        }

        for node in graph.nodes() {
            let attrs = self.attribute_list(node.element(), true);
            if attrs.is_empty() {
                let _ = writeln!(out, "  {}", quote_id(node.id()));
            } else {
                let _ = writeln!(out, "  {} [{attrs}]", quote_id(node.id()));
            }
        }

        let op = if graph.directed() { "->" } else { "--" };
        for edge in graph.edges() {
            let attrs = self.attribute_list(edge.element(), false);
            let _ = write!(
                out,
                "  {} {op} {}",
                quote_id(edge.source()),
                quote_id(edge.target())
            );
            if attrs.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, " [{attrs}]");
            }
        }

        out.push_str("}\n");
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            bytes = out.len();
            "DOT document written"
        );
        out
    }

    /// Writes a subgraph block with its attributes, nested subgraphs and
    /// member nodes. A subgraph already written under another parent is
    /// reopened empty so the extra membership survives.
    fn write_subgraph(&self, out: &mut String, id: Id, depth: usize, written: &mut HashSet<Id>) {
        let indent = "  ".repeat(depth);
        if !written.insert(id) {
            let _ = writeln!(out, "{indent}subgraph {} {{}}", quote_id(id));
            return;
        }
        let Some(subgraph) = self.graph.subgraph(id) else {
            return;
        };

        let _ = writeln!(out, "{indent}subgraph {} {{", quote_id(id));
        let attrs = self.attribute_list(subgraph.element(), true);
        if !attrs.is_empty() {
            let _ = writeln!(out, "{indent}  graph [{attrs}]");
        }
        for child in subgraph.subgraphs() {
            self.write_subgraph(out, child, depth + 1, written);
        }
        for node in subgraph.nodes() {
            let _ = writeln!(out, "{indent}  {};", quote_id(node));
        }
        let _ = writeln!(out, "{indent}}}");
    }

    /// The `key="value", ...` list of one element.
    ///
    /// `named` elements (nodes and subgraphs) are identified by their
    /// statement, so their `id` attribute is left out.
    fn attribute_list(&self, element: &GraphElement, named: bool) -> String {
        let original = element.original_attribute_keys();
        element
            .attributes()
            .iter()
            .filter(|(key, value)| {
                if value.is_empty() || (named && *key == "id") {
                    return false;
                }
                if is_draw_attribute(key) {
                    return self.layout;
                }
                if self.layout && LAYOUT_ATTRIBUTES.contains(key) {
                    return true;
                }
                original.is_none_or(|keys| keys.contains(*key))
            })
            .map(|(key, value)| format!("{key}={}", quote_value(value)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Quotes an attribute value; HTML-like values stay bare.
fn quote_value(value: &str) -> String {
    if value.starts_with('<') && value.ends_with('>') {
        return value.to_string();
    }
    quote(value)
}

fn quote_id(id: Id) -> String {
    quote(&id.to_string())
}

/// Quotes `text` so the parser reads it back.
///
/// A backslash and the character after it are kept as a pair, as the parser
/// keeps them. A backslash with nothing to pair with (at the end, or before a
/// quote or line break) is doubled, which Graphviz reads as a literal
/// backslash.
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                None | Some('"' | '\n' | '\r') => quoted.push_str("\\\\"),
                Some(_) => {
                    quoted.push('\\');
                    quoted.extend(chars.next());
                }
            },
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
