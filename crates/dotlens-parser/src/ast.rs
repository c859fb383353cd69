//! Syntax tree produced by the DOT [`parser`](crate::parser).
//!
//! The tree mirrors the DOT grammar closely; attribute defaults, subgraph
//! membership and edge expansion are resolved later during elaboration.

use crate::span::{Span, Spanned};

/// A complete `[strict] (graph | digraph) [ID] { ... }` document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub strict: bool,
    /// Whether the document is a `digraph`; the span covers the keyword.
    pub directed: Spanned<bool>,
    pub name: Option<Spanned<String>>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `a:port [attrs]`
    Node {
        id: Spanned<String>,
        port: Option<Spanned<String>>,
        attributes: Vec<Attribute>,
    },
    /// `a -> b -> { c d } [attrs]`
    Edge {
        endpoints: Vec<EdgeEndpoint>,
        operators: Vec<Spanned<EdgeOp>>,
        attributes: Vec<Attribute>,
    },
    /// `graph|node|edge [attrs]`
    Attr {
        target: AttrTarget,
        attributes: Vec<Attribute>,
    },
    /// `key = value` at statement level, a graph attribute
    Assign(Attribute),
    Subgraph(SubgraphBlock),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrTarget {
    Graph,
    Node,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOp {
    /// `->`
    Directed,
    /// `--`
    Undirected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeEndpoint {
    Node {
        id: Spanned<String>,
        port: Option<Spanned<String>>,
    },
    Subgraph(SubgraphBlock),
}

/// `[subgraph [ID]] { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphBlock {
    pub name: Option<Spanned<String>>,
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// A single `name = value` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: Spanned<String>,
    pub value: Spanned<String>,
}

impl Attribute {
    pub fn new(name: Spanned<String>, value: Spanned<String>) -> Self {
        Self { name, value }
    }

    pub fn span(&self) -> Span {
        self.name.span().union(self.value.span())
    }
}
