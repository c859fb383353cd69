//! # Dotlens Parser
//!
//! Parser for the Graphviz DOT language and the xdot drawing attributes that
//! layout engines attach to it. This crate turns source text into a
//! [`Graph`](dotlens_core::graph::Graph) whose elements carry their attributes
//! and, for laid-out input, their render operations.
//!
//! ## Usage
//!
//! ```
//! # use dotlens_parser::{parse, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         digraph G {
//!             node [shape=box];
//!             a -> b -> c;
//!             subgraph cluster_0 { label = "group"; b; c }
//!         }
//!     "#;
//!
//!     let graph = parse(source)?;
//!     assert_eq!(graph.node_count(), 3);
//!     assert_eq!(graph.edge_count(), 2);
//!     Ok(())
//! }
//! ```

mod ast;
mod elaborate;
pub mod error;
mod lexer;
mod parser;
mod span;
mod tokens;
pub mod xdot;

pub use span::Span;

use dotlens_core::graph::Graph;

use elaborate::Builder;
use error::ParseError;

/// Parse DOT source text into a graph.
///
/// This is the main entry point of the crate. It runs the complete pipeline:
///
/// 1. **Tokenize** - Convert source text to tokens, reporting every lexical error
/// 2. **Parse** - Build the syntax tree from the significant tokens
/// 3. **Elaborate** - Resolve defaults, membership and edge chains into a [`Graph`]
///
/// Drawing attributes (`_draw_`, `_ldraw_`, ...) are decoded into render
/// operations, and a `bb` graph attribute sets the canvas size. The returned
/// graph has no queued change events.
///
/// # Errors
///
/// Returns a [`ParseError`] holding every diagnostic when the source is not
/// valid DOT.
pub fn parse(source: &str) -> Result<Graph, ParseError> {
    // Step 1: Tokenize
    let tokens = lexer::tokenize(source)?;
    let significant: Vec<_> = tokens
        .into_iter()
        .filter(|token| !token.token.is_trivia())
        .collect();

    // Step 2: Parse
    let document = parser::build_document(&significant)?;

    // Step 3: Elaborate
    Builder::new(&document).build(&document)
}
