//! Error and diagnostic system for the Dotlens parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning with optional error code, source locations, and
//! help text. Multiple diagnostics are wrapped in [`ParseError`] for returning
//! from [`parse`](crate::parse).
//!
//! # Example
//!
//! ```
//! # use dotlens_parser::error::{Diagnostic, ErrorCode};
//! # use dotlens_parser::Span;
//!
//! let diag = Diagnostic::error("`->` used in an undirected graph")
//!     .with_code(ErrorCode::E200)
//!     .with_label(Span::new(12..14), "directed edge operator")
//!     .with_secondary_label(Span::new(0..5), "graph declared undirected here")
//!     .with_help("use `--` or declare the graph with `digraph`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
