//! Error types for Dotlens operations.
//!
//! This module provides the main error type [`DotlensError`] which wraps
//! the error conditions of loading, laying out, editing and exporting graphs.

use std::io;

use thiserror::Error;

use dotlens_core::GraphError;
use dotlens_parser::error::ParseError;

use crate::layout::LayoutError;

/// The main error type for Dotlens operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant contains structured error information with source code
/// spans. This provides detailed error information that can be used for rich
/// error reporting.
#[derive(Debug, Error)]
pub enum DotlensError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("the view is read-only")]
    ReadOnly,
}

impl From<crate::export::Error> for DotlensError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl DotlensError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
