//! Export functionality for Dotlens graphs.
//!
//! # Pipeline Position
//!
//! ```text
//! DOT source
//!     ↓ parse
//! Graph
//!     ↓ layout
//! Laid-out Graph (render operations)
//!     ↓ scene sync
//! Scene (screen-space primitives)
//!     ↓ export (this module)
//! Output File
//! ```
//!
//! # Available Backends
//!
//! - [`dot`]: DOT text written straight from the [`Graph`](dotlens_core::graph::Graph)
//! - [`svg`]: SVG output of a [`Scene`] via [`svg::Svg`]
//!
//! # Error Handling
//!
//! Export operations return [`Error`], covering rendering failures and I/O
//! errors. [`Error`] converts into [`DotlensError::Export`] at the crate
//! boundary.
//!
//! [`DotlensError::Export`]: crate::DotlensError::Export

pub mod dot;
pub mod svg;

use crate::scene::Scene;

/// Abstraction for scene export backends.
///
/// Implementors convert a [`Scene`] into a specific output format
/// (e.g., SVG).
pub trait Exporter {
    /// Exports a scene to the backend's output format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the scene cannot be converted to the
    /// target format, or [`Error::Io`] if writing the output fails.
    fn export_scene(&mut self, scene: &Scene) -> Result<(), Error>;
}

/// Errors that can occur during export.
///
/// This type is converted into [`DotlensError::Export`] at the crate
/// boundary via the [`From`] implementation in [`crate::error`].
///
/// [`DotlensError::Export`]: crate::DotlensError::Export
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}
