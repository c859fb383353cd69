//! Layout engines.
//!
//! A [`LayoutEngine`] takes a graph and returns a laid-out copy whose
//! elements carry render operations and xdot draw attributes. Two engines
//! exist:
//!
//! - [`ExternalEngine`] runs a Graphviz command and parses its xdot output
//! - [`EmbeddedEngine`] lays out in-process with the layered (Sugiyama)
//!   algorithm and synthesizes the same xdot shapes
//!
//! Layouts can run in the background through a [`LayoutJob`], which carries
//! a [`CancelToken`] that stops the engine (and kills a child process).

mod embedded;
mod external;
mod job;

pub use embedded::EmbeddedEngine;
pub use external::ExternalEngine;
pub use job::LayoutJob;

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use log::debug;
use thiserror::Error;

use dotlens_core::{engine::LayoutMethod, graph::Graph};
use dotlens_parser::error::ParseError;

use crate::config::LayoutConfig;

/// Errors raised while laying out a graph.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout command `{program}` not found")]
    CommandNotFound { program: String },

    #[error("layout command is empty")]
    EmptyCommand,

    #[error("failed to run layout command: {0}")]
    Spawn(#[from] io::Error),

    #[error("layout command failed with exit code {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },

    #[error("layout command did not finish within {secs} seconds")]
    Timeout { secs: u64 },

    #[error("layout was cancelled")]
    Cancelled,

    #[error("layout output is not valid xdot: {err}")]
    InvalidOutput { err: ParseError, src: String },

    #[error("{0}")]
    Engine(String),
}

/// Shared flag that asks a running layout to stop.
///
/// Clones share the flag, so the token handed to a worker can be cancelled
/// from the thread that started it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`LayoutError::Cancelled`] once the token is cancelled.
    pub fn check(&self) -> Result<(), LayoutError> {
        if self.is_cancelled() {
            return Err(LayoutError::Cancelled);
        }
        Ok(())
    }
}

/// Computes geometry for a graph.
///
/// Implementations must not modify `graph`; the result is a new graph with
/// the same elements, laid out, and an empty change queue.
pub trait LayoutEngine: Send {
    fn layout(&self, graph: &Graph, cancel: &CancelToken) -> Result<Graph, LayoutError>;
}

/// Creates the engine selected by `config`.
pub fn build_engine(config: &LayoutConfig) -> Box<dyn LayoutEngine> {
    debug!(method:% = config.method, algorithm:% = config.algorithm; "Building layout engine");
    match config.method {
        LayoutMethod::External => Box::new(
            ExternalEngine::new(config.algorithm)
                .with_command(config.command.clone())
                .with_timeout(config.timeout()),
        ),
        LayoutMethod::Embedded => Box::new(EmbeddedEngine::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());

        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(LayoutError::Cancelled)));
    }
}
