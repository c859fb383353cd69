//! Layout through a Graphviz child process.

use std::{
    io::{self, Read, Seek, SeekFrom, Write},
    process::{Command, Stdio},
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use wait_timeout::ChildExt;

use dotlens_core::{engine::LayoutAlgorithm, graph::Graph};

use super::{CancelToken, LayoutEngine, LayoutError};
use crate::export::dot;

/// How long the child is waited on between cancellation checks.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs a layout command such as `dot -Txdot` on the graph's DOT text.
///
/// The graph is written to a temporary file that becomes the child's stdin;
/// stdout and stderr are captured in temporary files so a chatty child can
/// never block on a full pipe. The child is killed when the [`CancelToken`]
/// fires or the timeout expires.
#[derive(Debug, Clone)]
pub struct ExternalEngine {
    algorithm: LayoutAlgorithm,
    command: Option<String>,
    timeout: Duration,
}

impl ExternalEngine {
    pub fn new(algorithm: LayoutAlgorithm) -> Self {
        Self {
            algorithm,
            command: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Uses an explicit command line instead of the algorithm's default.
    pub fn with_command(mut self, command: Option<String>) -> Self {
        self.command = command.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The command line used for `graph`.
    ///
    /// Without an explicit command, directed graphs go through `dot` and
    /// undirected ones through `neato` unless an algorithm is configured.
    pub fn command_line(&self, graph: &Graph) -> String {
        match &self.command {
            Some(command) => command.clone(),
            None => self.algorithm.command(graph.directed()),
        }
    }

    fn run(&self, command_line: &str, source: &str, cancel: &CancelToken) -> Result<String, LayoutError> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or(LayoutError::EmptyCommand)?;

        let mut input = tempfile::NamedTempFile::new()?;
        input.write_all(source.as_bytes())?;
        input.flush()?;
        let mut stdout = tempfile::tempfile()?;
        let mut stderr = tempfile::tempfile()?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::from(input.reopen()?))
            .stdout(Stdio::from(stdout.try_clone()?))
            .stderr(Stdio::from(stderr.try_clone()?))
            .spawn()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => LayoutError::CommandNotFound {
                    program: program.to_string(),
                },
                _ => LayoutError::Spawn(err),
            })?;
        debug!(program, pid = child.id(); "Layout process started");

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                info!(program; "Layout process killed on cancel");
                return Err(LayoutError::Cancelled);
            }
            if let Some(status) = child.wait_timeout(POLL_INTERVAL)? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                warn!(program, timeout_secs = self.timeout.as_secs(); "Layout process timed out");
                return Err(LayoutError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !status.success() {
            let mut message = String::new();
            stderr.seek(SeekFrom::Start(0))?;
            stderr.read_to_string(&mut message)?;
            return Err(LayoutError::ExitStatus {
                code: status.code(),
                stderr: message.trim().to_string(),
            });
        }

        let mut output = String::new();
        stdout.seek(SeekFrom::Start(0))?;
        stdout.read_to_string(&mut output)?;
        Ok(output)
    }
}

impl Default for ExternalEngine {
    fn default() -> Self {
        Self::new(LayoutAlgorithm::default())
    }
}

impl LayoutEngine for ExternalEngine {
    fn layout(&self, graph: &Graph, cancel: &CancelToken) -> Result<Graph, LayoutError> {
        cancel.check()?;
        let command_line = self.command_line(graph);
        info!(command = command_line; "Running external layout");

        let source = dot::write_dot(graph);
        let output = self.run(&command_line, &source, cancel)?;
        debug!(bytes = output.len(); "Layout output captured");

        dotlens_parser::parse(&output).map_err(|err| LayoutError::InvalidOutput { err, src: output })
    }
}
