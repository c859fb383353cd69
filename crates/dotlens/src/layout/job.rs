//! Background layout runs.

use std::{
    sync::mpsc::{self, Receiver, TryRecvError},
    thread::{self, JoinHandle},
};

use log::{debug, trace};

use dotlens_core::graph::Graph;

use super::{CancelToken, LayoutEngine, LayoutError};

type LayoutResult = Result<Graph, LayoutError>;

/// A layout running on a worker thread.
///
/// The result is delivered over a channel and can be polled with
/// [`try_take`](Self::try_take) or awaited with [`wait`](Self::wait).
/// Dropping an unfinished job cancels it.
///
/// # Examples
///
/// ```
/// use dotlens::layout::{EmbeddedEngine, LayoutJob};
/// use dotlens_core::graph::Graph;
///
/// let job = LayoutJob::spawn(Box::new(EmbeddedEngine::new()), Graph::new("g", true)).unwrap();
/// let laid_out = job.wait().unwrap();
/// assert_eq!(laid_out.node_count(), 0);
/// ```
#[derive(Debug)]
pub struct LayoutJob {
    cancel: CancelToken,
    receiver: Receiver<LayoutResult>,
    handle: Option<JoinHandle<()>>,
}

impl LayoutJob {
    /// Starts laying out `graph` with `engine` on a new thread.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Spawn`] when the thread cannot be created.
    pub fn spawn(engine: Box<dyn LayoutEngine>, graph: Graph) -> Result<Self, LayoutError> {
        let cancel = CancelToken::new();
        let (sender, receiver) = mpsc::channel();

        let token = cancel.clone();
        let handle = thread::Builder::new()
            .name("dotlens-layout".to_string())
            .spawn(move || {
                let result = engine.layout(&graph, &token);
                trace!(ok = result.is_ok(); "Layout worker finished");
                // The job may have been dropped; nobody is waiting then.
                let _ = sender.send(result);
            })?;
        debug!("Layout job spawned");

        Ok(Self {
            cancel,
            receiver,
            handle: Some(handle),
        })
    }

    /// Asks the engine to stop. The job then finishes with
    /// [`LayoutError::Cancelled`].
    pub fn cancel(&self) {
        debug!("Cancelling layout job");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Takes the result if the layout has finished.
    pub fn try_take(&mut self) -> Option<LayoutResult> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(worker_lost()))
            }
        }
    }

    /// Blocks until the layout finishes.
    pub fn wait(mut self) -> LayoutResult {
        let result = self.receiver.recv().unwrap_or_else(|_| Err(worker_lost()));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LayoutJob {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}

fn worker_lost() -> LayoutError {
    LayoutError::Engine("layout worker stopped without a result".to_string())
}
