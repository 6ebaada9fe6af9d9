//! Background save and import operations.
//!
//! Each operation runs on its own thread with its own store connection and
//! reports through a channel: zero or more `Progress` events followed by
//! exactly one `Finished` or `Failed`.

pub mod import;
pub mod save;


use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Receiver, Sender, TryRecvError};
use tracing::{error, info};

use crate::error::{CatalogError, Result};

pub use import::{run_import, ImportReport};
pub use save::{decide, run_save, RenameChoice, SaveDecision, SaveIntent, SaveRequest, SavedArtwork, Selection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 1-based position of the item about to be processed.
    pub current: usize,
    pub total: usize,
    pub item: String,
}

#[derive(Debug)]
pub enum JobEvent<T> {
    Progress(Progress),
    Finished(T),
    Failed(CatalogError),
}

/// Handed to the work closure for incremental reporting.
pub struct Reporter<T> {
    tx: Sender<JobEvent<T>>,
}

impl<T> Reporter<T> {
    pub fn progress(&self, progress: Progress) {
        // The caller may have dropped the handle; the work still completes.
        let _ = self.tx.send(JobEvent::Progress(progress));
    }
}

/// A running background operation.
pub struct JobHandle<T> {
    operation: &'static str,
    events: Receiver<JobEvent<T>>,
    worker: Option<JoinHandle<()>>,
    settled: bool,
}

impl<T: Send + 'static> JobHandle<T> {
    pub(crate) fn spawn<F>(operation: &'static str, work: F) -> Self
    where
        F: FnOnce(&Reporter<T>) -> Result<T> + Send + 'static,
    {
        let (tx, events) = unbounded();
        let worker = thread::spawn(move || {
            let reporter = Reporter { tx };
            let event = match work(&reporter) {
                Ok(value) => {
                    info!(operation, "Background operation finished");
                    JobEvent::Finished(value)
                }
                Err(e) => {
                    error!(operation, "Background operation failed: {}", e);
                    JobEvent::Failed(CatalogError::failed(operation, e))
                }
            };
            let _ = reporter.tx.send(event);
        });

        Self {
            operation,
            events,
            worker: Some(worker),
            settled: false,
        }
    }
}

impl<T> JobHandle<T> {
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Raw event stream, for callers that multiplex several handles.
    pub fn events(&self) -> &Receiver<JobEvent<T>> {
        &self.events
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Non-blocking poll. Returns `None` once the terminal event has been
    /// taken. A worker that vanished without a terminal event is reported as
    /// a failure.
    pub fn try_event(&mut self) -> Option<JobEvent<T>> {
        if self.settled {
            return None;
        }
        let event = match self.events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => JobEvent::Failed(self.vanished()),
        };
        if !matches!(event, JobEvent::Progress(_)) {
            self.settled = true;
        }
        Some(event)
    }

    pub fn wait(self) -> Result<T> {
        self.wait_with_progress(|_| {})
    }

    /// Blocks until the operation ends, passing progress events to `on_progress`.
    pub fn wait_with_progress<F>(mut self, mut on_progress: F) -> Result<T>
    where
        F: FnMut(&Progress),
    {
        let outcome = loop {
            match self.events.recv() {
                Ok(JobEvent::Progress(p)) => on_progress(&p),
                Ok(JobEvent::Finished(value)) => break Ok(value),
                Ok(JobEvent::Failed(e)) => break Err(e),
                Err(_) => break Err(self.vanished()),
            }
        };
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        outcome
    }

    fn vanished(&self) -> CatalogError {
        CatalogError::failed(
            self.operation,
            CatalogError::Other("worker exited without reporting an outcome".to_string()),
        )
    }
}
