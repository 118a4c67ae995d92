//! # Background Task Set
//!
//! Owns the publisher and consumer loops of one service together with the
//! [`CancellationToken`] that stops them.

use crate::error::SyncError;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct BackgroundTasks {
    shutdown: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<Result<(), SyncError>>)>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Token loops select on. Cancelling it stops every task in the set.
    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawns a named loop. Its error, if any, is logged when it ends.
    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), SyncError>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let result = task.await;
            if let Err(e) = &result {
                error!(task = name, error = %e, "Background task exited with error");
            }
            result
        });
        self.handles.push((name, handle));
    }

    /// Names of tasks that have already ended.
    pub fn finished(&self) -> Vec<&'static str> {
        self.handles
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Cancels every task and waits for all of them.
    ///
    /// Loop errors were already logged when they happened and do not fail the
    /// shutdown. A panicked task does, after the remaining tasks are joined.
    pub async fn shutdown(self) -> Result<(), SyncError> {
        info!(tasks = self.handles.len(), "Stopping background tasks");
        self.shutdown.cancel();

        let mut failure = None;
        for (name, handle) in self.handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(task = name, error = %e, "Task had already failed"),
                Err(e) => {
                    error!(task = name, error = %e, "Task panicked");
                    failure.get_or_insert(SyncError::TaskFailed {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => {
                info!("Background tasks stopped");
                Ok(())
            }
        }
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}
