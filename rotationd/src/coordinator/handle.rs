//! Producer-side handle to the rotation coordinator.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::queue::{JobKind, JobQueue};
use crate::session::Session;

/// Cloneable handle used by job producers (the timer service, command
/// handlers) to push rotation work and request shutdown.
///
/// Enqueues are fire-and-forget; producers never observe a result.
#[derive(Clone)]
pub struct RotationHandle {
    queue: Arc<JobQueue>,
    shutdown_tx: watch::Sender<bool>,
}

impl RotationHandle {
    pub(crate) fn new(queue: Arc<JobQueue>, shutdown_tx: watch::Sender<bool>) -> Self {
        Self { queue, shutdown_tx }
    }

    /// The job queue backing this coordinator. Exposed so a timer service
    /// can push jobs directly.
    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Request a rotation of the session's active chunk.
    pub async fn schedule_rotation(&self, session: &Arc<Session>) {
        self.queue
            .enqueue(JobKind::ScheduledRotation, session)
            .await;
    }

    /// Request a completion check of the session's outstanding rotation.
    pub async fn check_pending_rotation(&self, session: &Arc<Session>) {
        self.queue
            .enqueue(JobKind::CheckPendingRotation, session)
            .await;
    }

    /// Ask the coordinator to stop. One-shot; the worker performs a final
    /// queue drain before exiting.
    pub fn shutdown(&self) {
        debug!("requesting rotation coordinator shutdown");
        let _ = self.shutdown_tx.send(true);
    }
}
