//! Pending-check timer service.
//!
//! The pending-check timer of a session is armed in one-shot mode: it fires
//! once, enqueues a `CheckPendingRotation` job, and stays on the books until
//! it is explicitly disarmed by the check it triggered. The coordinator
//! re-arms it after every inconclusive check.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::coordinator::{JobKind, JobQueue};
use crate::session::Session;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("failed to arm pending-check timer for session {session_id}: {reason}")]
    Arm { session_id: u64, reason: String },
}

/// Arm/disarm surface of the pending-check timer service.
#[async_trait]
pub trait RotationTimers: Send + Sync {
    /// Arm the session's one-shot pending-check timer, replacing any timer
    /// already armed for it.
    async fn start_pending_check(
        &self,
        session: &Arc<Session>,
        interval: Duration,
    ) -> Result<(), TimerError>;

    /// Disarm the session's pending-check timer. Returns false when no timer
    /// was on the books, which means a concurrent check already consumed it.
    async fn stop_pending_check(&self, session: &Session) -> bool;
}

/// Tokio-backed timer service.
///
/// Each armed timer is a spawned one-shot task that sleeps for the interval
/// and then pushes a `CheckPendingRotation` job for its session. A fired
/// timer remains registered until disarmed, mirroring the one-shot timer it
/// replaces; the job queue's dedup keeps repeated fires harmless.
pub struct PendingCheckTimers {
    queue: Arc<JobQueue>,
    armed: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl PendingCheckTimers {
    pub fn new(queue: Arc<JobQueue>) -> Self {
        Self {
            queue,
            armed: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RotationTimers for PendingCheckTimers {
    async fn start_pending_check(
        &self,
        session: &Arc<Session>,
        interval: Duration,
    ) -> Result<(), TimerError> {
        let queue = Arc::clone(&self.queue);
        let session = Arc::clone(session);
        let session_id = session.id();

        debug!(session = session.name(), ?interval, "arming pending-check timer");
        let task = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            queue.enqueue(JobKind::CheckPendingRotation, &session).await;
        });

        if let Some(previous) = self.armed.lock().await.insert(session_id, task) {
            previous.abort();
        }
        Ok(())
    }

    async fn stop_pending_check(&self, session: &Session) -> bool {
        match self.armed.lock().await.remove(&session.id()) {
            Some(task) => {
                task.abort();
                true
            }
            None => {
                debug!(session = session.name(), "pending-check timer was not armed");
                false
            }
        }
    }
}
