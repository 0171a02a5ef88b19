//! Rotation job queue.
//!
//! The queue is the source of truth for pending work; the wake channel next
//! to it is only a readiness hint. Lost or duplicated wake signals are
//! harmless because every wake triggers a full drain of the queue.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use crate::session::Session;

/// The two kinds of rotation work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Launch a rotation on the session (timer- or command-driven).
    ScheduledRotation,
    /// Check whether the session's outstanding rotation has completed.
    CheckPendingRotation,
}

impl JobKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            JobKind::ScheduledRotation => "scheduled-rotation",
            JobKind::CheckPendingRotation => "check-pending-rotation",
        }
    }
}

/// One unit of rotation work.
///
/// A job owns a strong reference to its session from enqueue until it is
/// executed or discarded; dropping the job releases it.
#[derive(Clone)]
pub struct RotationJob {
    pub kind: JobKind,
    pub session: Arc<Session>,
}

/// Deduplicated FIFO of pending rotation jobs plus the worker wake channel.
pub struct JobQueue {
    jobs: Mutex<VecDeque<RotationJob>>,
    wake_tx: mpsc::Sender<()>,
}

impl JobQueue {
    pub fn new(wake_tx: mpsc::Sender<()>) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            wake_tx,
        }
    }

    /// Append a job and nudge the worker. Idempotent: a job with the same
    /// `(session, kind)` pair already queued is left alone.
    pub async fn enqueue(&self, kind: JobKind, session: &Arc<Session>) {
        {
            let mut jobs = self.jobs.lock().await;
            let exists = jobs
                .iter()
                .any(|job| job.kind == kind && job.session.id() == session.id());
            if exists {
                debug!(
                    session = session.name(),
                    job = kind.as_str(),
                    "job already queued"
                );
                return;
            }
            jobs.push_back(RotationJob {
                kind,
                session: Arc::clone(session),
            });
        }

        match self.wake_tx.try_send(()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(())) => {
                // The worker is behind; the job sits in the queue and will be
                // found on the next drain. Surprising, not an error.
                debug!(
                    session = session.name(),
                    job = kind.as_str(),
                    "wake channel of the rotation job queue is full"
                );
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!(
                    session = session.name(),
                    job = kind.as_str(),
                    "rotation worker is gone; job will never run"
                );
            }
        }
    }

    /// Pop the head job. The queue lock is held only for the pop.
    pub async fn pop(&self) -> Option<RotationJob> {
        self.jobs.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ArchiveLocation;

    fn session(id: u64) -> Arc<Session> {
        Arc::new(Session::new(
            id,
            format!("session-{id}"),
            ArchiveLocation::Local {
                absolute_path: "/tmp/traces".to_string(),
            },
        ))
    }

    fn queue_with_capacity(capacity: usize) -> (JobQueue, mpsc::Receiver<()>) {
        let (wake_tx, wake_rx) = mpsc::channel(capacity);
        (JobQueue::new(wake_tx), wake_rx)
    }

    #[tokio::test]
    async fn test_enqueue_is_deduplicated() {
        let (queue, _wake_rx) = queue_with_capacity(8);
        let session = session(1);
        let baseline = Arc::strong_count(&session);

        queue
            .enqueue(JobKind::CheckPendingRotation, &session)
            .await;
        queue
            .enqueue(JobKind::CheckPendingRotation, &session)
            .await;

        // One queued job, one net reference.
        assert_eq!(queue.len().await, 1);
        assert_eq!(Arc::strong_count(&session), baseline + 1);
    }

    #[tokio::test]
    async fn test_different_kinds_both_queue() {
        let (queue, _wake_rx) = queue_with_capacity(8);
        let session = session(1);

        queue.enqueue(JobKind::ScheduledRotation, &session).await;
        queue
            .enqueue(JobKind::CheckPendingRotation, &session)
            .await;

        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (queue, _wake_rx) = queue_with_capacity(8);
        let first = session(1);
        let second = session(2);

        queue.enqueue(JobKind::ScheduledRotation, &first).await;
        queue.enqueue(JobKind::ScheduledRotation, &second).await;

        assert_eq!(queue.pop().await.unwrap().session.id(), 1);
        assert_eq!(queue.pop().await.unwrap().session.id(), 2);
        assert!(queue.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_full_wake_channel_does_not_lose_jobs() {
        let (queue, mut wake_rx) = queue_with_capacity(1);

        for id in 0..3 {
            queue.enqueue(JobKind::ScheduledRotation, &session(id)).await;
        }

        // Only one wake hint fit, but every job is in the queue.
        assert_eq!(queue.len().await, 3);
        wake_rx.recv().await.unwrap();
        assert!(wake_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_pop_releases_nothing_until_drop() {
        let (queue, _wake_rx) = queue_with_capacity(8);
        let session = session(1);
        let baseline = Arc::strong_count(&session);

        queue.enqueue(JobKind::ScheduledRotation, &session).await;
        let job = queue.pop().await.unwrap();
        assert_eq!(Arc::strong_count(&session), baseline + 1);

        drop(job);
        assert_eq!(Arc::strong_count(&session), baseline);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// No sequence of enqueues ever produces two jobs with the same
            /// (session, kind) pair, and the queue length always equals the
            /// number of distinct pairs seen.
            #[test]
            fn prop_no_duplicate_session_kind_pairs(
                ops in proptest::collection::vec((0u64..4, proptest::bool::ANY), 1..32)
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                rt.block_on(async move {
                    let (queue, _wake_rx) = queue_with_capacity(64);
                    let sessions: Vec<_> = (0u64..4).map(session).collect();
                    let mut distinct = std::collections::HashSet::new();

                    for (id, pending) in ops {
                        let kind = if pending {
                            JobKind::CheckPendingRotation
                        } else {
                            JobKind::ScheduledRotation
                        };
                        queue.enqueue(kind, &sessions[id as usize]).await;
                        distinct.insert((id, kind));
                    }

                    prop_assert_eq!(queue.len().await, distinct.len());

                    let mut seen = std::collections::HashSet::new();
                    while let Some(job) = queue.pop().await {
                        prop_assert!(seen.insert((job.session.id(), job.kind)));
                    }
                    Ok(())
                })?;
            }
        }
    }
}
