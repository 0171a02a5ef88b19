//! Rotation coordinator worker loop.
//!
//! A single worker task waits on three sources at once: the shutdown
//! signal, the job-queue wake channel, and the notification channel. Jobs
//! are executed with the session-list lock held for the whole job and the
//! session lock held while its state is touched; the queue lock is never
//! held across an action.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::completion::chunk_exists_on_any_endpoint;
use super::config::RotationConfig;
use super::handle::RotationHandle;
use super::queue::{JobKind, JobQueue, RotationJob};
use super::subscription::SubscriptionManager;
use crate::command::{ChunkCommand, RotationCommander, RotationOutcome};
use crate::error::RotationError;
use crate::notification::{NotificationEvent, NotificationHub, RotationCompletedEvent};
use crate::session::{RotationState, Session, SessionList, SessionState, TraceChunk};
use crate::timer::{PendingCheckTimers, RotationTimers};

/// The rotation coordinator: owns the job queue and the per-session
/// rotation workflow.
///
/// All collaborators are passed in at construction; the coordinator holds
/// no process-wide state and is torn down by dropping it after
/// [`RotationCoordinator::run`] returns.
pub struct RotationCoordinator {
    config: RotationConfig,
    sessions: Arc<SessionList>,
    queue: Arc<JobQueue>,
    commander: Arc<dyn RotationCommander>,
    hub: Arc<dyn NotificationHub>,
    timers: Arc<dyn RotationTimers>,
    subscriptions: SubscriptionManager,
    wake_rx: mpsc::Receiver<()>,
    notification_rx: mpsc::Receiver<NotificationEvent>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RotationCoordinator {
    /// Create a coordinator. `notification_rx` is the receiving end of the
    /// channel the notification-delivery subsystem feeds.
    pub fn new(
        config: RotationConfig,
        sessions: Arc<SessionList>,
        commander: Arc<dyn RotationCommander>,
        hub: Arc<dyn NotificationHub>,
        notification_rx: mpsc::Receiver<NotificationEvent>,
    ) -> Self {
        let (wake_tx, wake_rx) = mpsc::channel(config.wake_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let queue = Arc::new(JobQueue::new(wake_tx));
        let timers: Arc<dyn RotationTimers> =
            Arc::new(PendingCheckTimers::new(Arc::clone(&queue)));

        Self {
            config,
            sessions,
            queue,
            commander,
            subscriptions: SubscriptionManager::new(Arc::clone(&hub)),
            hub,
            timers,
            wake_rx,
            notification_rx,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Replace the default tokio-backed pending-check timer service.
    pub fn with_timers(mut self, timers: Arc<dyn RotationTimers>) -> Self {
        self.timers = timers;
        self
    }

    /// Producer-side handle for enqueuing jobs and requesting shutdown.
    pub fn handle(&self) -> RotationHandle {
        RotationHandle::new(Arc::clone(&self.queue), self.shutdown_tx.clone())
    }

    /// Manager for the consumed-size subscriptions of sessions with a
    /// size-based rotation schedule.
    pub fn subscription_manager(&self) -> SubscriptionManager {
        self.subscriptions.clone()
    }

    /// Run the worker loop until shutdown or a fatal error.
    ///
    /// Fatal means structural: the notification channel closing underneath
    /// us, or a pending-check timer that cannot be re-armed. Everything
    /// job-level is resolved in place.
    pub async fn run(mut self) -> Result<(), RotationError> {
        info!("rotation coordinator started");

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    // Drain once more so every queued job releases the
                    // session reference it holds.
                    debug!("shutdown requested");
                    self.drain_job_queue().await?;
                    break;
                }
                _ = self.wake_rx.recv() => {
                    self.drain_job_queue().await?;
                }
                event = self.notification_rx.recv() => {
                    match event {
                        Some(event) => self.handle_notification(event).await?,
                        None => {
                            error!("notification channel was closed");
                            return Err(RotationError::NotificationChannelClosed);
                        }
                    }
                }
            }
        }

        info!("rotation coordinator stopped");
        Ok(())
    }

    async fn drain_job_queue(&self) -> Result<(), RotationError> {
        while let Some(job) = self.queue.pop().await {
            // Hold the session-list lock across the job so the session
            // cannot be torn down mid-check.
            let list = self.sessions.lock().await;
            if !list.contains(job.session.id()) {
                // The session was destroyed after the job was queued; drop
                // the job along with the reference it holds.
                debug!(
                    session = job.session.name(),
                    job = job.kind.as_str(),
                    "session no longer registered; discarding job"
                );
                continue;
            }

            self.run_job(&job).await?;
            drop(list);
        }
        Ok(())
    }

    async fn run_job(&self, job: &RotationJob) -> Result<(), RotationError> {
        let session = &job.session;
        let mut state = session.lock().await;
        match job.kind {
            JobKind::ScheduledRotation => {
                self.launch_scheduled_rotation(session, &mut state).await;
                Ok(())
            }
            JobKind::CheckPendingRotation => {
                self.check_pending_rotation(session, &mut state).await
            }
        }
    }

    /// Launch a scheduled rotation. Refusals from the command layer are
    /// expected (a rotation may already be pending, or one may already have
    /// happened since the session stopped) and never fatal.
    async fn launch_scheduled_rotation(&self, session: &Arc<Session>, state: &mut SessionState) {
        debug!(session = session.name(), "launching scheduled rotation");
        let outcome = self
            .commander
            .rotate(session, state, ChunkCommand::MoveToCompleted)
            .await;
        match outcome {
            RotationOutcome::Ok => {
                debug!(session = session.name(), "scheduled rotation launched");
            }
            outcome => {
                debug!(
                    session = session.name(),
                    ?outcome,
                    "scheduled rotation aborted"
                );
            }
        }
    }

    /// Check whether the session's outstanding rotation has completed on
    /// every consumer, and if so finalize it.
    async fn check_pending_rotation(
        &self,
        session: &Arc<Session>,
        state: &mut SessionState,
    ) -> Result<(), RotationError> {
        let Some(chunk) = state.chunk_being_archived.clone() else {
            return Ok(());
        };

        debug!(
            session = session.name(),
            chunk_id = chunk.id(),
            "checking for pending rotation"
        );

        // The pending-check timer is one-shot. When it is not on the books
        // anymore, a concurrent check already consumed it; skip straight to
        // the re-arm decision instead of racing it.
        if self.timers.stop_pending_check(session).await {
            match chunk_exists_on_any_endpoint(session, chunk.id()).await {
                Err(error) => {
                    // Completion can no longer be detected for this
                    // rotation; abandon it. The worker itself carries on.
                    error!(
                        session = session.name(),
                        %error,
                        "error while checking rotation status on consumers"
                    );
                    state.reset_rotation_state(RotationState::Error);
                }
                Ok(true) => {
                    debug!(
                        session = session.name(),
                        chunk_id = chunk.id(),
                        "rotation still pending on at least one consumer"
                    );
                }
                Ok(false) => {
                    self.finalize_rotation(session, state, &chunk).await;
                }
            }
        }

        if state.rotation_state == RotationState::Ongoing {
            self.timers
                .start_pending_check(session, self.config.pending_check_interval)
                .await
                .map_err(|source| RotationError::TimerRearm {
                    session: session.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Clear the `Ongoing` state and announce the completed rotation. New
    /// rotations can start once this returns.
    async fn finalize_rotation(
        &self,
        session: &Arc<Session>,
        state: &mut SessionState,
        chunk: &TraceChunk,
    ) {
        debug!(
            session = session.name(),
            chunk_id = chunk.id(),
            "rotation of trace archive is complete on all consumers"
        );

        state.last_archived_chunk_id = Some(chunk.id());
        state.last_archived_chunk_name = Some(chunk.name().to_string());
        state.reset_rotation_state(RotationState::Completed);

        if session.quiet_rotation() {
            return;
        }

        let event = RotationCompletedEvent {
            session_id: session.id(),
            chunk_id: chunk.id(),
            location: session.archive_location().clone(),
        };
        if let Err(error) = self.hub.announce_rotation_completed(event).await {
            error!(
                session = session.name(),
                %error,
                "failed to announce completed rotation"
            );
        }
    }

    async fn handle_notification(&self, event: NotificationEvent) -> Result<(), RotationError> {
        match event {
            NotificationEvent::Dropped => {
                // Not an error; wait for the next one.
                warn!("notification delivery dropped notifications");
                Ok(())
            }
            NotificationEvent::SizeCrossed(notification) => {
                self.subscriptions
                    .handle_size_crossed(&self.sessions, self.commander.as_ref(), &notification)
                    .await
            }
        }
    }
}
