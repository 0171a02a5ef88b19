//! Test doubles for the coordinator's collaborators.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{ChunkCommand, RotationCommander, RotationOutcome};
use crate::consumer::{ChunkExistsStatus, ConsumerEndpoint, ConsumerError, RoutingId};
use crate::notification::{
    NotificationError, NotificationHub, RotationCompletedEvent, TriggerId,
};
use crate::session::{Session, SessionState, TraceChunk};
use crate::timer::{RotationTimers, TimerError};

/// Consumer endpoint with a scripted answer.
pub(crate) struct FakeEndpoint {
    answer: Result<ChunkExistsStatus, String>,
    queries: AtomicUsize,
}

impl FakeEndpoint {
    pub(crate) fn answering(status: ChunkExistsStatus) -> Self {
        Self {
            answer: Ok(status),
            queries: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self {
            answer: Err(reason.to_string()),
            queries: AtomicUsize::new(0),
        }
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsumerEndpoint for FakeEndpoint {
    async fn chunk_exists(
        &self,
        _routing: RoutingId,
        _session_id: u64,
        _chunk_id: u64,
    ) -> Result<ChunkExistsStatus, ConsumerError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(status) => Ok(*status),
            Err(reason) => Err(ConsumerError::Transport(reason.clone())),
        }
    }
}

/// Rotation command layer with a scripted outcome. On `Ok` it records a
/// fresh chunk as being archived, like the real command layer would.
pub(crate) struct FakeCommander {
    outcome: RotationOutcome,
    calls: AtomicUsize,
    next_chunk_id: AtomicU64,
}

impl FakeCommander {
    pub(crate) fn succeeding() -> Self {
        Self {
            outcome: RotationOutcome::Ok,
            calls: AtomicUsize::new(0),
            next_chunk_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn refusing(outcome: RotationOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            next_chunk_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RotationCommander for FakeCommander {
    async fn rotate(
        &self,
        _session: &Session,
        state: &mut SessionState,
        _command: ChunkCommand,
    ) -> RotationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.outcome == RotationOutcome::Ok {
            let id = self.next_chunk_id.fetch_add(1, Ordering::SeqCst);
            state.begin_rotation(TraceChunk::new(id, format!("chunk-{id}")));
        }
        self.outcome.clone()
    }
}

/// Notification hub recording subscriptions and announcements.
pub(crate) struct FakeHub {
    next_trigger: AtomicU64,
    thresholds: Mutex<Vec<u64>>,
    unsubscribed: Mutex<Vec<TriggerId>>,
    announced: Mutex<Vec<RotationCompletedEvent>>,
}

impl FakeHub {
    pub(crate) fn new() -> Self {
        Self {
            next_trigger: AtomicU64::new(1),
            thresholds: Mutex::new(Vec::new()),
            unsubscribed: Mutex::new(Vec::new()),
            announced: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscribed_thresholds(&self) -> Vec<u64> {
        self.thresholds.lock().unwrap().clone()
    }

    pub(crate) fn unsubscribed(&self) -> Vec<TriggerId> {
        self.unsubscribed.lock().unwrap().clone()
    }

    pub(crate) fn announced(&self) -> Vec<RotationCompletedEvent> {
        self.announced.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationHub for FakeHub {
    async fn subscribe_consumed_size(
        &self,
        _session_id: u64,
        _session_name: &str,
        threshold_bytes: u64,
    ) -> Result<TriggerId, NotificationError> {
        self.thresholds.lock().unwrap().push(threshold_bytes);
        Ok(TriggerId(self.next_trigger.fetch_add(1, Ordering::SeqCst)))
    }

    async fn unsubscribe(&self, trigger: TriggerId) -> Result<(), NotificationError> {
        self.unsubscribed.lock().unwrap().push(trigger);
        Ok(())
    }

    async fn announce_rotation_completed(
        &self,
        event: RotationCompletedEvent,
    ) -> Result<(), NotificationError> {
        self.announced.lock().unwrap().push(event);
        Ok(())
    }
}

/// Timer service that only records arm/disarm calls.
pub(crate) struct FakeTimers {
    stop_result: bool,
    fail_start: bool,
    started: Mutex<Vec<(u64, Duration)>>,
    stops: AtomicUsize,
}

impl FakeTimers {
    pub(crate) fn new() -> Self {
        Self {
            stop_result: true,
            fail_start: false,
            started: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        }
    }

    /// Make `stop_pending_check` report that no timer was armed.
    pub(crate) fn with_stop_result(mut self, stop_result: bool) -> Self {
        self.stop_result = stop_result;
        self
    }

    pub(crate) fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub(crate) fn started(&self) -> Vec<(u64, Duration)> {
        self.started.lock().unwrap().clone()
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RotationTimers for FakeTimers {
    async fn start_pending_check(
        &self,
        session: &std::sync::Arc<Session>,
        interval: Duration,
    ) -> Result<(), TimerError> {
        if self.fail_start {
            return Err(TimerError::Arm {
                session_id: session.id(),
                reason: "scripted failure".to_string(),
            });
        }
        self.started.lock().unwrap().push((session.id(), interval));
        Ok(())
    }

    async fn stop_pending_check(&self, _session: &Session) -> bool {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stop_result
    }
}
