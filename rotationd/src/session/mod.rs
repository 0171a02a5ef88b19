//! Sessions, their rotation state machine, and the session registry.
//!
//! A `Session` is shared across the daemon as an `Arc<Session>`; the strong
//! count is what keeps a session alive between a job's enqueue and its
//! eventual execution or discard. The mutable rotation bookkeeping lives in
//! [`SessionState`] behind the session's own lock, while [`SessionList`] is
//! the registry guarded by the session-list lock. Lock order is always
//! list before session.

mod chunk;

pub use chunk::{ArchiveLocation, TraceChunk};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::consumer::DomainOutput;
use crate::notification::TriggerId;

/// Rotation state machine of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// No rotation has ever been started on this session.
    NoRotation,
    /// A chunk is being archived; consumers may still reference it.
    Ongoing,
    /// The last rotation finished; all consumers released the chunk.
    Completed,
    /// The last completed rotation is too old to be queried.
    Expired,
    /// Completion detection failed; the rotation was abandoned.
    Error,
}

/// Mutable rotation bookkeeping, guarded by the session lock.
///
/// Invariant: `chunk_being_archived` is `Some` if and only if
/// `rotation_state` is [`RotationState::Ongoing`]. Every transition out of
/// `Ongoing` goes through [`SessionState::reset_rotation_state`].
#[derive(Debug)]
pub struct SessionState {
    pub rotation_state: RotationState,
    pub chunk_being_archived: Option<TraceChunk>,
    pub last_archived_chunk_id: Option<u64>,
    pub last_archived_chunk_name: Option<String>,
    /// Identity of the live consumed-size trigger, if any. At most one per
    /// session; replaced on every resubscription.
    pub rotate_trigger: Option<TriggerId>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            rotation_state: RotationState::NoRotation,
            chunk_being_archived: None,
            last_archived_chunk_id: None,
            last_archived_chunk_name: None,
            rotate_trigger: None,
        }
    }

    /// Mark the given chunk as being archived and enter the `Ongoing` state.
    ///
    /// Called by the rotation command layer with the session lock held.
    pub fn begin_rotation(&mut self, chunk: TraceChunk) {
        self.rotation_state = RotationState::Ongoing;
        self.chunk_being_archived = Some(chunk);
    }

    /// Leave the `Ongoing` state, clearing the chunk being archived.
    pub fn reset_rotation_state(&mut self, state: RotationState) {
        debug_assert!(state != RotationState::Ongoing);
        self.rotation_state = state;
        self.chunk_being_archived = None;
    }
}

/// A recording session and the trace outputs its consumers flush to.
///
/// Everything here except [`SessionState`] is fixed at creation time.
pub struct Session {
    id: u64,
    name: String,
    /// Suppress the completion announcement for rotations on this session.
    quiet_rotation: bool,
    /// Size increment of the size-based rotation schedule, in bytes.
    /// Zero when the session has no size-based schedule.
    rotate_size: u64,
    archive_location: ArchiveLocation,
    outputs: Vec<DomainOutput>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(id: u64, name: impl Into<String>, archive_location: ArchiveLocation) -> Self {
        Self {
            id,
            name: name.into(),
            quiet_rotation: false,
            rotate_size: 0,
            archive_location,
            outputs: Vec::new(),
            state: Mutex::new(SessionState::new()),
        }
    }

    pub fn with_quiet_rotation(mut self, quiet: bool) -> Self {
        self.quiet_rotation = quiet;
        self
    }

    pub fn with_rotate_size(mut self, rotate_size: u64) -> Self {
        self.rotate_size = rotate_size;
        self
    }

    pub fn with_output(mut self, output: DomainOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quiet_rotation(&self) -> bool {
        self.quiet_rotation
    }

    pub fn rotate_size(&self) -> u64 {
        self.rotate_size
    }

    pub fn archive_location(&self) -> &ArchiveLocation {
        &self.archive_location
    }

    /// Consumer outputs across the session's enabled domains.
    pub fn outputs(&self) -> &[DomainOutput] {
        &self.outputs
    }

    /// Acquire the session lock.
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("quiet_rotation", &self.quiet_rotation)
            .field("rotate_size", &self.rotate_size)
            .finish_non_exhaustive()
    }
}

/// Registry of live sessions, guarded by the session-list lock.
///
/// Job execution holds this lock for a whole job so the session cannot be
/// torn down mid-check; a job whose session is no longer registered is
/// discarded without running.
pub struct SessionList {
    inner: Mutex<HashMap<u64, Arc<Session>>>,
}

impl SessionList {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub async fn register(&self, session: Arc<Session>) {
        debug!(session = session.name(), id = session.id(), "registering session");
        self.inner.lock().await.insert(session.id(), session);
    }

    pub async fn remove(&self, id: u64) -> Option<Arc<Session>> {
        let removed = self.inner.lock().await.remove(&id);
        if let Some(session) = &removed {
            debug!(session = session.name(), id, "removed session");
        }
        removed
    }

    /// Acquire the session-list lock.
    pub async fn lock(&self) -> SessionListGuard<'_> {
        SessionListGuard {
            inner: self.inner.lock().await,
        }
    }
}

impl Default for SessionList {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard over the session registry.
pub struct SessionListGuard<'a> {
    inner: MutexGuard<'a, HashMap<u64, Arc<Session>>>,
}

impl SessionListGuard<'_> {
    pub fn contains(&self, id: u64) -> bool {
        self.inner.contains_key(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<Session>> {
        self.inner
            .values()
            .find(|session| session.name() == name)
            .cloned()
    }
}
