//! Rotation command layer boundary.
//!
//! The command layer is what physically instructs the tracer and its
//! consumers to switch buffers; the coordinator only triggers it and
//! interprets the outcome. It is never invoked concurrently for the same
//! session: the caller holds the session lock and passes the guarded state
//! in.

use async_trait::async_trait;

use crate::session::{Session, SessionState};

/// What should happen to the active chunk when the rotation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkCommand {
    /// Close the active chunk and move it to the completed state.
    MoveToCompleted,
    /// Close the active chunk and leave it in place.
    NoOperation,
}

/// Outcome of a rotation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The rotation was launched; the session is now in the `Ongoing` state.
    Ok,
    /// A rotation is already pending on this session.
    RotationPending,
    /// A rotation already happened since the session was stopped.
    MultipleRotationsAfterStop,
    /// A rotation already happened since the session was stopped and cleared.
    AfterStopClear,
    /// Any other command-layer failure.
    Failed(String),
}

impl RotationOutcome {
    /// Refusals the coordinator expects and tolerates: the rotation is
    /// simply not started again.
    pub fn is_expected_refusal(&self) -> bool {
        matches!(
            self,
            RotationOutcome::RotationPending
                | RotationOutcome::MultipleRotationsAfterStop
                | RotationOutcome::AfterStopClear
        )
    }
}

/// Entry point into the rotation command layer.
#[async_trait]
pub trait RotationCommander: Send + Sync {
    /// Atomically close the session's active chunk and start a new one.
    ///
    /// On success the implementation records the chunk being archived in
    /// `state` (see [`SessionState::begin_rotation`]).
    async fn rotate(
        &self,
        session: &Session,
        state: &mut SessionState,
        command: ChunkCommand,
    ) -> RotationOutcome;
}
