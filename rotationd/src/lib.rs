//! rotationd: trace-chunk rotation coordinator for the tracing session
//! daemon.
//!
//! Sessions archive their trace data in chunks. Rotating a session closes
//! the active chunk and opens a new one; the closed chunk is only archived
//! once every consumer daemon has released it. This crate coordinates that
//! lifecycle: it queues rotation work, polls consumers for completion on a
//! one-shot timer, reacts to consumed-size threshold crossings, and
//! announces finished rotations to the notification subsystem.
//!
//! The entry point is [`RotationCoordinator`]: construct it with the
//! session registry and the command, consumer, and notification seams, keep
//! a [`RotationHandle`] for producers, and drive [`RotationCoordinator::run`]
//! on a task until shutdown.

pub mod command;
pub mod consumer;
pub mod coordinator;
pub mod error;
pub mod notification;
pub mod session;
pub mod timer;

#[cfg(test)]
mod testing;

pub use command::{ChunkCommand, RotationCommander, RotationOutcome};
pub use consumer::{ChunkExistsStatus, ConsumerEndpoint, ConsumerError};
pub use coordinator::{RotationConfig, RotationCoordinator, RotationHandle};
pub use error::RotationError;
pub use notification::{NotificationEvent, NotificationHub, TriggerId};
pub use session::{ArchiveLocation, RotationState, Session, SessionList, TraceChunk};
pub use timer::{PendingCheckTimers, RotationTimers};
