//! Notification-delivery boundary.
//!
//! The coordinator is both a consumer of this subsystem (size-crossed
//! notifications arrive on its notification channel) and a producer
//! (completed rotations are announced through the [`NotificationHub`]).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::ArchiveLocation;

/// Identity of a registered trigger.
///
/// A notification is only acted upon when its trigger matches the one the
/// session registered; anything else is stale or foreign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u64);

/// Payload of a "session consumed size crossed" notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedSizeNotification {
    #[serde(rename = "session-name")]
    pub session_name: String,
    pub trigger: TriggerId,
    #[serde(rename = "consumed-bytes")]
    pub consumed_bytes: u64,
}

/// Events delivered on the coordinator's notification channel.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// A consumed-size condition crossed its threshold.
    SizeCrossed(ConsumedSizeNotification),
    /// The delivery subsystem dropped notifications; wait for the next one.
    Dropped,
}

/// Announcement emitted when a rotation fully completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationCompletedEvent {
    pub session_id: u64,
    pub chunk_id: u64,
    pub location: ArchiveLocation,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to register consumed-size trigger: {0}")]
    Subscribe(String),

    #[error("failed to cancel consumed-size trigger: {0}")]
    Unsubscribe(String),

    #[error("failed to announce event: {0}")]
    Announce(String),
}

/// Subscription and announcement surface of the notification subsystem.
#[async_trait]
pub trait NotificationHub: Send + Sync {
    /// Register a one-shot condition firing when the session's consumed trace
    /// volume crosses `threshold_bytes`. Returns the identity of the new
    /// trigger.
    async fn subscribe_consumed_size(
        &self,
        session_id: u64,
        session_name: &str,
        threshold_bytes: u64,
    ) -> Result<TriggerId, NotificationError>;

    /// Cancel a previously registered trigger.
    async fn unsubscribe(&self, trigger: TriggerId) -> Result<(), NotificationError>;

    /// Announce a completed rotation to interested subscribers.
    async fn announce_rotation_completed(
        &self,
        event: RotationCompletedEvent,
    ) -> Result<(), NotificationError>;
}
