//! Coordinator error taxonomy.

use thiserror::Error;

use crate::notification::NotificationError;
use crate::timer::TimerError;

/// Errors that terminate the rotation coordinator's worker loop.
///
/// Everything recoverable stays below this level: expected command refusals
/// are logged and discarded, consumer query failures abandon the affected
/// rotation by forcing the session into the `Error` state, and a saturated
/// wake channel is only a missed hint. What escapes here is structural; the
/// owning daemon treats it as a rotation-subsystem failure.
#[derive(Debug, Error)]
pub enum RotationError {
    /// The notification delivery channel was closed under the coordinator.
    #[error("notification channel closed")]
    NotificationChannelClosed,

    /// The pending-check timer could not be re-armed; completion of the
    /// outstanding rotation would never be detected.
    #[error("failed to re-arm pending-check timer for session \"{session}\"")]
    TimerRearm {
        session: String,
        #[source]
        source: TimerError,
    },

    /// A size-triggered rotation failed with an unexpected command outcome.
    #[error("failed to rotate session \"{session}\" on size notification: {reason}")]
    SizeRotationFailed { session: String, reason: String },

    /// Managing a consumed-size subscription failed.
    #[error(transparent)]
    Subscription(#[from] NotificationError),
}
