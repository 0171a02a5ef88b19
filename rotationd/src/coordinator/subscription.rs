//! Consumed-size threshold subscriptions.
//!
//! A session with a size-based rotation schedule keeps exactly one live
//! subscription against the notification subsystem. The subscription is
//! single-shot per crossing: when it fires, the rotation is launched and a
//! new subscription is registered at the crossed value plus the session's
//! size increment, so thresholds are strictly increasing and the condition
//! never re-fires on a value already crossed.

use std::sync::Arc;

use tracing::{debug, error};

use crate::command::{ChunkCommand, RotationCommander, RotationOutcome};
use crate::error::RotationError;
use crate::notification::{ConsumedSizeNotification, NotificationError, NotificationHub};
use crate::session::{Session, SessionList, SessionState};

/// Issues and cancels consumed-size subscriptions, and turns size-crossed
/// notifications into rotations.
#[derive(Clone)]
pub struct SubscriptionManager {
    hub: Arc<dyn NotificationHub>,
}

impl SubscriptionManager {
    pub fn new(hub: Arc<dyn NotificationHub>) -> Self {
        Self { hub }
    }

    /// Register the session's consumed-size subscription, replacing any
    /// previous one. Called with the session lock held.
    pub async fn subscribe(
        &self,
        session: &Session,
        state: &mut SessionState,
        threshold_bytes: u64,
    ) -> Result<(), NotificationError> {
        if let Some(previous) = state.rotate_trigger.take() {
            self.hub.unsubscribe(previous).await?;
        }

        let trigger = self
            .hub
            .subscribe_consumed_size(session.id(), session.name(), threshold_bytes)
            .await?;
        state.rotate_trigger = Some(trigger);
        debug!(
            session = session.name(),
            threshold_bytes, "subscribed to consumed-size condition"
        );
        Ok(())
    }

    /// Cancel the session's consumed-size subscription, if any. Called with
    /// the session lock held.
    pub async fn unsubscribe(
        &self,
        session: &Session,
        state: &mut SessionState,
    ) -> Result<(), NotificationError> {
        if let Some(trigger) = state.rotate_trigger.take() {
            self.hub.unsubscribe(trigger).await?;
            debug!(
                session = session.name(),
                "unsubscribed from consumed-size condition"
            );
        }
        Ok(())
    }

    /// React to a delivered size-crossed notification: launch a rotation and
    /// re-subscribe one increment above the crossed value.
    pub async fn handle_size_crossed(
        &self,
        sessions: &SessionList,
        commander: &dyn RotationCommander,
        notification: &ConsumedSizeNotification,
    ) -> Result<(), RotationError> {
        let list = sessions.lock().await;
        let Some(session) = list.find_by_name(&notification.session_name) else {
            // A session can be destroyed before its notification is handled.
            debug!(
                session = notification.session_name,
                "session not found while handling size-crossed notification"
            );
            return Ok(());
        };

        let mut state = session.lock().await;
        if state.rotate_trigger != Some(notification.trigger) {
            // Stale or foreign trigger for the same session name; not ours.
            debug!(
                session = session.name(),
                ?notification.trigger,
                "ignoring size-crossed notification from an unregistered trigger"
            );
            return Ok(());
        }

        // The subscription is single-shot per crossing.
        self.unsubscribe(&session, &mut state).await?;

        let outcome = commander
            .rotate(&session, &mut state, ChunkCommand::MoveToCompleted)
            .await;
        match &outcome {
            RotationOutcome::Ok => {}
            RotationOutcome::Failed(reason) => {
                error!(
                    session = session.name(),
                    reason, "failed to rotate on size notification"
                );
                return Err(RotationError::SizeRotationFailed {
                    session: session.name().to_string(),
                    reason: reason.clone(),
                });
            }
            refusal => {
                debug!(
                    session = session.name(),
                    outcome = ?refusal,
                    "rotation refused; subscribing to the next threshold value"
                );
            }
        }

        let threshold = notification.consumed_bytes + session.rotate_size();
        self.subscribe(&session, &mut state, threshold).await?;
        Ok(())
    }
}
