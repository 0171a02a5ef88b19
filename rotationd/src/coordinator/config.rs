//! Rotation coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Rotation coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Interval of the one-shot pending-check timer re-armed after every
    /// inconclusive completion check.
    #[serde(default = "default_pending_check_interval")]
    pub pending_check_interval: Duration,

    /// Capacity of the job-queue wake channel. The channel carries readiness
    /// hints, not jobs; a small capacity is enough.
    #[serde(default = "default_wake_capacity")]
    pub wake_capacity: usize,
}

fn default_pending_check_interval() -> Duration {
    Duration::from_millis(25)
}

fn default_wake_capacity() -> usize {
    32
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            pending_check_interval: default_pending_check_interval(),
            wake_capacity: default_wake_capacity(),
        }
    }
}
