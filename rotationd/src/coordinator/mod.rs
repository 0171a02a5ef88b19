//! Trace-chunk rotation coordination.
//!
//! The coordinator owns a deduplicated job queue fed by timers, command
//! handlers, and consumed-size notifications, and a single worker loop
//! that drives every rotation to completion.

mod completion;
mod config;
mod core;
mod handle;
mod queue;
mod subscription;

pub use completion::chunk_exists_on_any_endpoint;
pub use config::RotationConfig;
pub use core::RotationCoordinator;
pub use handle::RotationHandle;
pub use queue::{JobKind, JobQueue, RotationJob};
pub use subscription::SubscriptionManager;
