//! Trace chunk identity and archive location bookkeeping.
//!
//! The on-disk chunk abstraction itself lives outside this crate; the
//! coordinator only needs a chunk's identity (to query consumers) and its
//! name and resolved storage location (to report a completed rotation).

use serde::{Deserialize, Serialize};

/// A bounded, named unit of trace output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceChunk {
    id: u64,
    name: String,
}

impl TraceChunk {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Where a session's archived chunks end up once every consumer has flushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveLocation {
    /// Chunks are written by local consumers under an absolute path.
    Local { absolute_path: String },
    /// Chunks are streamed to a relay and stored relative to its output root.
    Relay { host: String, relative_path: String },
}
