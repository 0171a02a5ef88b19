//! Consumer endpoint boundary.
//!
//! One consumer process exists per instrumentation domain and buffering
//! scheme, possibly behind a relay. The coordinator only needs a single
//! query from each of them: does this endpoint still know about a given
//! trace chunk?

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Instrumentation domain a consumer flushes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingDomain {
    Kernel,
    UserSpace,
}

/// Routing identifier scoping a chunk-existence query.
///
/// Local consumers are addressed directly; consumers streaming to a relay
/// are addressed by the relay's network sequence index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingId {
    Local,
    Relay(u64),
}

/// Answer to a chunk-existence query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkExistsStatus {
    /// The chunk exists and is still open on the endpoint.
    Exists,
    /// The chunk is known to the endpoint but no longer present.
    DoesNotExist,
    /// The endpoint has fully released the chunk.
    UnknownChunk,
}

impl ChunkExistsStatus {
    /// A chunk is still referenced until the consumer reports it unknown;
    /// both `Exists` and `DoesNotExist` mean the consumer still tracks it.
    pub fn still_referenced(self) -> bool {
        !matches!(self, ChunkExistsStatus::UnknownChunk)
    }
}

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("consumer transport error: {0}")]
    Transport(String),

    #[error("i/o error talking to consumer: {0}")]
    Io(#[from] std::io::Error),
}

/// One consumer process/domain pairing.
#[async_trait]
pub trait ConsumerEndpoint: Send + Sync {
    /// Query whether the endpoint still references the given chunk.
    async fn chunk_exists(
        &self,
        routing: RoutingId,
        session_id: u64,
        chunk_id: u64,
    ) -> Result<ChunkExistsStatus, ConsumerError>;
}

/// Consumer endpoints enabled for one tracing domain of a session, together
/// with the routing identifier their queries must carry.
#[derive(Clone)]
pub struct DomainOutput {
    domain: TracingDomain,
    routing: RoutingId,
    endpoints: Vec<Arc<dyn ConsumerEndpoint>>,
}

impl DomainOutput {
    pub fn new(domain: TracingDomain, routing: RoutingId) -> Self {
        Self {
            domain,
            routing,
            endpoints: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Arc<dyn ConsumerEndpoint>) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn domain(&self) -> TracingDomain {
        self.domain
    }

    pub fn routing(&self) -> RoutingId {
        self.routing
    }

    pub fn endpoints(&self) -> &[Arc<dyn ConsumerEndpoint>] {
        &self.endpoints
    }
}

impl std::fmt::Debug for DomainOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainOutput")
            .field("domain", &self.domain)
            .field("routing", &self.routing)
            .field("endpoints", &self.endpoints.len())
            .finish()
    }
}
