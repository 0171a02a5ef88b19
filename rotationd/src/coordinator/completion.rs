//! Multi-consumer completion check for an archived chunk.

use tracing::debug;

use crate::consumer::ConsumerError;
use crate::session::Session;

/// Query every consumer endpoint bound to the session's enabled domains for
/// the given chunk.
///
/// Returns true as soon as any endpoint still references the chunk; returns
/// false only once all endpoints have answered that they released it. Any
/// individual query failure aborts the whole check and is reported to the
/// caller, never silently skipped.
pub async fn chunk_exists_on_any_endpoint(
    session: &Session,
    chunk_id: u64,
) -> Result<bool, ConsumerError> {
    for output in session.outputs() {
        for endpoint in output.endpoints() {
            let status = endpoint
                .chunk_exists(output.routing(), session.id(), chunk_id)
                .await?;
            if status.still_referenced() {
                debug!(
                    session = session.name(),
                    chunk_id,
                    domain = ?output.domain(),
                    ?status,
                    "chunk still referenced by a consumer"
                );
                return Ok(true);
            }
        }
    }

    debug!(
        session = session.name(),
        chunk_id, "chunk released by all consumers"
    );
    Ok(false)
}
