//! Connection Lifecycle
//!
//! Bridges one peer connection to the hub: register, forward every inbound
//! message as a broadcast, and ask the hub to unregister once reading fails.
//! The task never closes the connection itself; only the hub does.

use bytes::Bytes;

use super::connection::{ConnectionError, ConnectionSink, ConnectionStream};
use super::handle::HubHandle;

/// Opaque first message written to every new connection
pub const READINESS_MARKER: &[u8] = &[0];

/// Drive one connection from registration to unregistration
///
/// Returns once the peer stops being readable and the unregister intent has
/// been submitted.
pub async fn run_connection<S, R>(hub: HubHandle, sink: S, mut stream: R, greeting: Option<Bytes>)
where
    S: ConnectionSink,
    R: ConnectionStream,
{
    let id = sink.id();

    if let Err(e) = hub.register(Box::new(sink), greeting) {
        tracing::error!(connection_id = %id, error = %e, "Failed to register connection");
        return;
    }

    loop {
        match stream.receive().await {
            Ok(payload) => {
                tracing::trace!(connection_id = %id, bytes = payload.len(), "Inbound message");
                if let Err(e) = hub.broadcast(payload) {
                    tracing::error!(connection_id = %id, error = %e, "Failed to submit broadcast");
                    return;
                }
            }
            Err(ConnectionError::Closed) => {
                tracing::debug!(connection_id = %id, "Peer closed connection");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "Connection read failed");
                break;
            }
        }
    }

    // The hub closes every connection itself when it stops
    if let Err(e) = hub.unregister(id) {
        tracing::debug!(connection_id = %id, error = %e, "Hub gone before unregister");
    }
}
