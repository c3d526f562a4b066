//! Connection Abstraction
//!
//! The hub never sees a socket. It sees a [`ConnectionSink`], the write half
//! of a peer connection, which it owns from registration until close. The
//! read half ([`ConnectionStream`]) stays with the lifecycle task that feeds
//! inbound messages to the hub.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identity of a peer connection
///
/// Used as the key of the hub's connection set. Two connections are the same
/// only if they carry the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a fresh identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for ConnectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Write half of a peer connection
///
/// Implementations are owned by exactly one party at a time, so `send` and
/// `close` are never called concurrently.
#[async_trait]
pub trait ConnectionSink: Send + 'static {
    /// Stable identity of this connection
    fn id(&self) -> ConnectionId;

    /// Deliver one message to the peer
    async fn send(&mut self, payload: Bytes) -> Result<(), ConnectionError>;

    /// Close the underlying channel
    ///
    /// Called at most once, by the hub, right after the connection leaves
    /// the connection set.
    async fn close(&mut self);
}

/// Read half of a peer connection
#[async_trait]
pub trait ConnectionStream: Send + 'static {
    /// Wait for the next inbound message
    ///
    /// Any error, including a clean close by the peer, ends the connection.
    async fn receive(&mut self) -> Result<Bytes, ConnectionError>;
}

/// Opaque per-connection I/O failures
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The peer closed the connection
    #[error("Connection closed by peer")]
    Closed,

    /// Writing to the peer failed
    #[error("Send failed: {0}")]
    Send(String),

    /// Reading from the peer failed
    #[error("Receive failed: {0}")]
    Receive(String),

    /// A write did not complete within the configured timeout
    #[error("Send timed out after {0}ms")]
    Timeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_connection_ids_are_unique() {
        let ids: HashSet<ConnectionId> = (0..100).map(|_| ConnectionId::new()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_connection_id_display_matches_uuid() {
        let id = ConnectionId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
