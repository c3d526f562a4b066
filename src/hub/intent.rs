//! Hub Intents
//!
//! Everything the hub does is requested through an [`Intent`]. The hub
//! handles them strictly one at a time, in the order they were submitted.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use tokio::sync::oneshot;

use super::connection::{ConnectionId, ConnectionSink};

/// A request consumed by the hub loop
pub enum Intent {
    /// Add a connection to the connection set
    Register {
        /// Write half of the new connection; the hub owns it from here on
        connection: Box<dyn ConnectionSink>,
        /// Written to the connection right after insertion, if present
        greeting: Option<Bytes>,
    },
    /// Remove a connection from the set and close it
    Unregister(ConnectionId),
    /// Write a payload to every registered connection
    Broadcast(Bytes),
    /// Report the live connection set
    Snapshot { respond_to: oneshot::Sender<HubStats> },
    /// Close every connection and stop the hub loop
    Shutdown { respond_to: oneshot::Sender<()> },
}

impl fmt::Debug for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Register {
                connection,
                greeting,
            } => f
                .debug_struct("Register")
                .field("connection", &connection.id())
                .field("greeting", greeting)
                .finish(),
            Intent::Unregister(id) => f.debug_tuple("Unregister").field(id).finish(),
            Intent::Broadcast(payload) => f
                .debug_tuple("Broadcast")
                .field(&payload.len())
                .finish(),
            Intent::Snapshot { .. } => f.write_str("Snapshot"),
            Intent::Shutdown { .. } => f.write_str("Shutdown"),
        }
    }
}

/// Point-in-time view of the connection set
#[derive(Debug, Clone, Default, Serialize)]
pub struct HubStats {
    connections: Vec<ConnectionId>,
}

impl HubStats {
    pub fn new(mut connections: Vec<ConnectionId>) -> Self {
        connections.sort();
        Self { connections }
    }

    /// Ids of every registered connection, sorted
    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    /// Number of registered connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether the given connection is currently registered
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.binary_search(&id).is_ok()
    }
}
