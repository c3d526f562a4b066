//! Hub Processing Loop
//!
//! The hub task is the only code that ever touches the connection set or
//! writes to a registered connection. Intents are drained from one channel
//! and each is handled to completion before the next is read, so membership
//! changes and broadcast writes never race.

use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::connection::{ConnectionError, ConnectionId, ConnectionSink};
use super::handle::HubHandle;
use super::intent::{HubStats, Intent};

/// Configuration for the hub loop
#[derive(Debug, Clone, Default)]
pub struct HubConfig {
    /// Upper bound on a single write to one connection
    ///
    /// A write that takes longer counts as a failed write. `None` waits
    /// for as long as the peer takes.
    pub write_timeout: Option<Duration>,
}

/// Owner of the live connection set
pub struct Hub {
    connections: HashMap<ConnectionId, Box<dyn ConnectionSink>>,
    intents: mpsc::UnboundedReceiver<Intent>,
    config: HubConfig,
}

impl Hub {
    /// Create a hub and the handle used to feed it
    ///
    /// The hub does nothing until [`Hub::run`] is awaited.
    pub fn new(config: HubConfig) -> (Self, HubHandle) {
        let (tx, intents) = mpsc::unbounded_channel();
        let hub = Self {
            connections: HashMap::new(),
            intents,
            config,
        };
        (hub, HubHandle::new(tx))
    }

    /// Create a hub and run it on its own task
    pub fn spawn(config: HubConfig) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(config);
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Process intents until shutdown is requested or every handle is gone
    pub async fn run(mut self) {
        tracing::debug!("Hub started");

        while let Some(intent) = self.intents.recv().await {
            tracing::trace!(intent = ?intent, "Handling intent");
            match intent {
                Intent::Register {
                    connection,
                    greeting,
                } => self.register(connection, greeting).await,
                Intent::Unregister(id) => self.unregister(id).await,
                Intent::Broadcast(payload) => self.broadcast(payload).await,
                Intent::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.stats());
                }
                Intent::Shutdown { respond_to } => {
                    self.intents.close();
                    self.drain_stopped().await;
                    self.close_all().await;
                    let _ = respond_to.send(());
                    tracing::debug!("Hub stopped on request");
                    return;
                }
            }
        }

        self.close_all().await;
        tracing::debug!("Hub stopped, all handles dropped");
    }

    async fn register(&mut self, connection: Box<dyn ConnectionSink>, greeting: Option<Bytes>) {
        let id = connection.id();
        if self.connections.contains_key(&id) {
            tracing::warn!(connection_id = %id, "Connection already registered, ignoring");
            return;
        }

        let connection = self.connections.entry(id).or_insert(connection);
        tracing::info!(connection_id = %id, "Connection registered");

        // A failed greeting leaves the connection registered; its reader or
        // the next broadcast will notice the dead peer.
        if let Some(greeting) = greeting {
            if let Err(e) = write(connection.as_mut(), greeting, self.config.write_timeout).await {
                tracing::warn!(connection_id = %id, error = %e, "Failed to send readiness marker");
            }
        }
    }

    async fn unregister(&mut self, id: ConnectionId) {
        let Some(mut connection) = self.connections.remove(&id) else {
            tracing::trace!(connection_id = %id, "Unregister for unknown connection");
            return;
        };

        connection.close().await;
        tracing::info!(
            connection_id = %id,
            connections = self.connections.len(),
            "Connection closed"
        );
    }

    async fn broadcast(&mut self, payload: Bytes) {
        let recipients: Vec<ConnectionId> = self.connections.keys().copied().collect();
        let mut delivered = 0usize;

        for id in recipients {
            let Some(connection) = self.connections.get_mut(&id) else {
                continue;
            };

            match write(connection.as_mut(), payload.clone(), self.config.write_timeout).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(connection_id = %id, error = %e, "Broadcast write failed");
                    self.unregister(id).await;
                }
            }
        }

        tracing::trace!(bytes = payload.len(), recipients = delivered, "Broadcast");
    }

    async fn close_all(&mut self) {
        let count = self.connections.len();
        for (_, mut connection) in self.connections.drain() {
            connection.close().await;
        }
        if count > 0 {
            tracing::info!(connections = count, "Closed all connections");
        }
    }

    /// Settle intents queued behind a shutdown; the intake is already closed
    async fn drain_stopped(&mut self) {
        while let Ok(intent) = self.intents.try_recv() {
            match intent {
                Intent::Register { mut connection, .. } => {
                    tracing::debug!(
                        connection_id = %connection.id(),
                        "Closing connection registered during shutdown"
                    );
                    connection.close().await;
                }
                Intent::Shutdown { respond_to } => {
                    let _ = respond_to.send(());
                }
                Intent::Unregister(_) | Intent::Broadcast(_) | Intent::Snapshot { .. } => {}
            }
        }
    }

    fn stats(&self) -> HubStats {
        HubStats::new(self.connections.keys().copied().collect())
    }
}

async fn write(
    connection: &mut dyn ConnectionSink,
    payload: Bytes,
    timeout: Option<Duration>,
) -> Result<(), ConnectionError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, connection.send(payload))
            .await
            .map_err(|_| ConnectionError::Timeout(limit.as_millis() as u64))?,
        None => connection.send(payload).await,
    }
}
