//! Hub Handle
//!
//! Cloneable front door to a running hub. Every method turns into an
//! [`Intent`] on the hub's intake channel; nothing here touches the
//! connection set directly.

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::connection::{ConnectionId, ConnectionSink};
use super::intent::{HubStats, Intent};

/// Handle for submitting intents to a running hub
///
/// The intake is unbounded, so submitting never waits. The hub loop stops
/// once every handle has been dropped.
#[derive(Clone)]
pub struct HubHandle {
    intents: mpsc::UnboundedSender<Intent>,
}

impl HubHandle {
    pub(crate) fn new(intents: mpsc::UnboundedSender<Intent>) -> Self {
        Self { intents }
    }

    /// Hand a connection over to the hub
    ///
    /// `greeting`, if present, is the first thing written to the connection.
    pub fn register(
        &self,
        connection: Box<dyn ConnectionSink>,
        greeting: Option<Bytes>,
    ) -> Result<(), HubError> {
        self.submit(Intent::Register {
            connection,
            greeting,
        })
    }

    /// Ask the hub to remove and close a connection
    ///
    /// Unregistering a connection that is not registered is a no-op.
    pub fn unregister(&self, id: ConnectionId) -> Result<(), HubError> {
        self.submit(Intent::Unregister(id))
    }

    /// Fan a payload out to every registered connection
    pub fn broadcast(&self, payload: impl Into<Bytes>) -> Result<(), HubError> {
        self.submit(Intent::Broadcast(payload.into()))
    }

    /// Current connection set, as seen after every previously submitted intent
    pub async fn snapshot(&self) -> Result<HubStats, HubError> {
        let (respond_to, response) = oneshot::channel();
        self.submit(Intent::Snapshot { respond_to })?;
        response.await.map_err(|_| HubError::Stopped)
    }

    /// Close every connection and stop the hub loop
    ///
    /// Resolves once the hub has closed all connections.
    pub async fn shutdown(&self) -> Result<(), HubError> {
        let (respond_to, response) = oneshot::channel();
        self.submit(Intent::Shutdown { respond_to })?;
        response.await.map_err(|_| HubError::Stopped)
    }

    /// Whether the hub loop has stopped
    pub fn is_stopped(&self) -> bool {
        self.intents.is_closed()
    }

    fn submit(&self, intent: Intent) -> Result<(), HubError> {
        self.intents.send(intent).map_err(|_| HubError::Stopped)
    }
}

/// Errors returned when submitting intents
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Hub is not running")]
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_after_hub_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = HubHandle::new(tx);
        drop(rx);

        assert!(handle.is_stopped());
        assert!(matches!(
            handle.broadcast(&b"hi"[..]),
            Err(HubError::Stopped)
        ));
        assert!(matches!(
            handle.unregister(ConnectionId::new()),
            Err(HubError::Stopped)
        ));
        assert!(matches!(handle.snapshot().await, Err(HubError::Stopped)));
    }

    #[tokio::test]
    async fn test_intents_arrive_in_submission_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = HubHandle::new(tx);
        let id = ConnectionId::new();

        handle.broadcast(&b"first"[..]).unwrap();
        handle.unregister(id).unwrap();
        handle.broadcast(&b"second"[..]).unwrap();

        assert!(matches!(rx.recv().await, Some(Intent::Broadcast(p)) if p == "first"));
        assert!(matches!(rx.recv().await, Some(Intent::Unregister(got)) if got == id));
        assert!(matches!(rx.recv().await, Some(Intent::Broadcast(p)) if p == "second"));
    }
}
