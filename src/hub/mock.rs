//! In-memory connections for hub tests

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use super::connection::{ConnectionError, ConnectionId, ConnectionSink, ConnectionStream};

#[derive(Default)]
struct PeerState {
    received: Vec<Bytes>,
    close_count: usize,
    severed: bool,
    stalled: bool,
}

/// Test-side view of one fake peer
#[derive(Clone)]
pub struct MockPeer {
    id: ConnectionId,
    state: Arc<Mutex<PeerState>>,
}

impl MockPeer {
    pub fn new() -> Self {
        Self {
            id: ConnectionId::new(),
            state: Arc::default(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// A write half sharing this peer's state
    pub fn sink(&self) -> MockSink {
        MockSink {
            id: self.id,
            state: Arc::clone(&self.state),
        }
    }

    /// Boxed write half, ready for `HubHandle::register`
    pub fn boxed(&self) -> Box<dyn ConnectionSink> {
        Box::new(self.sink())
    }

    pub fn received(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().received.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().close_count
    }

    /// Make every subsequent write fail
    pub fn sever(&self) {
        self.state.lock().unwrap().severed = true;
    }

    /// Make every subsequent write hang forever
    pub fn stall(&self) {
        self.state.lock().unwrap().stalled = true;
    }

    /// Poll until this peer has received `count` messages
    pub async fn wait_for(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.received().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("peer did not receive the expected messages in time");
    }

    /// Poll until this peer has been closed
    pub async fn wait_closed(&self) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.close_count() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("peer was not closed in time");
    }
}

pub struct MockSink {
    id: ConnectionId,
    state: Arc<Mutex<PeerState>>,
}

#[async_trait]
impl ConnectionSink for MockSink {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&mut self, payload: Bytes) -> Result<(), ConnectionError> {
        let stalled = {
            let mut state = self.state.lock().unwrap();
            assert_eq!(state.close_count, 0, "write after close");
            if state.severed {
                return Err(ConnectionError::Send("severed".to_string()));
            }
            if !state.stalled {
                state.received.push(payload);
            }
            state.stalled
        };
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().close_count += 1;
    }
}

/// Read half fed by the test through an unbounded channel
///
/// Dropping the feeding sender ends the stream with `ConnectionError::Closed`.
pub struct MockStream {
    inbound: mpsc::UnboundedReceiver<Result<Bytes, ConnectionError>>,
}

impl MockStream {
    pub fn channel() -> (mpsc::UnboundedSender<Result<Bytes, ConnectionError>>, Self) {
        let (tx, inbound) = mpsc::unbounded_channel();
        (tx, Self { inbound })
    }
}

#[async_trait]
impl ConnectionStream for MockStream {
    async fn receive(&mut self) -> Result<Bytes, ConnectionError> {
        self.inbound.recv().await.unwrap_or(Err(ConnectionError::Closed))
    }
}
