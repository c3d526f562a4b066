//! WebSocket Adapter
//!
//! Splits an upgraded axum [`WebSocket`] into the hub's write and read
//! halves.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use crate::hub::{ConnectionError, ConnectionId, ConnectionSink, ConnectionStream};

/// Split a socket into a hub-owned sink and a reader-owned stream
pub fn split(socket: WebSocket) -> (WsSink, WsStream) {
    let id = ConnectionId::new();
    let (sender, receiver) = socket.split();
    (WsSink { id, sender }, WsStream { id, receiver })
}

/// Write half of a WebSocket connection
pub struct WsSink {
    id: ConnectionId,
    sender: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl ConnectionSink for WsSink {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&mut self, payload: Bytes) -> Result<(), ConnectionError> {
        self.sender
            .send(outbound(payload))
            .await
            .map_err(|e| ConnectionError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.sender.close().await {
            tracing::trace!(connection_id = %self.id, error = %e, "WebSocket close failed");
        }
    }
}

/// Read half of a WebSocket connection
pub struct WsStream {
    id: ConnectionId,
    receiver: SplitStream<WebSocket>,
}

impl WsStream {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

#[async_trait]
impl ConnectionStream for WsStream {
    async fn receive(&mut self) -> Result<Bytes, ConnectionError> {
        while let Some(result) = self.receiver.next().await {
            let message = result.map_err(|e| ConnectionError::Receive(e.to_string()))?;
            if let Some(payload) = inbound(message)? {
                return Ok(payload);
            }
        }
        Err(ConnectionError::Closed)
    }
}

/// Payload of a data frame, `None` for control frames the relay ignores
fn inbound(message: Message) -> Result<Option<Bytes>, ConnectionError> {
    match message {
        Message::Text(text) => Ok(Some(Bytes::from(text))),
        Message::Binary(data) => Ok(Some(Bytes::from(data))),
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => Ok(None),
        Message::Close(_) => Err(ConnectionError::Closed),
    }
}

/// Frame a payload: text when it is valid UTF-8, binary otherwise
fn outbound(payload: Bytes) -> Message {
    match std::str::from_utf8(&payload) {
        Ok(text) => Message::Text(text.to_owned()),
        Err(_) => Message::Binary(payload.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::READINESS_MARKER;

    #[test]
    fn test_inbound_data_frames() {
        let text = inbound(Message::Text("hi".to_string())).unwrap();
        assert_eq!(text, Some(Bytes::from_static(b"hi")));

        let binary = inbound(Message::Binary(vec![1, 2, 3])).unwrap();
        assert_eq!(binary, Some(Bytes::from_static(&[1, 2, 3])));
    }

    #[test]
    fn test_inbound_control_frames() {
        assert_eq!(inbound(Message::Ping(vec![1])).unwrap(), None);
        assert_eq!(inbound(Message::Pong(vec![])).unwrap(), None);
        assert!(matches!(
            inbound(Message::Close(None)),
            Err(ConnectionError::Closed)
        ));
    }

    #[test]
    fn test_outbound_framing() {
        match outbound(Bytes::from_static(b"hello")) {
            Message::Text(text) => assert_eq!(text, "hello"),
            other => panic!("Expected Text, got {:?}", other),
        }

        match outbound(Bytes::from_static(READINESS_MARKER)) {
            Message::Text(text) => assert_eq!(text.as_bytes(), READINESS_MARKER),
            other => panic!("Expected Text, got {:?}", other),
        }

        match outbound(Bytes::from_static(&[0xff, 0xfe])) {
            Message::Binary(data) => assert_eq!(data, vec![0xff, 0xfe]),
            other => panic!("Expected Binary, got {:?}", other),
        }
    }

    #[test]
    fn test_outbound_leaves_shared_payload_intact() {
        // One payload is framed once per recipient
        let payload = Bytes::from(vec![b'o', b'k', 0xc3]);
        let frames: Vec<Message> = (0..3).map(|_| outbound(payload.clone())).collect();

        for frame in frames {
            assert_eq!(frame, Message::Binary(vec![b'o', b'k', 0xc3]));
        }
        assert_eq!(&payload[..], &[b'o', b'k', 0xc3]);
    }
}
