//! Relay Route
//!
//! GET / - upgrade to a WebSocket and join the relay.
//!
//! The origin check runs before the upgrade; a rejected or failed upgrade
//! never reaches the hub.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::hub::{run_connection, HubHandle};
use crate::websocket;

/// WebSocket upgrade handler
pub async fn relay_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> ApiResult<Response> {
    state.origins.check(&headers).map_err(ApiError::OriginRejected)?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected non-WebSocket request");
            return Ok(rejection.into_response());
        }
    };

    let hub = state.hub.clone();
    let greeting = state.greeting.clone();

    Ok(ws
        .on_failed_upgrade(|e: axum::Error| {
            tracing::warn!(error = %e, "WebSocket upgrade failed")
        })
        .on_upgrade(move |socket| handle_socket(socket, hub, greeting)))
}

/// Run an upgraded socket through the hub until its reader stops
async fn handle_socket(socket: WebSocket, hub: HubHandle, greeting: Option<Bytes>) {
    let (sink, stream) = websocket::split(socket);
    let id = stream.id();

    tracing::debug!(connection_id = %id, "WebSocket upgraded");
    run_connection(hub, sink, stream, greeting).await;
    tracing::debug!(connection_id = %id, "WebSocket reader finished");
}
