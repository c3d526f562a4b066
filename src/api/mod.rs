//! Relay HTTP Server
//!
//! HTTP layer for the relay, built with Axum.
//!
//! # Endpoints
//!
//! ## Relay
//! - `GET /` - WebSocket upgrade; every message sent on the socket is
//!   broadcast to every connected socket, the sender included
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Hub status
//!
//! # Example
//!
//! ```rust,ignore
//! use relay::{Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(&Config::default()).await?;
//!     println!("listening on {}", server.local_addr()?);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod origin;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use origin::OriginPolicy;
pub use state::AppState;

use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::hub::{Hub, HubHandle};

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::relay::relay_handler))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

/// A bound listener with its hub, ready to serve
pub struct Server {
    listener: TcpListener,
    router: Router,
    hub: HubHandle,
    hub_task: JoinHandle<()>,
}

impl Server {
    /// Bind the configured address and start the hub
    ///
    /// Failing to bind is the only fatal error the relay has.
    pub async fn bind(config: &Config) -> ApiResult<Self> {
        let addr = config.server.addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ApiError::Bind { addr, source })?;

        let (hub, hub_task) = Hub::spawn(config.hub.hub_config());
        let state = AppState::new(hub.clone())
            .with_origins(OriginPolicy::new(config.server.allowed_origins.clone()))
            .with_readiness_marker(config.hub.readiness_marker);

        Ok(Self {
            listener,
            router: build_router(state),
            hub,
            hub_task,
        })
    }

    pub fn local_addr(&self) -> ApiResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the running hub
    pub fn hub(&self) -> HubHandle {
        self.hub.clone()
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> ApiResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then close every connection
    pub async fn run_until<F>(self, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server {
            listener,
            router,
            hub,
            hub_task,
        } = self;

        tracing::info!("Relay listening on {}", listener.local_addr()?);

        // Upgraded sockets are detached from the server, so it stops without
        // waiting on them; the hub closes them afterwards.
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

        if let Err(e) = hub.shutdown().await {
            tracing::debug!(error = %e, "Hub already stopped");
        }
        drop(hub);
        if let Err(e) = hub_task.await {
            tracing::error!(error = %e, "Hub task failed");
        }

        tracing::info!("Relay shut down gracefully");
        Ok(())
    }
}

/// Bind and serve with the given configuration
pub async fn serve(config: &Config) -> ApiResult<()> {
    Server::bind(config).await?.run().await
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
