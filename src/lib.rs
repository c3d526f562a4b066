//! # Relay
//!
//! Real-time WebSocket fan-out relay. Every message a client sends is
//! broadcast verbatim to every connected client, the sender included.
//!
//! ## Modules
//!
//! - [`hub`]: Connection hub, the single owner of the live connection set
//! - [`websocket`]: Adapter from axum WebSockets to hub connections
//! - [`api`]: HTTP server with Axum (upgrade and health routes)
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay::{Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.server.addr = "127.0.0.1:8080".to_string();
//!
//!     let server = Server::bind(&config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod hub;
pub mod websocket;

pub use api::{build_router, serve, ApiError, ApiResult, AppState, OriginPolicy, Server};

pub use config::{
    Config, ConfigError, DefaultLoad, HubSettings, LogFormat, LoggingConfig, ServerConfig,
};

pub use hub::{
    run_connection, ConnectionError, ConnectionId, ConnectionSink, ConnectionStream, Hub,
    HubConfig, HubError, HubHandle, HubStats, Intent, READINESS_MARKER,
};
