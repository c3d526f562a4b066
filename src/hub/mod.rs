//! Connection Hub
//!
//! Single authority over the set of live connections.
//!
//! ## Architecture
//!
//! - **Hub**: one task that owns every registered connection and handles
//!   intents one at a time
//! - **HubHandle**: cloneable submission side of the hub's unbounded intake
//! - **Lifecycle**: one task per connection that registers it, forwards
//!   inbound messages as broadcasts and unregisters it when reading fails
//!
//! Nothing outside the hub task reads or mutates the connection set, so no
//! locks guard it. A connection is closed only when the hub removes it,
//! which happens at most once.
//!
//! ## Example
//!
//! ```rust,ignore
//! let (hub, _task) = Hub::spawn(HubConfig::default());
//!
//! tokio::spawn(run_connection(
//!     hub.clone(),
//!     sink,
//!     stream,
//!     Some(Bytes::from_static(READINESS_MARKER)),
//! ));
//!
//! let stats = hub.snapshot().await?;
//! println!("{} connections", stats.connection_count());
//! ```

mod actor;
mod connection;
mod handle;
mod intent;
mod lifecycle;

#[cfg(test)]
pub(crate) mod mock;

pub use actor::{Hub, HubConfig};
pub use connection::{ConnectionError, ConnectionId, ConnectionSink, ConnectionStream};
pub use handle::{HubError, HubHandle};
pub use intent::{HubStats, Intent};
pub use lifecycle::{run_connection, READINESS_MARKER};
