//! Application State
//!
//! Shared state accessible by all handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Instant;

use super::origin::OriginPolicy;
use crate::hub::{HubHandle, READINESS_MARKER};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Submission side of the connection hub
    pub hub: HubHandle,
    /// Which origins may open a connection
    pub origins: OriginPolicy,
    /// First message written to every new connection
    pub greeting: Option<Bytes>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Wall-clock start time, reported by the health endpoint
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state that accepts any origin and sends the readiness marker
    pub fn new(hub: HubHandle) -> Self {
        Self {
            hub,
            origins: OriginPolicy::allow_any(),
            greeting: Some(Bytes::from_static(READINESS_MARKER)),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn with_origins(mut self, origins: OriginPolicy) -> Self {
        self.origins = origins;
        self
    }

    /// Enable or disable the readiness marker
    pub fn with_readiness_marker(mut self, enabled: bool) -> Self {
        self.greeting = enabled.then(|| Bytes::from_static(READINESS_MARKER));
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
