//! Origin Policy
//!
//! Decides whether a browser origin may open a relay connection. The
//! policy is independent of the hub; it only gates the upgrade.

use axum::http::{header, HeaderMap};

/// Allow-list of origins
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    /// Build a policy from configured origins
    ///
    /// An empty list accepts every request, with or without an `Origin`
    /// header.
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed
                .into_iter()
                .map(|o| o.trim_end_matches('/').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Policy that accepts every origin
    pub fn allow_any() -> Self {
        Self::default()
    }

    pub fn allows_any(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Check the request's `Origin` header against the allow-list
    ///
    /// Requests without an `Origin` header are not from a browser and are
    /// accepted.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), String> {
        if self.allows_any() {
            return Ok(());
        }

        let Some(origin) = headers.get(header::ORIGIN) else {
            return Ok(());
        };

        let origin = origin
            .to_str()
            .map_err(|_| "Origin header is not valid ASCII".to_string())?;
        let normalized = origin.trim_end_matches('/').to_ascii_lowercase();

        if self.allowed.iter().any(|allowed| *allowed == normalized) {
            Ok(())
        } else {
            Err(origin.to_string())
        }
    }
}
