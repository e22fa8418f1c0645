// Shared transport configuration for building reqwest::Client instances.
//
// Both the device client and the discovery client share timeout and
// retry-pacing settings through this module, avoiding duplicated
// builder logic.

use std::time::Duration;

/// Shared transport configuration for building HTTP clients.
///
/// `timeout` bounds every individual network attempt; `retry_backoff`
/// is the fixed pause the device client inserts between attempts.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub retry_backoff: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("pixgate/0.1.0")
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
