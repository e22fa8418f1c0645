// Device LAN HTTP client
//
// Wraps `reqwest::Client` with Divoom-specific endpoint construction,
// ack parsing, and the transport retry loop. One client per configured
// device -- no connection state is shared across devices.

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::wire::{Ack, WireFrame};

/// HTTP client for one pixel-display device's LAN control endpoint.
///
/// Commands go to `http://{host}/post` as JSON. Transport-layer flakes
/// (refused, timeout, reset) are retried up to the configured budget
/// with a fixed backoff; anything the device actually *answered* --
/// including a malformed body or a non-zero `error_code` -- is returned
/// on the first attempt.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    endpoint: Url,
    retry_budget: u32,
    retry_backoff: Duration,
}

impl DeviceClient {
    /// Create a client for a device at `host` (an IP, optionally with a
    /// port -- devices listen on plain HTTP port 80).
    pub fn new(host: &str, transport: &TransportConfig, retry_budget: u32) -> Result<Self, Error> {
        let endpoint = Url::parse(&format!("http://{host}/post"))?;
        Self::with_endpoint(endpoint, transport, retry_budget)
    }

    /// Create a client with an explicit endpoint URL.
    pub fn with_endpoint(
        endpoint: Url,
        transport: &TransportConfig,
        retry_budget: u32,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            endpoint,
            retry_budget: retry_budget.clamp(1, 30),
            retry_backoff: transport.retry_backoff,
        })
    }

    /// The device's control endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one wire frame and decode the device's acknowledgement.
    ///
    /// Retries only transport-layer failures, up to `retry_budget` total
    /// attempts. Exhausting the budget yields [`Error::Unreachable`]
    /// with the attempt count and last underlying error.
    pub async fn send(&self, frame: &WireFrame) -> Result<Ack, Error> {
        let mut last_error: Option<Error> = None;

        for attempt in 1..=self.retry_budget {
            match self.send_once(frame).await {
                Ok(ack) => {
                    debug!(
                        endpoint = %self.endpoint,
                        command = frame.command().unwrap_or("<none>"),
                        ok = ack.ok,
                        "device acknowledged"
                    );
                    return Ok(ack);
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        endpoint = %self.endpoint,
                        attempt,
                        budget = self.retry_budget,
                        error = %e,
                        "transport attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < self.retry_budget {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
                // Malformed acks and other non-network failures are
                // terminal answers, not flakiness.
                Err(e) => return Err(e),
            }
        }

        Err(Error::Unreachable {
            attempts: self.retry_budget,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown transport failure".to_owned()),
        })
    }

    async fn send_once(&self, frame: &WireFrame) -> Result<Ack, Error> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(frame)
            .send()
            .await
            .map_err(Error::Transport)?;

        let body = resp.text().await.map_err(Error::Transport)?;
        Ack::decode(&body)
    }
}
