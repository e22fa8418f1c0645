// Cloud discovery client
//
// The vendor cloud maps devices on the caller's LAN to their private IP
// and reported name. One POST, bounded timeout, no retry -- a failed
// lookup is terminal for that resolution pass; the classifier decides
// what that means for each device.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Divoom cloud endpoint listing devices on the same LAN as the caller.
pub const DISCOVERY_ENDPOINT: &str = "https://app.divoom-gms.com/Device/ReturnSameLANDevice";

/// One entry from the cloud lookup response.
///
/// Ephemeral: consumed during device resolution and not retained.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscoveryRecord {
    /// Vendor-reported device name, free text (e.g. `"Hallway TimeGate"`).
    #[serde(rename = "DeviceName")]
    pub device_name: String,
    /// LAN address the device can be reached at.
    #[serde(rename = "DevicePrivateIP")]
    pub private_ip: String,
}

#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    #[serde(rename = "ReturnCode", default)]
    return_code: i64,
    #[serde(rename = "ReturnMessage", default)]
    return_message: Option<String>,
    #[serde(rename = "DeviceList", default)]
    device_list: Vec<DiscoveryRecord>,
}

/// HTTP client for the cloud device lookup service.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl DiscoveryClient {
    /// Create a client against the production cloud endpoint.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let endpoint = Url::parse(DISCOVERY_ENDPOINT)?;
        Self::with_endpoint(endpoint, transport)
    }

    /// Create a client against an explicit endpoint (tests point this at
    /// a local mock).
    pub fn with_endpoint(endpoint: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, endpoint })
    }

    /// Fetch the list of devices the cloud sees on this LAN.
    ///
    /// The response is untrusted and best-effort: an HTTP failure, a
    /// non-zero `ReturnCode`, or an unparseable body all degrade to
    /// [`Error::Discovery`], never a panic.
    pub async fn lan_devices(&self) -> Result<Vec<DiscoveryRecord>, Error> {
        debug!(endpoint = %self.endpoint, "querying device discovery service");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| Error::Discovery {
                message: format!("lookup request failed: {e}"),
            })?;

        let body = resp.text().await.map_err(|e| Error::Discovery {
            message: format!("lookup response unreadable: {e}"),
        })?;

        let parsed: DiscoveryResponse =
            serde_json::from_str(&body).map_err(|e| Error::Discovery {
                message: format!("lookup response malformed: {e}"),
            })?;

        if parsed.return_code != 0 {
            return Err(Error::Discovery {
                message: parsed
                    .return_message
                    .unwrap_or_else(|| format!("ReturnCode={}", parsed.return_code)),
            });
        }

        debug!(count = parsed.device_list.len(), "discovery returned devices");
        Ok(parsed.device_list)
    }
}
