// Wire frame and acknowledgement envelope for the Divoom LAN protocol.
//
// Devices accept a JSON object with a `Command` discriminator on
// `POST http://{host}/post` and answer with `{ error_code, .. }`.
// Encoding of typed commands into frames lives in `pixgate-core`; this
// module only owns the envelope shapes and ack parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// A serialized command envelope ready to be posted to a device.
///
/// Always a JSON object carrying a `Command` key (e.g.
/// `"Channel/SetBrightness"`). Constructed by the core codec; the
/// device client treats it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WireFrame(Value);

impl WireFrame {
    /// Wrap an already-built JSON object.
    ///
    /// The codec guarantees the `Command` key is present; this type does
    /// not re-validate.
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    /// The vendor opcode (`Command` field), if present.
    pub fn command(&self) -> Option<&str> {
        self.0.get("Command").and_then(Value::as_str)
    }

    /// The raw JSON payload.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Raw ack envelope as the device serializes it.
#[derive(Debug, Deserialize)]
struct RawAck {
    error_code: i64,
    #[serde(default)]
    error_message: Option<String>,
}

/// Normalized device acknowledgement.
///
/// A non-zero `error_code` is a *device-reported* rejection: it travels
/// as data (`ok = false`), never as an `Error`. Only unparseable bytes
/// are an error ([`Error::MalformedAck`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub ok: bool,
    pub error_code: i64,
    pub message: String,
}

impl Ack {
    /// Parse a raw response body into a normalized ack.
    pub fn decode(body: &str) -> Result<Self, Error> {
        let raw: RawAck = serde_json::from_str(body).map_err(|e| Error::MalformedAck {
            message: e.to_string(),
            body: body.to_owned(),
        })?;

        let ok = raw.error_code == 0;
        let message = match raw.error_message {
            Some(msg) if !msg.is_empty() => msg,
            _ if ok => "OK".to_owned(),
            _ => format!("device error_code={}", raw.error_code),
        };

        Ok(Self {
            ok,
            error_code: raw.error_code,
            message,
        })
    }
}
