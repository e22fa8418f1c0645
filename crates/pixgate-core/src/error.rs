// ── Core error types ──
//
// User-facing errors from pixgate-core. These are NOT transport-specific --
// consumers never see reqwest errors or JSON parse failures directly.
// The `From<pixgate_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration / resolution (startup) ─────────────────────────
    /// Invalid or missing static configuration. Fatal at startup.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The cloud lookup service was unreachable or answered garbage.
    #[error("Device discovery failed: {message}")]
    DiscoveryFailed { message: String },

    /// Discovery succeeded but produced no usable candidate for this
    /// device (empty list, or every IP already claimed).
    #[error("No matching device found (looked for {})", .hint.as_deref().unwrap_or("any unclaimed device"))]
    NoDeviceFound { hint: Option<String> },

    /// Every configured entry failed resolution (or none were given).
    #[error("No valid devices could be registered")]
    NoValidDevices,

    // ── Per-request ──────────────────────────────────────────────────
    /// The request referenced a device not in the registry.
    #[error("Device not found: {identifier} (available: {available})")]
    DeviceNotFound {
        identifier: String,
        available: String,
    },

    /// A command field violated its declared constraint. Raised before
    /// any network I/O.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The command variant is not valid for the target device's family.
    /// Raised before any network I/O.
    #[error("Operation '{operation}' is not supported by {family} devices")]
    UnsupportedOperation {
        operation: &'static str,
        family: crate::model::DeviceFamily,
    },

    /// The transport retry budget was exhausted.
    #[error("Device unreachable after {attempts} attempt(s): {last_error}")]
    DeviceUnreachable { attempts: u32, last_error: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// HTTP-style classification of a core error, consumed by the serving
/// layer. Keeps status-code policy out of route handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The caller's request was invalid (validation, wrong family).
    InvalidRequest,
    /// The referenced device/resource does not exist.
    NotFound,
    /// The device could not be reached on the LAN.
    Unreachable,
    /// The gateway itself is not in a state to serve the request.
    Unavailable,
}

impl CoreError {
    /// Classify this error for the HTTP boundary.
    pub fn status_class(&self) -> StatusClass {
        match self {
            Self::InvalidField { .. } | Self::UnsupportedOperation { .. } | Self::Config { .. } => {
                StatusClass::InvalidRequest
            }
            Self::DeviceNotFound { .. } | Self::NoDeviceFound { .. } => StatusClass::NotFound,
            Self::DeviceUnreachable { .. } => StatusClass::Unreachable,
            Self::DiscoveryFailed { .. } | Self::NoValidDevices | Self::Internal(_) => {
                StatusClass::Unavailable
            }
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<pixgate_api::Error> for CoreError {
    fn from(err: pixgate_api::Error) -> Self {
        match err {
            pixgate_api::Error::Unreachable {
                attempts,
                last_error,
            } => CoreError::DeviceUnreachable {
                attempts,
                last_error,
            },
            pixgate_api::Error::Discovery { message } => CoreError::DiscoveryFailed { message },
            pixgate_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            // A bare transport error only escapes the device client when
            // it was non-transient (e.g. request build failure).
            pixgate_api::Error::Transport(e) => CoreError::Internal(e.to_string()),
            // Handled as data at the dispatcher; reaching here means a
            // non-dispatch call path hit it.
            pixgate_api::Error::MalformedAck { message, .. } => {
                CoreError::Internal(format!("malformed device ack: {message}"))
            }
        }
    }
}
