use thiserror::Error;

/// Top-level error type for the `pixgate-api` crate.
///
/// Covers the transport-facing failure modes: HTTP plumbing, retry
/// exhaustion, unparseable device acknowledgements, and the cloud
/// discovery service. `pixgate-core` maps these into its own taxonomy;
/// callers there never see raw `reqwest` errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The retry budget ran out without a single successful exchange.
    ///
    /// Carries the total number of attempts made and the last underlying
    /// transport error, for diagnostics.
    #[error("Device unreachable after {attempts} attempt(s): {last_error}")]
    Unreachable { attempts: u32, last_error: String },

    // ── Protocol ────────────────────────────────────────────────────
    /// The device answered, but the bytes were not the expected
    /// `{ error_code, .. }` envelope. Kept distinct from `Transport`
    /// because it must never be retried.
    #[error("Malformed device ack: {message}")]
    MalformedAck { message: String, body: String },

    // ── Discovery ───────────────────────────────────────────────────
    /// The cloud lookup service answered with an error or an
    /// unparseable body.
    #[error("Discovery service error: {message}")]
    Discovery { message: String },
}

impl Error {
    /// Returns `true` if this is a transport-layer flake worth retrying.
    ///
    /// Only connection-level failures qualify; a malformed ack or a
    /// discovery error is a terminal answer, not flakiness.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            _ => false,
        }
    }
}
