// ── Command dispatcher ──
//
// The single entry point request handling calls into: resolve the
// target device, validate + encode the command, send it over the LAN
// protocol, and normalize the result. Every failure is mapped into the
// `CoreError` taxonomy; no transport or codec error escapes raw.

use arc_swap::ArcSwap;
use std::sync::Arc;

use tracing::debug;

use crate::codec;
use crate::command::Command;
use crate::error::CoreError;
use crate::registry::DeviceRegistry;

/// An inbound request's device reference. Both fields empty targets the
/// default (first configured) device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRef {
    pub name: Option<String>,
    pub ip: Option<String>,
}

impl TargetRef {
    /// Target the default device.
    pub fn default_device() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            ..Self::default()
        }
    }
}

/// Normalized result of a dispatched command.
///
/// `ok = false` with an `Ok(..)` return means the *device* rejected the
/// command (or answered unparseably) -- that is data, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub ok: bool,
    pub message: String,
}

/// The command-dispatch façade.
///
/// Holds the registry behind an `ArcSwap` so a configuration reload can
/// atomically swap in a freshly built registry while in-flight
/// dispatches keep the one they started with.
pub struct Gateway {
    registry: ArcSwap<DeviceRegistry>,
}

impl Gateway {
    pub fn new(registry: DeviceRegistry) -> Self {
        Self {
            registry: ArcSwap::from_pointee(registry),
        }
    }

    /// Atomically replace the registry (configuration reload).
    pub fn reload(&self, registry: DeviceRegistry) {
        self.registry.store(Arc::new(registry));
    }

    /// A snapshot of the current registry (for listings).
    pub fn registry(&self) -> Arc<DeviceRegistry> {
        self.registry.load_full()
    }

    /// Dispatch one command to the referenced device.
    ///
    /// Validation (`InvalidField`, `UnsupportedOperation`) happens
    /// before any network I/O. Dispatch is stateless across calls: a
    /// multi-panel text command issued before any animation layer is
    /// active fails *at the device* and comes back as a normal
    /// `ok = false` outcome, not a client-side validation error.
    pub async fn dispatch(
        &self,
        target: &TargetRef,
        command: &Command,
    ) -> Result<CommandOutcome, CoreError> {
        let registry = self.registry.load_full();
        let handle = registry.resolve_target(target.name.as_deref(), target.ip.as_deref())?;

        let frame = codec::encode(command, &handle.profile)?;
        if handle.profile.debug {
            debug!(
                device = %handle.profile.name,
                payload = %frame.as_value(),
                "sending wire frame"
            );
        }

        match handle.client.send(&frame).await {
            Ok(ack) => Ok(CommandOutcome {
                ok: ack.ok,
                message: ack.message,
            }),
            // An answered-but-unparseable response is surfaced as a
            // failed outcome; only transport failures become errors.
            Err(pixgate_api::Error::MalformedAck { message, .. }) => Ok(CommandOutcome {
                ok: false,
                message: format!("unparseable device response: {message}"),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
