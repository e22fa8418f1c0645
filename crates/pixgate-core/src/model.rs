// ── Domain model ──
//
// Device identity and capability types. A `DeviceEntry` is what the
// configuration layer hands in; the classifier turns it into a
// `DeviceProfile` (IP resolved, family pinned, resolution clamped),
// which is immutable for the rest of the process lifetime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Panel resolutions a single-panel device can be configured with.
pub const SINGLE_PANEL_RESOLUTIONS: [u32; 3] = [16, 32, 64];

/// Minimum supported pixel size for multi-panel devices.
pub const MULTI_PANEL_MIN_RESOLUTION: u32 = 128;

/// Device family, determining the valid command set and payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    /// Single-screen pixel display (16x16 to 64x64).
    SinglePanel,
    /// Multi-screen display addressed as an array of LCD panels.
    MultiPanel,
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SinglePanel => write!(f, "single-panel"),
            Self::MultiPanel => write!(f, "multi-panel"),
        }
    }
}

/// Configured family hint, before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyHint {
    /// Sniff the family from the discovery record's device name.
    #[default]
    Auto,
    /// Pinned single-panel.
    Pixoo,
    /// Pinned multi-panel.
    TimeGate,
}

impl FamilyHint {
    /// Parse a configured family hint, tolerating the separator variants
    /// users actually type (`time_gate`, `time-gate`, `TimeGate`, ...).
    pub fn parse(value: &str) -> Self {
        match crate::classifier::normalize_name(value).as_str() {
            "timegate" => Self::TimeGate,
            "auto" | "" => Self::Auto,
            _ => Self::Pixoo,
        }
    }

    /// The pinned family, if this hint pins one.
    pub fn pinned(self) -> Option<DeviceFamily> {
        match self {
            Self::Auto => None,
            Self::Pixoo => Some(DeviceFamily::SinglePanel),
            Self::TimeGate => Some(DeviceFamily::MultiPanel),
        }
    }
}

/// One device as configured, before resolution.
///
/// Produced by the configuration layer in declaration order; order
/// matters because earlier entries claim discovery IPs first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    /// Optional human-assigned label; also the lookup key after
    /// registration (collisions are deduplicated with a suffix).
    pub name: Option<String>,
    /// LAN address, if configured manually. May carry a port.
    pub host: Option<String>,
    /// Whether the IP must come from the cloud lookup service.
    pub auto_discover: bool,
    /// Family hint (`auto` sniffs from the discovery name).
    pub family: FamilyHint,
    /// Configured pixel dimension.
    pub resolution: u32,
    /// Verbosity flag for transport diagnostics.
    pub debug: bool,
    /// Maximum connection attempts before a command fails permanently.
    pub retry_budget: u32,
}

impl Default for DeviceEntry {
    fn default() -> Self {
        Self {
            name: None,
            host: None,
            auto_discover: false,
            family: FamilyHint::Auto,
            resolution: 64,
            debug: false,
            retry_budget: 3,
        }
    }
}

/// A fully resolved device: identity and capability descriptor.
///
/// Created once by the classifier during registration and immutable
/// thereafter. `name` is unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    /// Unique lookup key (configured name, or the host when unnamed).
    pub name: String,
    /// Resolved LAN address. Always non-empty once registered.
    pub ip: String,
    /// Classified device family.
    pub family: DeviceFamily,
    /// Effective pixel dimension (clamped for multi-panel).
    pub resolution: u32,
    /// Verbosity flag for transport diagnostics.
    pub debug: bool,
    /// Maximum transport attempts per command.
    pub retry_budget: u32,
}
