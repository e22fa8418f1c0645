//! Shared configuration for the pixgate gateway binary.
//!
//! TOML file + `PIXGATE_*` environment overrides, plus a JSON
//! device-list environment variable for container deployments, all
//! translated into `pixgate_core::DeviceEntry` values. The core crate
//! never reads config files.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pixgate_core::{DeviceEntry, FamilyHint};

/// Environment variable carrying a JSON array of device entries,
/// overriding the TOML `[[devices]]` table when set.
pub const DEVICES_JSON_ENV: &str = "PIXGATE_DEVICES_JSON";

/// Retry budgets outside 1..=30 are rejected rather than silently
/// adjusted; the transport layer depends on the bound.
const RETRY_BUDGET_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{DEVICES_JSON_ENV} is not a valid JSON device list: {0}")]
    DevicesJson(#[from] serde_json::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config structs ──────────────────────────────────────────────────

fn default_listen() -> String {
    "0.0.0.0:5000".to_owned()
}
fn default_timeout() -> u64 {
    10
}
fn default_backoff_ms() -> u64 {
    500
}
fn default_resolution() -> u32 {
    64
}
fn default_retries() -> u32 {
    3
}

/// Top-level gateway configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Address the HTTP surface binds to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Per-attempt network timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Fixed pause between transport retry attempts, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Configured devices, in declaration order. Order matters: the
    /// first resolvable entry becomes the default target, and earlier
    /// entries claim discovery IPs first.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            timeout_secs: default_timeout(),
            retry_backoff_ms: default_backoff_ms(),
            devices: Vec::new(),
        }
    }
}

/// One `[[devices]]` table entry (or JSON array element).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Human-assigned label; also the lookup key.
    #[serde(default)]
    pub name: Option<String>,

    /// LAN address. Omitting it implies auto-discovery.
    #[serde(default)]
    pub host: Option<String>,

    /// Resolve the address via the cloud lookup service. Defaults to
    /// `true` exactly when `host` is absent.
    #[serde(default)]
    pub auto_discover: Option<bool>,

    /// Family hint: `auto`, `pixoo`, or `time_gate` (separator variants
    /// tolerated).
    #[serde(default)]
    pub device_type: Option<String>,

    /// Configured pixel dimension.
    #[serde(default = "default_resolution")]
    pub screen_size: u32,

    #[serde(default)]
    pub debug: bool,

    /// Transport attempts per command (1-30).
    #[serde(default = "default_retries")]
    pub connection_retries: u32,
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load configuration: defaults, then the TOML file (if any), then
/// `PIXGATE_*` environment overrides, then the JSON device-list
/// variable on top.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    let mut config: Config = figment
        .merge(Env::prefixed("PIXGATE_").ignore(&["DEVICES_JSON"]))
        .extract()?;

    if let Ok(raw) = std::env::var(DEVICES_JSON_ENV) {
        if !raw.trim().is_empty() {
            config.devices = devices_from_json(&raw)?;
        }
    }
    Ok(config)
}

/// Parse the JSON device-list override.
pub fn devices_from_json(raw: &str) -> Result<Vec<DeviceConfig>, ConfigError> {
    Ok(serde_json::from_str(raw)?)
}

impl Config {
    /// Translate configured devices into core entries, validating the
    /// fields the core layer takes on trust.
    pub fn device_entries(&self) -> Result<Vec<DeviceEntry>, ConfigError> {
        self.devices.iter().map(DeviceConfig::to_entry).collect()
    }
}

impl DeviceConfig {
    fn to_entry(&self) -> Result<DeviceEntry, ConfigError> {
        if !RETRY_BUDGET_RANGE.contains(&self.connection_retries) {
            return Err(ConfigError::Validation {
                field: "connection_retries".into(),
                reason: format!(
                    "{} is outside the supported range 1-30",
                    self.connection_retries
                ),
            });
        }

        let auto_discover = self.auto_discover.unwrap_or(self.host.is_none());
        if !auto_discover && self.host.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Validation {
                field: "host".into(),
                reason: "required when auto_discover is disabled".into(),
            });
        }

        Ok(DeviceEntry {
            name: self.name.clone().filter(|n| !n.is_empty()),
            host: self.host.clone().filter(|h| !h.is_empty()),
            auto_discover,
            family: self
                .device_type
                .as_deref()
                .map(FamilyHint::parse)
                .unwrap_or_default(),
            resolution: self.screen_size,
            debug: self.debug,
            retry_budget: self.connection_retries,
        })
    }
}
