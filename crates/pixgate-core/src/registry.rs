// ── Device registry ──
//
// Holds every configured device with its bound transport client and
// resolves inbound target references. Built once at startup (or per
// reload) and read-only afterwards; concurrent lookups need no locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::classifier::{DiscoverySource, ResolutionPass};
use crate::error::CoreError;
use crate::model::{DeviceEntry, DeviceProfile};
use pixgate_api::{DeviceClient, TransportConfig};

/// A resolved device bound to its transport client.
#[derive(Debug)]
pub struct DeviceHandle {
    pub profile: DeviceProfile,
    pub client: DeviceClient,
}

/// The set of ready devices, indexed by logical name and IP.
///
/// The first successfully resolved entry is the default target. A
/// configuration reload builds a fresh registry and swaps it in whole;
/// profiles are never mutated in place.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<Arc<DeviceHandle>>,
    by_name: HashMap<String, usize>,
    by_ip: HashMap<String, usize>,
}

impl DeviceRegistry {
    /// Resolve and register the configured entries, in order.
    ///
    /// Earlier entries claim discovery IPs first. Name collisions are
    /// deduplicated by suffixing an index (`office`, `office-2`, ...).
    /// Entries that fail resolution are logged and skipped -- except a
    /// discovery-service failure, which aborts registration because any
    /// remaining auto-discovered entry would be unresolvable too.
    pub async fn register<S: DiscoverySource>(
        entries: &[DeviceEntry],
        source: &S,
        transport: &TransportConfig,
    ) -> Result<Self, CoreError> {
        let mut registry = Self::default();
        let mut pass = ResolutionPass::new(source);
        let mut used_names: HashSet<String> = HashSet::new();

        for entry in entries {
            let profile = match pass.resolve(entry).await {
                Ok(profile) => profile,
                Err(err @ CoreError::DiscoveryFailed { .. }) => return Err(err),
                Err(err) => {
                    warn!(
                        device = entry.name.as_deref().unwrap_or("<unnamed>"),
                        error = %err,
                        "skipping device that failed resolution"
                    );
                    continue;
                }
            };
            registry.add(profile, transport, &mut used_names)?;
        }

        if registry.devices.is_empty() {
            return Err(CoreError::NoValidDevices);
        }

        info!(
            devices = registry.devices.len(),
            default = %registry.devices[0].profile.name,
            "device registry ready"
        );
        Ok(registry)
    }

    fn add(
        &mut self,
        mut profile: DeviceProfile,
        transport: &TransportConfig,
        used_names: &mut HashSet<String>,
    ) -> Result<(), CoreError> {
        profile.name = unique_name(&profile.name, used_names);

        let client = DeviceClient::new(&profile.ip, transport, profile.retry_budget)?;
        let index = self.devices.len();
        self.by_name.insert(profile.name.to_lowercase(), index);
        self.by_ip.insert(profile.ip.clone(), index);
        self.devices.push(Arc::new(DeviceHandle { profile, client }));
        Ok(())
    }

    /// Resolve a target reference to a device handle.
    ///
    /// Precedence: exact IP match, then exact (case-insensitive) name
    /// match, then the default device when neither reference is given.
    pub fn resolve_target(
        &self,
        name: Option<&str>,
        ip: Option<&str>,
    ) -> Result<&Arc<DeviceHandle>, CoreError> {
        if let Some(ip) = ip {
            if let Some(&index) = self.by_ip.get(ip) {
                return Ok(&self.devices[index]);
            }
        }
        if let Some(name) = name {
            if let Some(&index) = self.by_name.get(&name.to_lowercase()) {
                return Ok(&self.devices[index]);
            }
        }

        if ip.is_some() || name.is_some() {
            return Err(CoreError::DeviceNotFound {
                identifier: ip.or(name).unwrap_or_default().to_owned(),
                available: self.names().join(", "),
            });
        }

        // Invariant: a registry is never built empty.
        self.devices.first().ok_or(CoreError::NoValidDevices)
    }

    /// All registered profiles, in registration order.
    pub fn profiles(&self) -> impl Iterator<Item = &DeviceProfile> {
        self.devices.iter().map(|h| &h.profile)
    }

    /// Registered logical names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.devices.iter().map(|h| h.profile.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn unique_name(wanted: &str, used: &mut HashSet<String>) -> String {
    let key = wanted.to_lowercase();
    if used.insert(key.clone()) {
        return wanted.to_owned();
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{key}-{suffix}");
        if used.insert(candidate) {
            return format!("{wanted}-{suffix}");
        }
        suffix += 1;
    }
}
