// ── Device classifier ──
//
// Resolves a configured `DeviceEntry` into a ready `DeviceProfile`:
// IP lookup via the injected discovery source, family classification
// from the vendor-reported name, and resolution clamping. One
// `ResolutionPass` spans a whole registration so that IPs claimed by
// earlier entries are visible to later auto-discovered ones.

use std::collections::HashSet;
use std::future::Future;

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{
    DeviceEntry, DeviceFamily, DeviceProfile, MULTI_PANEL_MIN_RESOLUTION,
    SINGLE_PANEL_RESOLUTIONS,
};
use pixgate_api::{DiscoveryClient, DiscoveryRecord};

/// Source of discovery records, injected so tests can run against a
/// fake instead of the vendor cloud.
pub trait DiscoverySource {
    /// Fetch the current LAN device list. Called at most once per
    /// resolution pass; a failure is terminal for that pass.
    fn fetch(
        &self,
    ) -> impl Future<Output = Result<Vec<DiscoveryRecord>, pixgate_api::Error>> + Send;
}

impl DiscoverySource for DiscoveryClient {
    async fn fetch(&self) -> Result<Vec<DiscoveryRecord>, pixgate_api::Error> {
        self.lan_devices().await
    }
}

/// Normalize a device name for matching: lowercase with spaces,
/// underscores and hyphens stripped. "Time-Gate", "time_gate" and
/// "TIME GATE" all normalize to "timegate".
pub fn normalize_name(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn looks_like_gate(device_name: &str) -> bool {
    normalize_name(device_name).contains("timegate")
}

/// One registration-wide resolution pass.
///
/// Fetches the discovery list lazily (at most once) and threads the
/// set of claimed IPs through successive [`resolve`](Self::resolve)
/// calls, so two auto-discovered entries never land on the same device.
pub struct ResolutionPass<'a, S> {
    source: &'a S,
    records: Option<Vec<DiscoveryRecord>>,
    claimed: HashSet<String>,
}

impl<'a, S: DiscoverySource> ResolutionPass<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            records: None,
            claimed: HashSet::new(),
        }
    }

    /// Resolve one entry into a ready profile.
    ///
    /// Idempotent given the same discovery response. Manually-addressed
    /// entries never touch the discovery source.
    pub async fn resolve(&mut self, entry: &DeviceEntry) -> Result<DeviceProfile, CoreError> {
        let (ip, discovered_name) = if entry.auto_discover {
            let record = self.discover(entry).await?;
            (record.private_ip, Some(record.device_name))
        } else {
            let host = entry
                .host
                .as_deref()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| CoreError::Config {
                    message: format!(
                        "device '{}' has no host and auto_discover is disabled",
                        entry.name.as_deref().unwrap_or("<unnamed>")
                    ),
                })?;
            (host.to_owned(), None)
        };
        self.claimed.insert(ip.clone());

        let family = match entry.family.pinned() {
            Some(pinned) => pinned,
            None => match &discovered_name {
                Some(name) if looks_like_gate(name) => DeviceFamily::MultiPanel,
                Some(_) => DeviceFamily::SinglePanel,
                None => {
                    // Manual IP with family=auto: nothing to sniff from.
                    warn!(
                        ip = %ip,
                        "no discovery name available for family classification, \
                         defaulting to single-panel"
                    );
                    DeviceFamily::SinglePanel
                }
            },
        };

        let resolution = effective_resolution(entry.resolution, family)?;

        let name = entry
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| ip.clone());

        debug!(name = %name, ip = %ip, %family, resolution, "device resolved");

        Ok(DeviceProfile {
            name,
            ip,
            family,
            resolution,
            debug: entry.debug,
            retry_budget: entry.retry_budget,
        })
    }

    /// Pick a discovery record for an auto-discovered entry.
    ///
    /// A configured name matches any record whose normalized name
    /// contains it (first match wins); unnamed entries take the first
    /// record whose IP has not been claimed in this pass.
    async fn discover(&mut self, entry: &DeviceEntry) -> Result<DiscoveryRecord, CoreError> {
        if self.records.is_none() {
            self.records = Some(self.source.fetch().await?);
        }
        let records = self.records.as_deref().unwrap_or_default();

        let wanted = entry
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(normalize_name);

        let by_name = wanted.as_deref().and_then(|needle| {
            records.iter().find(|r| {
                !self.claimed.contains(&r.private_ip)
                    && normalize_name(&r.device_name).contains(needle)
            })
        });

        let chosen = by_name
            .or_else(|| records.iter().find(|r| !self.claimed.contains(&r.private_ip)))
            .ok_or_else(|| CoreError::NoDeviceFound {
                hint: entry.name.clone(),
            })?;

        Ok(chosen.clone())
    }
}

/// Apply the family resolution rules: multi-panel is clamped up to the
/// 128px minimum; single-panel must be one of the supported sizes.
fn effective_resolution(configured: u32, family: DeviceFamily) -> Result<u32, CoreError> {
    match family {
        DeviceFamily::MultiPanel => Ok(configured.max(MULTI_PANEL_MIN_RESOLUTION)),
        DeviceFamily::SinglePanel => {
            if SINGLE_PANEL_RESOLUTIONS.contains(&configured) {
                Ok(configured)
            } else {
                Err(CoreError::Config {
                    message: format!(
                        "unsupported single-panel resolution {configured} (expected one of 16, 32, 64)"
                    ),
                })
            }
        }
    }
}
