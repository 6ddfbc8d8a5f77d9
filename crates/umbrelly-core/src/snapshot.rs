// ── Refresh snapshot ──
//
// One immutable, merged view of the host per refresh cycle. A new cycle
// builds a whole new `Snapshot`; nothing mutates a published one.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use umbrelly_api::{App, AppUsage, BackupProgress, ExternalDevice, SystemInfo, UpdateInfo};

/// One of the six independent fetches in a refresh cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Facet {
    System,
    Apps,
    Update,
    TwoFactor,
    ExternalDevices,
    BackupProgress,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::System,
        Facet::Apps,
        Facet::Update,
        Facet::TwoFactor,
        Facet::ExternalDevices,
        Facet::BackupProgress,
    ];
}

/// Result of one refresh cycle.
///
/// Every facet is always present. A facet whose fetch failed holds its
/// default value and is listed in `degraded`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub system: SystemInfo,
    pub apps: Vec<App>,
    pub update: UpdateInfo,
    pub two_factor_enabled: bool,
    pub external_devices: Vec<ExternalDevice>,
    pub backup_progress: Vec<BackupProgress>,
    /// When the cycle that produced this snapshot finished.
    pub refreshed_at: DateTime<Utc>,
    /// Facets that fell back to defaults in this cycle.
    pub degraded: BTreeSet<Facet>,
}

impl Snapshot {
    pub fn app(&self, app_id: &str) -> Option<&App> {
        self.apps.iter().find(|a| a.id == app_id)
    }

    pub fn external_device(&self, device_id: &str) -> Option<&ExternalDevice> {
        self.external_devices.iter().find(|d| d.id == device_id)
    }

    /// Per-app memory breakdown from `system.memoryUsage`.
    pub fn memory_apps(&self) -> &[AppUsage] {
        match &self.system.memory {
            Some(memory) => memory.apps(),
            None => &[],
        }
    }

    pub fn backup_running(&self) -> bool {
        self.backup_progress.iter().any(BackupProgress::is_in_progress)
    }

    pub fn is_degraded(&self, facet: Facet) -> bool {
        self.degraded.contains(&facet)
    }

    /// Whether every facet failed in this cycle.
    pub fn is_empty_cycle(&self) -> bool {
        self.degraded.len() == Facet::ALL.len()
    }
}
