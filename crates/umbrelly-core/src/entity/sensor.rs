// Numeric and timestamp sensors.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use umbrelly_api::ExternalDevice;

use super::{Entity, EntityState, Platform};
use crate::snapshot::Snapshot;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Host-wide sensors read from `Snapshot::system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSensor {
    CpuUsage,
    MemoryUsage,
    DiskUsage,
    Temperature,
    /// Reported as the boot timestamp, not a duration.
    Uptime,
}

impl SystemSensor {
    pub const ALL: [SystemSensor; 5] = [
        Self::CpuUsage,
        Self::MemoryUsage,
        Self::DiskUsage,
        Self::Temperature,
        Self::Uptime,
    ];

    /// Numeric value, for every sensor except [`Uptime`](Self::Uptime).
    pub fn value(self, snapshot: &Snapshot) -> Option<f64> {
        let system = &snapshot.system;
        match self {
            Self::CpuUsage => system.cpu_usage.as_ref()?.percent(),
            Self::MemoryUsage => system.memory.as_ref()?.percent(),
            Self::DiskUsage => system.disk.as_ref()?.percent(),
            Self::Temperature => system.temperature.as_ref()?.celsius(),
            Self::Uptime => None,
        }
    }

    /// Boot time: `now` minus the reported uptime.
    pub fn boot_time(snapshot: &Snapshot, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let uptime = snapshot.system.uptime?;
        if !uptime.is_finite() || uptime < 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let millis = (uptime * 1000.0) as i64;
        Some(now - TimeDelta::milliseconds(millis))
    }
}

impl Entity for SystemSensor {
    fn unique_id(&self) -> String {
        let suffix = match self {
            Self::CpuUsage => "cpu_usage",
            Self::MemoryUsage => "memory_usage",
            Self::DiskUsage => "disk_usage",
            Self::Temperature => "temperature",
            Self::Uptime => "uptime",
        };
        format!("umbrel_{suffix}")
    }

    fn name(&self) -> String {
        match self {
            Self::CpuUsage => "CPU Usage",
            Self::MemoryUsage => "Memory Usage",
            Self::DiskUsage => "Disk Usage",
            Self::Temperature => "Temperature",
            Self::Uptime => "Uptime",
        }
        .into()
    }

    fn platform(&self) -> Platform {
        Platform::Sensor
    }

    fn unit(&self) -> Option<&'static str> {
        match self {
            Self::CpuUsage | Self::MemoryUsage | Self::DiskUsage => Some("%"),
            Self::Temperature => Some("°C"),
            Self::Uptime => None,
        }
    }

    fn state(&self, snapshot: &Snapshot) -> EntityState {
        match self {
            Self::Uptime => Self::boot_time(snapshot, Utc::now())
                .map_or(EntityState::Unknown, |value| EntityState::Timestamp { value }),
            _ => EntityState::number(self.value(snapshot)),
        }
    }
}

/// Memory used by one app, in MB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMemorySensor {
    pub app_id: String,
    pub app_name: String,
}

impl AppMemorySensor {
    pub fn new(app_id: &str, app_name: &str) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: app_name.into(),
        }
    }

    /// Megabytes with one decimal; `0.0` when the app is missing from the
    /// breakdown.
    pub fn megabytes(&self, snapshot: &Snapshot) -> f64 {
        snapshot
            .memory_apps()
            .iter()
            .find(|usage| usage.id == self.app_id)
            .map_or(0.0, |usage| (usage.used / BYTES_PER_MB * 10.0).round() / 10.0)
    }
}

impl Entity for AppMemorySensor {
    fn unique_id(&self) -> String {
        format!("umbrel_app_memory_{}", self.app_id)
    }

    fn name(&self) -> String {
        format!("{} Memory", self.app_name)
    }

    fn platform(&self) -> Platform {
        Platform::Sensor
    }

    fn unit(&self) -> Option<&'static str> {
        Some("MB")
    }

    fn state(&self, snapshot: &Snapshot) -> EntityState {
        EntityState::Number {
            value: self.megabytes(snapshot),
        }
    }
}

/// Capacity of one external storage device, in GB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSensor {
    pub device_id: String,
    pub device_name: String,
}

impl StorageSensor {
    pub fn new(device: &ExternalDevice) -> Self {
        Self {
            device_id: device.id.clone(),
            device_name: device.display_name().to_owned(),
        }
    }

    pub fn size(&self, snapshot: &Snapshot) -> Option<f64> {
        snapshot.external_device(&self.device_id)?.size
    }
}

impl Entity for StorageSensor {
    fn unique_id(&self) -> String {
        format!("umbrel_storage_{}", self.device_id)
    }

    fn name(&self) -> String {
        format!("Storage {}", self.device_name)
    }

    fn platform(&self) -> Platform {
        Platform::Sensor
    }

    fn unit(&self) -> Option<&'static str> {
        Some("GB")
    }

    fn state(&self, snapshot: &Snapshot) -> EntityState {
        EntityState::number(self.size(snapshot))
    }

    fn attributes(&self, snapshot: &Snapshot) -> BTreeMap<String, Value> {
        let Some(device) = snapshot.external_device(&self.device_id) else {
            return BTreeMap::new();
        };
        BTreeMap::from([
            ("size_gb".to_owned(), json!(device.size)),
            ("filesystem".to_owned(), json!(device.filesystem)),
            ("mounted".to_owned(), json!(device.mounted)),
            ("mount_path".to_owned(), json!(device.mount_path)),
        ])
    }
}
