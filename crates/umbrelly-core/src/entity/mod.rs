// ── Entity adapters ──
//
// Home-automation style views over a `Snapshot`. Read adapters derive a
// state from the current snapshot and never mutate it. Action adapters call
// one API operation and, when it succeeds, ask the coordinator for an
// immediate refresh.

pub mod binary_sensor;
pub mod button;
pub mod sensor;
pub mod switch;
pub mod update;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use strum::Display;

use crate::snapshot::Snapshot;

pub use binary_sensor::SystemBinarySensor;
pub use button::{AppRestartButton, SystemButton};
pub use sensor::{AppMemorySensor, StorageSensor, SystemSensor};
pub use switch::AppSwitch;
pub use update::{AppUpdate, SystemUpdate};

/// Device every entity belongs to.
pub const DEVICE_NAME: &str = "Umbrel System";
pub const MANUFACTURER: &str = "Umbrel";

/// Entity platform, matching the home-automation entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Sensor,
    BinarySensor,
    Switch,
    Button,
    Update,
}

/// Current state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityState {
    Number { value: f64 },
    Timestamp { value: DateTime<Utc> },
    Binary { on: bool },
    Version {
        installed: Option<String>,
        latest: Option<String>,
    },
    /// Buttons carry no state.
    Stateless,
    /// The snapshot lacks the field this entity reads.
    Unknown,
}

impl EntityState {
    pub(crate) fn number(value: Option<f64>) -> Self {
        value.map_or(Self::Unknown, |value| Self::Number { value })
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { value } => write!(f, "{value}"),
            Self::Timestamp { value } => {
                f.write_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            Self::Binary { on: true } => f.write_str("on"),
            Self::Binary { on: false } => f.write_str("off"),
            Self::Version { installed, latest } => {
                let installed = installed.as_deref().unwrap_or("-");
                match latest.as_deref() {
                    Some(latest) if latest != installed => write!(f, "{installed} -> {latest}"),
                    _ => f.write_str(installed),
                }
            }
            Self::Stateless => f.write_str("-"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Metadata of the device all entities attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: &'static str,
    pub manufacturer: &'static str,
    /// umbrelOS version, when known.
    pub model: String,
}

pub fn device_info(snapshot: &Snapshot) -> DeviceInfo {
    DeviceInfo {
        name: DEVICE_NAME,
        manufacturer: MANUFACTURER,
        model: snapshot
            .system
            .version
            .clone()
            .unwrap_or_else(|| "Unknown".into()),
    }
}

/// Read side shared by every adapter.
pub trait Entity: Send + Sync {
    /// Stable identifier, unique across the instance.
    fn unique_id(&self) -> String;

    fn name(&self) -> String;

    fn platform(&self) -> Platform;

    /// Unit of measurement, for numeric sensors.
    fn unit(&self) -> Option<&'static str> {
        None
    }

    fn state(&self, snapshot: &Snapshot) -> EntityState;

    fn attributes(&self, _snapshot: &Snapshot) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }
}

/// Enumerate every entity the snapshot supports.
///
/// Fixed system entities come first, then one storage sensor per external
/// device, one memory sensor per app in the memory breakdown, and a switch,
/// restart button and update entity per installed app.
pub fn discover(snapshot: &Snapshot) -> Vec<Box<dyn Entity>> {
    let mut entities: Vec<Box<dyn Entity>> = Vec::new();

    entities.extend(SystemSensor::ALL.map(|s| Box::new(s) as Box<dyn Entity>));
    entities.extend(
        snapshot
            .external_devices
            .iter()
            .map(|d| Box::new(StorageSensor::new(d)) as Box<dyn Entity>),
    );
    entities.extend(snapshot.memory_apps().iter().map(|usage| {
        let name = snapshot
            .app(&usage.id)
            .map_or(usage.id.as_str(), |a| a.display_name());
        Box::new(AppMemorySensor::new(&usage.id, name)) as Box<dyn Entity>
    }));

    entities.extend(SystemBinarySensor::ALL.map(|s| Box::new(s) as Box<dyn Entity>));

    for app in &snapshot.apps {
        entities.push(Box::new(AppSwitch::new(app)));
    }

    entities.extend(SystemButton::ALL.map(|b| Box::new(b) as Box<dyn Entity>));
    for app in &snapshot.apps {
        entities.push(Box::new(AppRestartButton::new(app)));
    }

    entities.push(Box::new(SystemUpdate));
    for app in &snapshot.apps {
        entities.push(Box::new(AppUpdate::new(app)));
    }

    entities
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use umbrelly_api::{App, ExternalDevice, SystemInfo};

    use super::*;

    fn app(id: &str, name: &str) -> App {
        App {
            id: id.into(),
            name: Some(name.into()),
            state: Some("running".into()),
            version: Some("1.0".into()),
        }
    }

    #[test]
    fn discover_mirrors_snapshot_contents() {
        let snapshot = Snapshot {
            system: SystemInfo {
                memory: Some(
                    serde_json::from_value(json!({
                        "percentage": 40,
                        "apps": [{ "id": "bitcoin", "used": 1_048_576 }]
                    }))
                    .expect("memory"),
                ),
                ..SystemInfo::default()
            },
            apps: vec![app("bitcoin", "Bitcoin Node"), app("nextcloud", "Nextcloud")],
            external_devices: vec![ExternalDevice {
                id: "sda".into(),
                ..ExternalDevice::default()
            }],
            ..Snapshot::default()
        };

        let entities = discover(&snapshot);
        let ids: Vec<String> = entities.iter().map(|e| e.unique_id()).collect();

        // 5 sensors + 1 storage + 1 app memory + 3 binary + 2 switches
        // + 3 buttons + 2 restart buttons + 1 system update + 2 app updates
        assert_eq!(entities.len(), 20);
        assert!(ids.contains(&"umbrel_storage_sda".to_string()));
        assert!(ids.contains(&"umbrel_app_memory_bitcoin".to_string()));
        assert!(ids.contains(&"umbrel_app_nextcloud".to_string()));
        assert!(ids.contains(&"umbrel_app_restart_bitcoin".to_string()));
        assert!(ids.contains(&"umbrel_app_update_nextcloud".to_string()));

        let memory = entities
            .iter()
            .find(|e| e.unique_id() == "umbrel_app_memory_bitcoin")
            .expect("memory sensor");
        assert_eq!(memory.name(), "Bitcoin Node Memory");
    }

    #[test]
    fn device_info_uses_system_version() {
        let mut snapshot = Snapshot::default();
        assert_eq!(device_info(&snapshot).model, "Unknown");
        snapshot.system.version = Some("1.2.1".into());
        assert_eq!(device_info(&snapshot).model, "1.2.1");
    }

    #[test]
    fn version_state_display() {
        let same = EntityState::Version {
            installed: Some("1.0".into()),
            latest: Some("1.0".into()),
        };
        let newer = EntityState::Version {
            installed: Some("1.0".into()),
            latest: Some("1.1".into()),
        };
        assert_eq!(same.to_string(), "1.0");
        assert_eq!(newer.to_string(), "1.0 -> 1.1");
        assert_eq!(EntityState::Binary { on: true }.to_string(), "on");
    }
}
