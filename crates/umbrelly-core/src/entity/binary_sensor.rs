// On/off sensors.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use super::{Entity, EntityState, Platform};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemBinarySensor {
    /// An umbrelOS update is available.
    UpdateAvailable,
    TwoFactorEnabled,
    /// Any backup job reports `"In Progress"`.
    BackupInProgress,
}

impl SystemBinarySensor {
    pub const ALL: [SystemBinarySensor; 3] = [
        Self::UpdateAvailable,
        Self::TwoFactorEnabled,
        Self::BackupInProgress,
    ];

    pub fn is_on(self, snapshot: &Snapshot) -> bool {
        match self {
            Self::UpdateAvailable => snapshot.update.available,
            Self::TwoFactorEnabled => snapshot.two_factor_enabled,
            Self::BackupInProgress => snapshot.backup_running(),
        }
    }
}

impl Entity for SystemBinarySensor {
    fn unique_id(&self) -> String {
        match self {
            Self::UpdateAvailable => "umbrel_update_available",
            Self::TwoFactorEnabled => "umbrel_2fa_enabled",
            Self::BackupInProgress => "umbrel_backup_in_progress",
        }
        .into()
    }

    fn name(&self) -> String {
        match self {
            Self::UpdateAvailable => "Update Available",
            Self::TwoFactorEnabled => "Two-Factor Authentication",
            Self::BackupInProgress => "Backup In Progress",
        }
        .into()
    }

    fn platform(&self) -> Platform {
        Platform::BinarySensor
    }

    fn state(&self, snapshot: &Snapshot) -> EntityState {
        EntityState::Binary {
            on: self.is_on(snapshot),
        }
    }

    fn attributes(&self, snapshot: &Snapshot) -> BTreeMap<String, Value> {
        match self {
            Self::UpdateAvailable => {
                let update = &snapshot.update;
                BTreeMap::from([
                    ("version".to_owned(), json!(update.version)),
                    ("name".to_owned(), json!(update.name)),
                    ("release_notes".to_owned(), json!(update.release_notes)),
                ])
            }
            _ => BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use umbrelly_api::{BackupProgress, UpdateInfo};

    use super::*;

    #[test]
    fn defaults_are_off() {
        let snap = Snapshot::default();
        for sensor in SystemBinarySensor::ALL {
            assert!(!sensor.is_on(&snap), "{sensor:?} should be off");
        }
    }

    #[test]
    fn update_sensor_exposes_release_attributes() {
        let snap = Snapshot {
            update: UpdateInfo {
                available: true,
                version: Some("1.3.0".into()),
                name: Some("umbrelOS 1.3".into()),
                release_notes: Some("Faster boots".into()),
            },
            ..Snapshot::default()
        };
        let sensor = SystemBinarySensor::UpdateAvailable;
        assert!(sensor.is_on(&snap));
        let attrs = sensor.attributes(&snap);
        assert_eq!(attrs["version"], json!("1.3.0"));
        assert_eq!(attrs["release_notes"], json!("Faster boots"));
    }

    #[test]
    fn backup_sensor_requires_exact_status() {
        let mut snap = Snapshot {
            backup_progress: vec![BackupProgress {
                id: "b1".into(),
                status: Some("Complete".into()),
                progress: Some(100.0),
            }],
            ..Snapshot::default()
        };
        assert!(!SystemBinarySensor::BackupInProgress.is_on(&snap));

        snap.backup_progress[0].status = Some("In Progress".into());
        assert!(SystemBinarySensor::BackupInProgress.is_on(&snap));
    }
}
