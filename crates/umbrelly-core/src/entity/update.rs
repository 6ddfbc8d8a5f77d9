// Installable updates for the OS and for each app.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use umbrelly_api::App;

use super::{Entity, EntityState, Platform};
use crate::coordinator::Coordinator;
use crate::snapshot::Snapshot;

/// umbrelOS itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemUpdate;

impl SystemUpdate {
    pub fn installed_version(snapshot: &Snapshot) -> Option<String> {
        snapshot.system.version.clone()
    }

    /// The offered version when an update is available, else the installed one.
    pub fn latest_version(snapshot: &Snapshot) -> Option<String> {
        if snapshot.update.available {
            snapshot.update.version.clone()
        } else {
            Self::installed_version(snapshot)
        }
    }

    pub fn release_notes(snapshot: &Snapshot) -> Option<&str> {
        snapshot.update.release_notes.as_deref()
    }

    /// Start the OS update; refreshes when the host accepted it.
    pub async fn install(self, coordinator: &Coordinator) -> bool {
        let accepted = coordinator.client().update_system().await;
        if accepted {
            coordinator.request_refresh().await;
        }
        accepted
    }
}

impl Entity for SystemUpdate {
    fn unique_id(&self) -> String {
        "umbrel_system_update".into()
    }

    fn name(&self) -> String {
        "umbrelOS".into()
    }

    fn platform(&self) -> Platform {
        Platform::Update
    }

    fn state(&self, snapshot: &Snapshot) -> EntityState {
        EntityState::Version {
            installed: Self::installed_version(snapshot),
            latest: Self::latest_version(snapshot),
        }
    }

    fn attributes(&self, snapshot: &Snapshot) -> BTreeMap<String, Value> {
        BTreeMap::from([(
            "release_notes".to_owned(),
            json!(Self::release_notes(snapshot)),
        )])
    }
}

/// One installed app.
///
/// No endpoint reports per-app update availability, so the latest version
/// always equals the installed one. Install stays available as a reinstall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUpdate {
    pub app_id: String,
    pub app_name: String,
    /// Version seen at discovery, used when the app drops out of the list.
    pub initial_version: Option<String>,
}

impl AppUpdate {
    pub fn new(app: &App) -> Self {
        Self {
            app_id: app.id.clone(),
            app_name: app.display_name().to_owned(),
            initial_version: app.version.clone(),
        }
    }

    pub fn installed_version(&self, snapshot: &Snapshot) -> Option<String> {
        match snapshot.app(&self.app_id) {
            Some(app) => app.version.clone(),
            None => self.initial_version.clone(),
        }
    }

    pub fn latest_version(&self, snapshot: &Snapshot) -> Option<String> {
        self.installed_version(snapshot)
    }

    pub async fn install(&self, coordinator: &Coordinator) -> bool {
        let accepted = coordinator.client().update_app(&self.app_id).await;
        if accepted {
            coordinator.request_refresh().await;
        }
        accepted
    }
}

impl Entity for AppUpdate {
    fn unique_id(&self) -> String {
        format!("umbrel_app_update_{}", self.app_id)
    }

    fn name(&self) -> String {
        format!("{} Update", self.app_name)
    }

    fn platform(&self) -> Platform {
        Platform::Update
    }

    fn state(&self, snapshot: &Snapshot) -> EntityState {
        EntityState::Version {
            installed: self.installed_version(snapshot),
            latest: self.latest_version(snapshot),
        }
    }
}
