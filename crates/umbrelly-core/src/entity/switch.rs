// Per-app on/off switch.

use tracing::debug;
use umbrelly_api::{App, AppAction};

use super::{Entity, EntityState, Platform};
use crate::coordinator::Coordinator;
use crate::snapshot::Snapshot;

/// Starts and stops one installed app.
///
/// The app counts as on while it is running, ready or starting. An app that
/// disappeared from the list reads as off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSwitch {
    pub app_id: String,
    pub app_name: String,
}

impl AppSwitch {
    pub fn new(app: &App) -> Self {
        Self {
            app_id: app.id.clone(),
            app_name: app.display_name().to_owned(),
        }
    }

    pub fn is_on(&self, snapshot: &Snapshot) -> bool {
        snapshot
            .app(&self.app_id)
            .is_some_and(|app| app.state().is_active())
    }

    /// Start the app. Refreshes only when the host accepted the request.
    pub async fn turn_on(&self, coordinator: &Coordinator) -> bool {
        self.set(coordinator, AppAction::Start).await
    }

    /// Stop the app. Refreshes only when the host accepted the request.
    pub async fn turn_off(&self, coordinator: &Coordinator) -> bool {
        self.set(coordinator, AppAction::Stop).await
    }

    async fn set(&self, coordinator: &Coordinator, action: AppAction) -> bool {
        let accepted = coordinator.client().set_app_state(&self.app_id, action).await;
        if accepted {
            coordinator.request_refresh().await;
        } else {
            debug!(app_id = %self.app_id, %action, "skipping refresh after failed action");
        }
        accepted
    }
}

impl Entity for AppSwitch {
    fn unique_id(&self) -> String {
        format!("umbrel_app_{}", self.app_id)
    }

    fn name(&self) -> String {
        self.app_name.clone()
    }

    fn platform(&self) -> Platform {
        Platform::Switch
    }

    fn state(&self, snapshot: &Snapshot) -> EntityState {
        EntityState::Binary {
            on: self.is_on(snapshot),
        }
    }
}
