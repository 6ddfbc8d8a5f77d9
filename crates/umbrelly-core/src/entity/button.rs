// Momentary actions.

use tracing::warn;
use umbrelly_api::{App, AppAction};

use super::{Entity, EntityState, Platform};
use crate::coordinator::Coordinator;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemButton {
    Reboot,
    Shutdown,
    /// Ask the host to look for an update, then refresh.
    CheckUpdate,
}

impl SystemButton {
    pub const ALL: [SystemButton; 3] = [Self::Reboot, Self::Shutdown, Self::CheckUpdate];

    /// Perform the action. Reboot and shutdown never refresh: the host is
    /// going away.
    pub async fn press(self, coordinator: &Coordinator) -> bool {
        let client = coordinator.client();
        match self {
            Self::Reboot => client.reboot().await,
            Self::Shutdown => client.shutdown().await,
            Self::CheckUpdate => match client.fetch_check_update().await {
                Ok(_) => {
                    coordinator.request_refresh().await;
                    true
                }
                Err(e) => {
                    warn!(error = %e, "update check failed");
                    false
                }
            },
        }
    }
}

impl Entity for SystemButton {
    fn unique_id(&self) -> String {
        match self {
            Self::Reboot => "umbrel_reboot",
            Self::Shutdown => "umbrel_shutdown",
            Self::CheckUpdate => "umbrel_check_update",
        }
        .into()
    }

    fn name(&self) -> String {
        match self {
            Self::Reboot => "Reboot",
            Self::Shutdown => "Shutdown",
            Self::CheckUpdate => "Check for Update",
        }
        .into()
    }

    fn platform(&self) -> Platform {
        Platform::Button
    }

    fn state(&self, _snapshot: &Snapshot) -> EntityState {
        EntityState::Stateless
    }
}

/// Restarts one installed app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRestartButton {
    pub app_id: String,
    pub app_name: String,
}

impl AppRestartButton {
    pub fn new(app: &App) -> Self {
        Self {
            app_id: app.id.clone(),
            app_name: app.display_name().to_owned(),
        }
    }

    pub async fn press(&self, coordinator: &Coordinator) -> bool {
        let accepted = coordinator
            .client()
            .set_app_state(&self.app_id, AppAction::Restart)
            .await;
        if accepted {
            coordinator.request_refresh().await;
        }
        accepted
    }
}

impl Entity for AppRestartButton {
    fn unique_id(&self) -> String {
        format!("umbrel_app_restart_{}", self.app_id)
    }

    fn name(&self) -> String {
        format!("Restart {}", self.app_name)
    }

    fn platform(&self) -> Platform {
        Platform::Button
    }

    fn state(&self, _snapshot: &Snapshot) -> EntityState {
        EntityState::Stateless
    }
}
