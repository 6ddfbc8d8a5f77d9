//! Shared helpers for command handlers.

use std::io::IsTerminal;

use umbrelly_core::{App, Coordinator, CoreError};

use crate::error::CliError;

/// Look up an installed app in the current snapshot.
pub fn find_app(coordinator: &Coordinator, app_id: &str) -> Result<App, CliError> {
    coordinator
        .snapshot()
        .app(app_id)
        .cloned()
        .ok_or_else(|| {
            CoreError::AppNotFound {
                identifier: app_id.into(),
            }
            .into()
        })
}

/// Turn an adapter's accepted flag into a result.
pub fn accepted(ok: bool, action: &str) -> Result<(), CliError> {
    if ok {
        Ok(())
    } else {
        Err(CliError::ActionFailed {
            action: action.into(),
        })
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, refuses instead of blocking.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
