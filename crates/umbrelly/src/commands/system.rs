//! System command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use umbrelly_core::entity::{SystemButton, SystemUpdate};
use umbrelly_core::{Coordinator, CoreError, UpdateInfo, UpdateStatus};

use crate::cli::{GlobalOpts, SystemArgs, SystemCommand};
use crate::error::CliError;
use crate::output;

use super::util;

const UPDATE_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// umbrelOS updates download, install and reboot; give up after this long.
const UPDATE_WAIT_LIMIT: Duration = Duration::from_secs(30 * 60);

fn update_detail(info: &UpdateInfo) -> String {
    if !info.available {
        return "umbrelOS is up to date".into();
    }
    let mut lines = vec![format!(
        "Update available: {}",
        info.version.as_deref().unwrap_or("-")
    )];
    if let Some(ref name) = info.name {
        lines.push(format!("Name:             {name}"));
    }
    if let Some(ref notes) = info.release_notes {
        lines.push(String::new());
        lines.push(notes.trim().to_owned());
    }
    lines.join("\n")
}

fn status_detail(status: &UpdateStatus) -> String {
    let mut lines = vec![format!(
        "Running:     {}",
        if status.running { "yes" } else { "no" }
    )];
    if let Some(progress) = status.progress {
        lines.push(format!("Progress:    {progress:.0}%"));
    }
    if let Some(ref description) = status.description {
        lines.push(format!("Description: {description}"));
    }
    if let Some(err) = status.error_message() {
        lines.push(format!("Error:       {err}"));
    }
    lines.join("\n")
}

pub async fn handle(
    coordinator: &Coordinator,
    args: SystemArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SystemCommand::Reboot => {
            if !util::confirm("Reboot the umbrelOS host?", global.yes)? {
                return Ok(());
            }
            util::accepted(SystemButton::Reboot.press(coordinator).await, "reboot")?;
            output::notice("Reboot initiated", global.quiet);
            Ok(())
        }

        SystemCommand::Shutdown => {
            if !util::confirm(
                "Shut down the umbrelOS host? It cannot be powered on remotely.",
                global.yes,
            )? {
                return Ok(());
            }
            util::accepted(SystemButton::Shutdown.press(coordinator).await, "shutdown")?;
            output::notice("Shutdown initiated", global.quiet);
            Ok(())
        }

        SystemCommand::Update { wait } => {
            let snap = coordinator.snapshot();
            if !snap.update.available {
                output::notice("umbrelOS is up to date", global.quiet);
                return Ok(());
            }
            let target = SystemUpdate::latest_version(&snap).unwrap_or_else(|| "latest".into());
            if !util::confirm(&format!("Update umbrelOS to {target}?"), global.yes)? {
                return Ok(());
            }
            util::accepted(SystemUpdate.install(coordinator).await, "system update")?;
            output::notice(&format!("Updating umbrelOS to {target}"), global.quiet);

            if wait {
                wait_for_update(coordinator, global.quiet).await?;
            }
            Ok(())
        }

        SystemCommand::CheckUpdate => {
            util::accepted(
                SystemButton::CheckUpdate.press(coordinator).await,
                "check for update",
            )?;
            let snap = coordinator.snapshot();
            let out = output::render_single(&global.output, &snap.update, update_detail, |u| {
                u.version.clone().unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SystemCommand::UpdateStatus => {
            let status = coordinator
                .client()
                .fetch_update_status()
                .await
                .map_err(CoreError::from)?;
            let out = output::render_single(&global.output, &status, status_detail, |s| {
                s.progress.map(|p| format!("{p:.0}")).unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

/// Follow `system.updateStatus` with a progress bar until the update stops
/// running. Fetch errors are expected while the host reboots.
async fn wait_for_update(coordinator: &Coordinator, quiet: bool) -> Result<(), CliError> {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let deadline = tokio::time::Instant::now() + UPDATE_WAIT_LIMIT;
    let mut ticker = tokio::time::interval(UPDATE_POLL_INTERVAL);
    let mut seen_running = false;

    loop {
        ticker.tick().await;
        if tokio::time::Instant::now() >= deadline {
            bar.abandon_with_message("gave up waiting");
            return Err(CliError::Timeout);
        }

        let status = match coordinator.client().fetch_update_status().await {
            Ok(status) => status,
            Err(e) => {
                debug!(error = %e, "update status unavailable");
                bar.set_message("waiting for host");
                continue;
            }
        };

        if let Some(err) = status.error_message() {
            bar.abandon_with_message(err.to_owned());
            return Err(CliError::ActionFailed {
                action: format!("system update: {err}"),
            });
        }

        if let Some(progress) = status.progress {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
            let position = progress.clamp(0.0, 100.0) as u64;
            bar.set_position(position);
        }
        if let Some(description) = status.description {
            bar.set_message(description);
        }

        if status.running {
            seen_running = true;
        } else if seen_running || status.progress.is_some_and(|p| p >= 100.0) {
            bar.finish_with_message("done");
            return Ok(());
        }
    }
}
