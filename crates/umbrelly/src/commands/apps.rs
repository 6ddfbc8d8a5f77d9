//! App command handlers.

use tabled::Tabled;

use umbrelly_core::entity::{AppMemorySensor, AppRestartButton, AppSwitch, AppUpdate};
use umbrelly_core::{App, AppState, AppStateInfo, Coordinator, CoreError, Snapshot};

use crate::cli::{AppsArgs, AppsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Memory")]
    memory: String,
}

fn state_tone(state: AppState) -> Tone {
    match state {
        AppState::Running | AppState::Ready => Tone::Good,
        AppState::Stopped | AppState::Unknown => Tone::Muted,
        _ => Tone::Warn,
    }
}

fn app_row(app: &App, snap: &Snapshot, color: bool) -> AppRow {
    let memory = AppMemorySensor::new(&app.id, app.display_name()).megabytes(snap);
    AppRow {
        id: app.id.clone(),
        name: app.display_name().to_owned(),
        state: output::paint(
            app.state.as_deref().unwrap_or("-"),
            state_tone(app.state()),
            color,
        ),
        version: app.version.clone().unwrap_or_else(|| "-".into()),
        memory: format!("{memory:.1} MB"),
    }
}

fn state_detail(app_id: &str, info: &AppStateInfo) -> String {
    let mut lines = vec![
        format!("App:      {app_id}"),
        format!("State:    {}", info.state.as_deref().unwrap_or("-")),
    ];
    if let Some(progress) = info.progress {
        lines.push(format!("Progress: {progress:.0}%"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    coordinator: &Coordinator,
    args: AppsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AppsCommand::List => {
            let snap = coordinator.snapshot();
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &snap.apps,
                |a| app_row(a, &snap, color),
                |a| a.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::State { app } => {
            let info = coordinator
                .client()
                .fetch_app_state(&app)
                .await
                .map_err(CoreError::from)?;
            let out = output::render_single(
                &global.output,
                &info,
                |i| state_detail(&app, i),
                |i| i.state.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Start { app } => {
            let app = util::find_app(coordinator, &app)?;
            let ok = AppSwitch::new(&app).turn_on(coordinator).await;
            util::accepted(ok, &format!("start {}", app.id))?;
            output::notice(&format!("Starting {}", app.display_name()), global.quiet);
            Ok(())
        }

        AppsCommand::Stop { app } => {
            let app = util::find_app(coordinator, &app)?;
            let ok = AppSwitch::new(&app).turn_off(coordinator).await;
            util::accepted(ok, &format!("stop {}", app.id))?;
            output::notice(&format!("Stopping {}", app.display_name()), global.quiet);
            Ok(())
        }

        AppsCommand::Restart { app } => {
            let app = util::find_app(coordinator, &app)?;
            let ok = AppRestartButton::new(&app).press(coordinator).await;
            util::accepted(ok, &format!("restart {}", app.id))?;
            output::notice(&format!("Restarting {}", app.display_name()), global.quiet);
            Ok(())
        }

        AppsCommand::Update { app } => {
            let app = util::find_app(coordinator, &app)?;
            let ok = AppUpdate::new(&app).install(coordinator).await;
            util::accepted(ok, &format!("update {}", app.id))?;
            output::notice(&format!("Updating {}", app.display_name()), global.quiet);
            Ok(())
        }
    }
}
