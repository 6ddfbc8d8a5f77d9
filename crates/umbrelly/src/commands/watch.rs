//! `watch`: keep the coordinator's periodic refresh running and print one
//! line per published snapshot.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

use umbrelly_core::entity::{SystemBinarySensor, SystemSensor};
use umbrelly_core::{Coordinator, CoordinatorConfig, Snapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Tone};

#[derive(Debug, Serialize)]
struct WatchLine {
    refreshed_at: DateTime<Utc>,
    cpu_usage: Option<f64>,
    memory_usage: Option<f64>,
    disk_usage: Option<f64>,
    temperature: Option<f64>,
    apps_running: usize,
    apps_total: usize,
    update_available: bool,
    backup_in_progress: bool,
    degraded: Vec<String>,
}

impl WatchLine {
    fn from_snapshot(snap: &Snapshot) -> Self {
        Self {
            refreshed_at: snap.refreshed_at,
            cpu_usage: SystemSensor::CpuUsage.value(snap),
            memory_usage: SystemSensor::MemoryUsage.value(snap),
            disk_usage: SystemSensor::DiskUsage.value(snap),
            temperature: SystemSensor::Temperature.value(snap),
            apps_running: snap
                .apps
                .iter()
                .filter(|a| a.state().is_active())
                .count(),
            apps_total: snap.apps.len(),
            update_available: SystemBinarySensor::UpdateAvailable.is_on(snap),
            backup_in_progress: SystemBinarySensor::BackupInProgress.is_on(snap),
            degraded: snap.degraded.iter().map(ToString::to_string).collect(),
        }
    }

    fn text(&self, color: bool) -> String {
        let mut line = format!(
            "{}  cpu {}  mem {}  disk {}  temp {}  apps {}/{}",
            output::paint(
                &self.refreshed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                Tone::Muted,
                color
            ),
            output::or_dash(self.cpu_usage, "%"),
            output::or_dash(self.memory_usage, "%"),
            output::or_dash(self.disk_usage, "%"),
            output::or_dash(self.temperature, "°C"),
            self.apps_running,
            self.apps_total,
        );
        if self.update_available {
            line.push_str("  ");
            line.push_str(&output::paint("update available", Tone::Warn, color));
        }
        if self.backup_in_progress {
            line.push_str("  ");
            line.push_str(&output::paint("backup running", Tone::Warn, color));
        }
        if !self.degraded.is_empty() {
            line.push_str("  ");
            line.push_str(&output::paint(
                &format!("degraded: {}", self.degraded.join(",")),
                Tone::Bad,
                color,
            ));
        }
        line
    }
}

fn render(line: &WatchLine, format: &OutputFormat, color: bool) -> String {
    match format {
        // one document per line so the stream stays parseable
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(line),
        OutputFormat::Yaml => format!(
            "---\n{}",
            output::render_single(format, line, |_| String::new(), |_| String::new())
        ),
        OutputFormat::Table | OutputFormat::Plain => line.text(color),
    }
}

pub async fn handle(
    config: CoordinatorConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let config = config::with_refresh_interval(config, args.interval);
    if config.refresh_interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let coordinator = Coordinator::connect(config).await?;
    let color = output::should_color(&global.color);
    let listener = coordinator.add_listener(|snap| {
        debug!(
            degraded = snap.degraded.len(),
            apps = snap.apps.len(),
            "snapshot published"
        );
    });

    let mut rx = coordinator.subscribe();
    let mut printed: u64 = 0;
    let mut current = rx.borrow_and_update().clone();

    loop {
        output::print_output(
            &render(&WatchLine::from_snapshot(&current), &global.output, color),
            global.quiet,
        );
        printed += 1;
        if args.count.is_some_and(|n| printed >= n) {
            break;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                current = rx.borrow_and_update().clone();
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    coordinator.remove_listener(listener);
    coordinator.shutdown().await;
    Ok(())
}
