//! `status`: the fixed system sensors and binary sensors in one view.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use umbrelly_core::entity::{SystemBinarySensor, SystemSensor, SystemUpdate};
use umbrelly_core::{Coordinator, Snapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Tone};

#[derive(Debug, Serialize)]
struct StatusReport {
    version: Option<String>,
    cpu_usage: Option<f64>,
    memory_usage: Option<f64>,
    disk_usage: Option<f64>,
    temperature: Option<f64>,
    boot_time: Option<DateTime<Utc>>,
    update_available: bool,
    latest_version: Option<String>,
    two_factor_enabled: bool,
    backup_in_progress: bool,
    refreshed_at: DateTime<Utc>,
    /// Data sources that failed in the last refresh.
    degraded: Vec<String>,
    #[serde(skip)]
    color: bool,
}

impl StatusReport {
    fn from_snapshot(snap: &Snapshot, color: bool) -> Self {
        Self {
            version: snap.system.version.clone(),
            cpu_usage: SystemSensor::CpuUsage.value(snap),
            memory_usage: SystemSensor::MemoryUsage.value(snap),
            disk_usage: SystemSensor::DiskUsage.value(snap),
            temperature: SystemSensor::Temperature.value(snap),
            boot_time: SystemSensor::boot_time(snap, snap.refreshed_at),
            update_available: SystemBinarySensor::UpdateAvailable.is_on(snap),
            latest_version: SystemUpdate::latest_version(snap),
            two_factor_enabled: SystemBinarySensor::TwoFactorEnabled.is_on(snap),
            backup_in_progress: SystemBinarySensor::BackupInProgress.is_on(snap),
            refreshed_at: snap.refreshed_at,
            degraded: snap.degraded.iter().map(ToString::to_string).collect(),
            color,
        }
    }
}

fn yes_no(value: bool, on: Tone, color: bool) -> String {
    if value {
        output::paint("yes", on, color)
    } else {
        output::paint("no", Tone::Muted, color)
    }
}

fn detail(r: &StatusReport) -> String {
    let mut update = yes_no(r.update_available, Tone::Warn, r.color);
    if let (true, Some(latest)) = (r.update_available, r.latest_version.as_deref()) {
        update = format!("{update} ({latest})");
    }

    let mut lines = vec![
        format!("Version:      {}", r.version.as_deref().unwrap_or("-")),
        format!("CPU:          {}", output::or_dash(r.cpu_usage, "%")),
        format!("Memory:       {}", output::or_dash(r.memory_usage, "%")),
        format!("Disk:         {}", output::or_dash(r.disk_usage, "%")),
        format!("Temperature:  {}", output::or_dash(r.temperature, " °C")),
        format!(
            "Booted:       {}",
            r.boot_time.map_or_else(
                || "-".into(),
                |t| t.to_rfc3339_opts(SecondsFormat::Secs, true)
            )
        ),
        format!("Update:       {update}"),
        format!(
            "2FA:          {}",
            yes_no(r.two_factor_enabled, Tone::Good, r.color)
        ),
        format!(
            "Backup:       {}",
            if r.backup_in_progress {
                output::paint("in progress", Tone::Warn, r.color)
            } else {
                output::paint("idle", Tone::Muted, r.color)
            }
        ),
    ];
    if !r.degraded.is_empty() {
        lines.push(format!(
            "Degraded:     {}",
            output::paint(&r.degraded.join(", "), Tone::Bad, r.color)
        ));
    }
    lines.join("\n")
}

pub fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let snap = coordinator.snapshot();
    let report = StatusReport::from_snapshot(&snap, output::should_color(&global.color));
    let out = output::render_single(&global.output, &report, detail, |r| {
        r.version.clone().unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
