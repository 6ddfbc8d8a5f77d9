//! `storage`: external devices attached to the host.

use tabled::Tabled;

use umbrelly_core::{Coordinator, ExternalDevice};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Tone};

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Filesystem")]
    filesystem: String,
    #[tabled(rename = "Mounted")]
    mounted: String,
    #[tabled(rename = "Mount Path")]
    mount_path: String,
}

fn device_row(d: &ExternalDevice, color: bool) -> DeviceRow {
    let mounted = match d.mounted {
        Some(true) => output::paint("yes", Tone::Good, color),
        Some(false) => output::paint("no", Tone::Warn, color),
        None => "-".into(),
    };
    DeviceRow {
        id: d.id.clone(),
        name: d.display_name().to_owned(),
        size: output::or_dash(d.size, " GB"),
        filesystem: d.filesystem.clone().unwrap_or_else(|| "-".into()),
        mounted,
        mount_path: d.mount_path.clone().unwrap_or_else(|| "-".into()),
    }
}

pub fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let snap = coordinator.snapshot();
    if snap.external_devices.is_empty() && matches!(global.output, OutputFormat::Table) {
        output::notice("No external storage devices", global.quiet);
        return Ok(());
    }
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &snap.external_devices,
        |d| device_row(d, color),
        |d| d.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
