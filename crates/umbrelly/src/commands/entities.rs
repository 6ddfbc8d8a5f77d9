//! `entities`: every adapter the current snapshot supports, with its state.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use umbrelly_core::entity::{self, DeviceInfo};
use umbrelly_core::{Coordinator, Entity, EntityState, Platform, Snapshot};

use crate::cli::{EntitiesArgs, GlobalOpts, OutputFormat, PlatformFilter};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct EntityView {
    unique_id: String,
    name: String,
    platform: Platform,
    state: EntityState,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<&'static str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Value>,
}

impl EntityView {
    fn new(entity: &dyn Entity, snap: &Snapshot) -> Self {
        Self {
            unique_id: entity.unique_id(),
            name: entity.name(),
            platform: entity.platform(),
            state: entity.state(snap),
            unit: entity.unit(),
            attributes: entity.attributes(snap),
        }
    }
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Entity")]
    unique_id: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&EntityView> for EntityRow {
    fn from(v: &EntityView) -> Self {
        let state = match v.unit {
            Some(unit) if matches!(v.state, EntityState::Number { .. }) => {
                format!("{} {unit}", v.state)
            }
            _ => v.state.to_string(),
        };
        Self {
            unique_id: v.unique_id.clone(),
            platform: v.platform.to_string(),
            name: v.name.clone(),
            state,
        }
    }
}

fn platform_of(filter: PlatformFilter) -> Platform {
    match filter {
        PlatformFilter::Sensor => Platform::Sensor,
        PlatformFilter::BinarySensor => Platform::BinarySensor,
        PlatformFilter::Switch => Platform::Switch,
        PlatformFilter::Button => Platform::Button,
        PlatformFilter::Update => Platform::Update,
    }
}

fn views(snap: &Snapshot, filter: Option<PlatformFilter>) -> Vec<EntityView> {
    let wanted = filter.map(platform_of);
    entity::discover(snap)
        .iter()
        .filter(|e| wanted.is_none_or(|p| e.platform() == p))
        .map(|e| EntityView::new(e.as_ref(), snap))
        .collect()
}

fn device_line(device: &DeviceInfo) -> String {
    format!(
        "{} ({}, umbrelOS {})",
        device.name, device.manufacturer, device.model
    )
}

pub fn handle(
    coordinator: &Coordinator,
    args: &EntitiesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snap = coordinator.snapshot();
    let list = views(&snap, args.platform);

    if matches!(global.output, OutputFormat::Table) {
        output::notice(&device_line(&entity::device_info(&snap)), global.quiet);
    }
    let out = output::render_list(
        &global.output,
        &list,
        |v| EntityRow::from(v),
        |v| v.unique_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
