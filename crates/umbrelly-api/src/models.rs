// tRPC response types
//
// Models for the umbrelOS tRPC endpoints. Every payload arrives wrapped as
// `{ "result": { "data": ... } }`. Fields use `#[serde(default)]` liberally
// because umbrelOS releases disagree about field presence, and a missing
// field must never fail a whole refresh.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use tracing::warn;

// ── Response Envelope ────────────────────────────────────────────────

/// Standard tRPC success envelope.
///
/// ```json
/// { "result": { "data": ... } }
/// ```
///
/// Both levels are optional: a body without `result.data` decodes to the
/// endpoint's default value rather than an error.
#[derive(Debug, Default, Deserialize)]
pub struct RpcEnvelope {
    #[serde(default)]
    pub result: Option<RpcResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RpcResult {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl RpcEnvelope {
    /// The `result.data` payload, treating an explicit `null` as absent.
    pub fn into_data(self) -> Option<serde_json::Value> {
        self.result
            .and_then(|r| r.data)
            .filter(|v| !v.is_null())
    }
}

/// tRPC error body, returned alongside a non-2xx status.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorBody {
    pub error: RpcErrorInner,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorInner {
    #[serde(default)]
    pub message: Option<String>,
}

// ── Record lists ─────────────────────────────────────────────────────

/// Decode a JSON array element by element.
///
/// Elements that do not fit `T` are logged and dropped; the rest survive.
pub(crate) fn decode_records<T: DeserializeOwned>(what: &str, items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(what, index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

/// `deserialize_with` form of [`decode_records`] for nested lists; `null`
/// reads as empty.
fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(decode_records("usage breakdown", items))
}

// ── Readings ─────────────────────────────────────────────────────────

/// A metric that some releases report as a bare number and others as an
/// object with a breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading<T> {
    Value(f64),
    Detailed(T),
}

/// `system.cpuTemperature` object form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Temperature {
    pub temperature: Option<f64>,
}

/// `system.cpuUsage` object form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuUsage {
    pub total_used: Option<f64>,
    #[serde(deserialize_with = "lenient_records")]
    pub apps: Vec<AppUsage>,
}

/// `system.memoryUsage` / `system.diskUsage` object form.
///
/// Releases name the same quantities differently (`used` vs `totalUsed`,
/// `total` vs `size`), so every spelling is kept and resolved in
/// [`percent`](Self::percent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageUsage {
    pub percentage: Option<f64>,
    pub used: Option<f64>,
    pub total_used: Option<f64>,
    pub total: Option<f64>,
    pub size: Option<f64>,
    #[serde(deserialize_with = "lenient_records")]
    pub apps: Vec<AppUsage>,
}

/// Per-app share of a resource, in bytes (memory) or percent (cpu).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppUsage {
    pub id: String,
    pub used: f64,
}

impl StorageUsage {
    /// Usage in percent, rounded to one decimal.
    ///
    /// A reported `percentage` wins; otherwise `used / total` is computed.
    /// Zero totals count as unknown.
    pub fn percent(&self) -> Option<f64> {
        if let Some(pct) = self.percentage {
            return Some(pct);
        }
        let used = self.used.or(self.total_used)?;
        let total = self
            .total
            .filter(|t| *t != 0.0)
            .or(self.size)
            .filter(|t| *t != 0.0)?;
        Some(round1(used / total * 100.0))
    }
}

impl Reading<StorageUsage> {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Detailed(usage) => usage.percent(),
        }
    }

    /// Per-app breakdown (empty for the bare-number form).
    pub fn apps(&self) -> &[AppUsage] {
        match self {
            Self::Value(_) => &[],
            Self::Detailed(usage) => &usage.apps,
        }
    }
}

impl Reading<CpuUsage> {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Detailed(cpu) => cpu.total_used,
        }
    }
}

impl Reading<Temperature> {
    pub fn celsius(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Detailed(t) => t.temperature,
        }
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ── System ───────────────────────────────────────────────────────────

/// `system.version`: a plain string on older releases, an object on newer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VersionReport {
    Plain(String),
    Detailed {
        version: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl VersionReport {
    pub fn into_version(self) -> String {
        match self {
            Self::Plain(v) | Self::Detailed { version: v, .. } => v,
        }
    }
}

/// Aggregate of the six `system.*` status endpoints.
///
/// Every field is optional: each sub-endpoint degrades independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub version: Option<String>,
    /// Seconds since boot.
    pub uptime: Option<f64>,
    pub temperature: Option<Reading<Temperature>>,
    pub cpu_usage: Option<Reading<CpuUsage>>,
    pub memory: Option<Reading<StorageUsage>>,
    pub disk: Option<Reading<StorageUsage>>,
}

/// `system.checkUpdate`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateInfo {
    pub available: bool,
    pub version: Option<String>,
    pub name: Option<String>,
    pub release_notes: Option<String>,
}

/// `system.updateStatus`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateStatus {
    pub running: bool,
    pub progress: Option<f64>,
    pub description: Option<String>,
    /// `false` when idle, a message string when the last update failed.
    pub error: Option<serde_json::Value>,
}

impl UpdateStatus {
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(serde_json::Value::as_str)
    }
}

// ── Apps ─────────────────────────────────────────────────────────────

/// Lifecycle state of an installed app.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Running,
    Ready,
    Starting,
    Stopping,
    Stopped,
    Restarting,
    Installing,
    Updating,
    Uninstalling,
    Unknown,
}

impl AppState {
    /// Whether the app counts as switched on.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Ready | Self::Starting)
    }
}

/// One entry of `apps.list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl App {
    /// Human name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Parsed lifecycle state; unrecognized or missing strings map to
    /// [`AppState::Unknown`].
    pub fn state(&self) -> AppState {
        self.state
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(AppState::Unknown)
    }
}

/// `apps.state`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppStateInfo {
    pub state: Option<String>,
    pub progress: Option<f64>,
}

/// Lifecycle action accepted by `apps.start` / `apps.stop` / `apps.restart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AppAction {
    Start,
    Stop,
    Restart,
}

// ── Storage & backups ────────────────────────────────────────────────

/// One entry of `files.externalDevices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExternalDevice {
    pub id: String,
    pub name: Option<String>,
    /// Size in gigabytes.
    pub size: Option<f64>,
    pub filesystem: Option<String>,
    pub mounted: Option<bool>,
    pub mount_path: Option<String>,
}

impl ExternalDevice {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Status string umbrelOS uses for a running backup job.
pub const BACKUP_IN_PROGRESS: &str = "In Progress";

/// One entry of `backups.backupProgress`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupProgress {
    pub id: String,
    pub status: Option<String>,
    pub progress: Option<f64>,
}

impl BackupProgress {
    pub fn is_in_progress(&self) -> bool {
        self.status.as_deref() == Some(BACKUP_IN_PROGRESS)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn memory_percent_computed_from_used_and_total() {
        let reading: Reading<StorageUsage> =
            serde_json::from_value(json!({ "used": 2_147_483_648_u64, "total": 4_294_967_296_u64 }))
                .expect("memory object");
        assert_eq!(reading.percent(), Some(50.0));
    }

    #[test]
    fn malformed_records_are_dropped_individually() {
        let apps: Vec<App> = decode_records(
            "apps.list",
            vec![
                json!({ "id": "bitcoin", "state": "running" }),
                json!({ "name": "no id", "state": "running" }),
                json!({ "id": "plex", "version": 27 }),
                json!({ "id": "nextcloud", "version": "29.0.1" }),
            ],
        );
        let ids: Vec<_> = apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["bitcoin", "nextcloud"]);
    }

    #[test]
    fn bad_usage_breakdown_entry_keeps_the_reading() {
        let reading: Reading<StorageUsage> = serde_json::from_value(json!({
            "used": 1, "total": 4,
            "apps": [{ "id": "bitcoin", "used": 1000 }, { "id": "plex", "used": "lots" }]
        }))
        .expect("memory object");
        assert_eq!(reading.percent(), Some(25.0));
        assert_eq!(reading.apps().len(), 1);
        assert_eq!(reading.apps()[0].id, "bitcoin");
    }

    #[test]
    fn reported_percentage_wins_over_computed() {
        let reading: Reading<StorageUsage> =
            serde_json::from_value(json!({ "percentage": 12.5, "used": 1, "total": 2 }))
                .expect("memory object");
        assert_eq!(reading.percent(), Some(12.5));
    }

    #[test]
    fn disk_percent_uses_alternate_field_names() {
        let reading: Reading<StorageUsage> =
            serde_json::from_value(json!({ "totalUsed": 250, "size": 1000 })).expect("disk object");
        assert_eq!(reading.percent(), Some(25.0));
    }

    #[test]
    fn zero_total_yields_no_percent() {
        let usage = StorageUsage {
            used: Some(10.0),
            total: Some(0.0),
            ..StorageUsage::default()
        };
        assert_eq!(usage.percent(), None);
    }

    #[test]
    fn bare_number_readings() {
        let cpu: Reading<CpuUsage> = serde_json::from_value(json!(37.2)).expect("cpu number");
        let temp: Reading<Temperature> = serde_json::from_value(json!(51)).expect("temp number");
        let mem: Reading<StorageUsage> = serde_json::from_value(json!(64.1)).expect("mem number");
        assert_eq!(cpu.percent(), Some(37.2));
        assert_eq!(temp.celsius(), Some(51.0));
        assert_eq!(mem.percent(), Some(64.1));
        assert!(mem.apps().is_empty());
    }

    #[test]
    fn cpu_and_temperature_objects() {
        let cpu: Reading<CpuUsage> =
            serde_json::from_value(json!({ "totalUsed": 18.5, "apps": [] })).expect("cpu object");
        let temp: Reading<Temperature> =
            serde_json::from_value(json!({ "temperature": 48, "warning": "normal" }))
                .expect("temp object");
        assert_eq!(cpu.percent(), Some(18.5));
        assert_eq!(temp.celsius(), Some(48.0));
    }

    #[test]
    fn app_state_parsing_is_case_insensitive() {
        let app: App = serde_json::from_value(json!({
            "id": "bitcoin",
            "name": "Bitcoin Node",
            "state": "Starting",
            "version": "27.0"
        }))
        .expect("app");
        assert_eq!(app.state(), AppState::Starting);
        assert!(app.state().is_active());
    }

    #[test]
    fn unknown_app_state_maps_to_unknown() {
        let app: App = serde_json::from_value(json!({ "id": "x", "state": "hibernating" }))
            .expect("app");
        assert_eq!(app.state(), AppState::Unknown);
        assert!(!app.state().is_active());
        assert_eq!(app.display_name(), "x");
    }

    #[test]
    fn version_report_accepts_both_shapes() {
        let plain: VersionReport = serde_json::from_value(json!("1.2.1")).expect("plain");
        let detailed: VersionReport =
            serde_json::from_value(json!({ "version": "1.3.0", "name": "umbrelOS 1.3" }))
                .expect("detailed");
        assert_eq!(plain.into_version(), "1.2.1");
        assert_eq!(detailed.into_version(), "1.3.0");
    }

    #[test]
    fn external_device_defaults_missing_fields() {
        let dev: ExternalDevice =
            serde_json::from_value(json!({ "id": "sda", "mountPath": "/media/sda" }))
                .expect("device");
        assert_eq!(dev.mount_path.as_deref(), Some("/media/sda"));
        assert_eq!(dev.size, None);
        assert_eq!(dev.display_name(), "sda");
    }

    #[test]
    fn envelope_null_data_is_absent() {
        let env: RpcEnvelope =
            serde_json::from_value(json!({ "result": { "data": null } })).expect("envelope");
        assert!(env.into_data().is_none());
    }

    #[test]
    fn backup_in_progress_matches_exact_status() {
        let running = BackupProgress {
            id: "b1".into(),
            status: Some("In Progress".into()),
            progress: Some(40.0),
        };
        let done = BackupProgress {
            status: Some("Complete".into()),
            ..running.clone()
        };
        assert!(running.is_in_progress());
        assert!(!done.is_in_progress());
    }
}
