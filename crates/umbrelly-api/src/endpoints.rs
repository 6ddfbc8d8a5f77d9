// tRPC procedure paths, relative to the host root.

pub const LOGIN: &str = "/trpc/user.login";
pub const TWO_FACTOR_ENABLED: &str = "/trpc/user.is2faEnabled";

pub const VERSION: &str = "/trpc/system.version";
pub const UPTIME: &str = "/trpc/system.uptime";
pub const CPU_TEMPERATURE: &str = "/trpc/system.cpuTemperature";
pub const CPU_USAGE: &str = "/trpc/system.cpuUsage";
pub const MEMORY_USAGE: &str = "/trpc/system.memoryUsage";
pub const DISK_USAGE: &str = "/trpc/system.diskUsage";
pub const CHECK_UPDATE: &str = "/trpc/system.checkUpdate";
pub const UPDATE: &str = "/trpc/system.update";
pub const UPDATE_STATUS: &str = "/trpc/system.updateStatus";
pub const RESTART: &str = "/trpc/system.restart";
pub const SHUTDOWN: &str = "/trpc/system.shutdown";

pub const EXTERNAL_DEVICES: &str = "/trpc/files.externalDevices";
pub const BACKUP_PROGRESS: &str = "/trpc/backups.backupProgress";

pub const APPS_LIST: &str = "/trpc/apps.list";
pub const APP_STATE: &str = "/trpc/apps.state";
pub const APP_UPDATE: &str = "/trpc/apps.update";

/// `apps.start` / `apps.stop` / `apps.restart`
pub fn app_action(action: crate::models::AppAction) -> String {
    format!("/trpc/apps.{action}")
}
