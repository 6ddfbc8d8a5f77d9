// umbrelly-api: Async Rust client for the umbrelOS tRPC administration API

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use client::UmbrelClient;
pub use error::Error;
pub use models::{
    App, AppAction, AppState, AppStateInfo, AppUsage, BackupProgress, CpuUsage, ExternalDevice,
    Reading, StorageUsage, SystemInfo, Temperature, UpdateInfo, UpdateStatus,
};
pub use transport::{TlsMode, TransportConfig};
