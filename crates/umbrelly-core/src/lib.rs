//! Polling coordinator between `umbrelly-api` and home-automation consumers.
//!
//! - **[`Coordinator`]**: owns the current [`Snapshot`] of one umbrelOS host.
//!   [`setup()`](Coordinator::setup) logs in, runs the blocking first
//!   refresh, then spawns the periodic refresh task. Each cycle fetches six
//!   facets concurrently; a failed facet falls back to its default instead
//!   of failing the cycle.
//!
//! - **[`Snapshot`]**: immutable result of one cycle, published atomically
//!   through `arc_swap` and observed through a `watch` channel or synchronous
//!   listeners.
//!
//! - **Entity adapters** ([`entity`]): sensors, binary sensors, switches,
//!   buttons and update entities derived from a snapshot. Action adapters
//!   request an immediate refresh after a successful call.

pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod snapshot;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CoordinatorConfig, DEFAULT_REFRESH_INTERVAL, TlsVerification};
pub use coordinator::{Coordinator, Listener, ListenerId};
pub use entity::{Entity, EntityState, Platform};
pub use error::CoreError;
pub use snapshot::{Facet, Snapshot};

// ── Model re-exports (so consumers need not depend on the API crate) ─
pub use umbrelly_api::{
    App, AppState, AppStateInfo, AppUsage, BackupProgress, ExternalDevice, SystemInfo,
    UmbrelClient, UpdateInfo, UpdateStatus,
};
