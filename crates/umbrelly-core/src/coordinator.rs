// ── Refresh coordinator ──
//
// Polls one umbrelOS host on a schedule and on demand. Each cycle runs six
// independent fetches concurrently, folds failures into defaults, and
// publishes a single immutable snapshot to every observer.

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use umbrelly_api::UmbrelClient;

use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::snapshot::{Facet, Snapshot};

/// Synchronous snapshot observer.
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Handle returned by [`Coordinator::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

// ── Coordinator ──────────────────────────────────────────────────

/// Owner of the current snapshot for one umbrelOS host.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Refresh cycles are
/// serialized: a caller that queues behind an in-flight cycle gets that
/// cycle's snapshot instead of starting another one.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: Arc<UmbrelClient>,
    config: CoordinatorConfig,
    snapshot: ArcSwap<Snapshot>,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    listeners: StdMutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    /// Held for the duration of one cycle.
    cycle_lock: Mutex<()>,
    /// Count of published snapshots.
    generation: AtomicU64,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator around an API client. Does NOT fetch anything;
    /// see [`setup()`](Self::setup).
    pub fn new(client: UmbrelClient, config: CoordinatorConfig) -> Self {
        let initial = Arc::new(Snapshot::default());
        let (snapshot_tx, _) = watch::channel(Arc::clone(&initial));

        Self {
            inner: Arc::new(CoordinatorInner {
                client: Arc::new(client),
                config,
                snapshot: ArcSwap::new(initial),
                snapshot_tx,
                listeners: StdMutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                cycle_lock: Mutex::new(()),
                generation: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Build the client from `config`, then run [`setup()`](Self::setup).
    pub async fn connect(config: CoordinatorConfig) -> Result<Self, CoreError> {
        let client = config.build_client()?;
        Self::setup(client, config).await
    }

    /// Log in, load the first snapshot, and start the periodic refresh.
    ///
    /// A rejected password fails with [`CoreError::AuthenticationFailed`];
    /// an unreachable host or an unusable first cycle fails with
    /// [`CoreError::NotReady`].
    pub async fn setup(client: UmbrelClient, config: CoordinatorConfig) -> Result<Self, CoreError> {
        let coordinator = Self::new(client, config);
        let host = coordinator.inner.client.base_url().to_string();

        match coordinator.inner.client.login().await {
            Ok(true) => info!(%host, "logged in to umbrelOS"),
            Ok(false) => {
                error!(%host, "umbrelOS rejected the password");
                return Err(CoreError::AuthenticationFailed {
                    message: format!("{host} rejected the configured password"),
                });
            }
            Err(e) => {
                error!(%host, error = %e, "umbrelOS host unreachable");
                return Err(CoreError::NotReady {
                    reason: format!("cannot reach {host}: {e}"),
                });
            }
        }

        coordinator.first_refresh().await?;
        coordinator.start().await;
        Ok(coordinator)
    }

    /// One-shot: set up without the periodic timer, run `f`, shut down.
    pub async fn oneshot<F, Fut, T>(config: CoordinatorConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Coordinator) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = Duration::ZERO;

        let coordinator = Self::connect(cfg).await?;
        let result = f(coordinator.clone()).await;
        coordinator.shutdown().await;
        result
    }

    pub fn client(&self) -> &UmbrelClient {
        &self.inner.client
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Run the blocking first cycle.
    ///
    /// Fails with [`CoreError::NotReady`] when a fetch task dies or when
    /// every facet fails, so setup never proceeds on an empty snapshot.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;

        let snapshot = self.run_cycle().await.map_err(|e| CoreError::NotReady {
            reason: e.to_string(),
        })?;
        if snapshot.is_empty_cycle() {
            return Err(CoreError::NotReady {
                reason: "every endpoint failed during the first refresh".into(),
            });
        }
        Ok(self.publish(snapshot))
    }

    /// Run one refresh cycle and publish the result.
    ///
    /// When another cycle finishes while this call waits for the cycle
    /// lock, its snapshot is returned and no second cycle runs.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let seen = self.inner.generation.load(Ordering::Acquire);
        let _cycle = self.inner.cycle_lock.lock().await;

        if self.inner.generation.load(Ordering::Acquire) != seen {
            debug!("joined in-flight refresh");
            return Ok(self.snapshot());
        }

        let snapshot = self.run_cycle().await?;
        Ok(self.publish(snapshot))
    }

    /// Out-of-schedule refresh, requested after a successful action.
    ///
    /// Failures are logged; the previous snapshot stays current.
    pub async fn request_refresh(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "requested refresh failed");
        }
    }

    async fn run_cycle(&self) -> Result<Snapshot, CoreError> {
        debug!("refresh cycle starting");
        let client = &self.inner.client;

        let system = tokio::spawn({
            let c = Arc::clone(client);
            async move { c.fetch_system_info().await }
        });
        let apps = tokio::spawn({
            let c = Arc::clone(client);
            async move { c.fetch_apps().await }
        });
        let update = tokio::spawn({
            let c = Arc::clone(client);
            async move { c.fetch_check_update().await }
        });
        let two_factor = tokio::spawn({
            let c = Arc::clone(client);
            async move { c.fetch_two_factor_enabled().await }
        });
        let devices = tokio::spawn({
            let c = Arc::clone(client);
            async move { c.fetch_external_devices().await }
        });
        let backups = tokio::spawn({
            let c = Arc::clone(client);
            async move { c.fetch_backup_progress().await }
        });

        let (system, apps, update, two_factor, devices, backups) =
            tokio::join!(system, apps, update, two_factor, devices, backups);

        let mut degraded = BTreeSet::new();
        let snapshot = Snapshot {
            system: settle(Facet::System, system, &mut degraded)?,
            apps: settle(Facet::Apps, apps, &mut degraded)?,
            update: settle(Facet::Update, update, &mut degraded)?,
            two_factor_enabled: settle(Facet::TwoFactor, two_factor, &mut degraded)?,
            external_devices: settle(Facet::ExternalDevices, devices, &mut degraded)?,
            backup_progress: settle(Facet::BackupProgress, backups, &mut degraded)?,
            refreshed_at: Utc::now(),
            degraded,
        };

        debug!(
            apps = snapshot.apps.len(),
            degraded = snapshot.degraded.len(),
            "refresh cycle complete"
        );
        Ok(snapshot)
    }

    fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.inner.snapshot.store(Arc::clone(&snapshot));
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.snapshot_tx.send_replace(Arc::clone(&snapshot));

        // Clone out so a listener may add or remove listeners.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .expect("listener lock poisoned")
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(&snapshot))).is_err() {
                error!("snapshot listener panicked");
            }
        }
        snapshot
    }

    // ── Observation ──────────────────────────────────────────────

    /// The current snapshot. Before the first cycle this is all defaults.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot.load_full()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Register a callback invoked synchronously after each publish, in
    /// registration order. A panicking listener is logged and does not stop
    /// the others or the refresh loop.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .lock()
            .expect("listener lock poisoned")
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock().expect("listener lock poisoned");
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Number of snapshots published so far.
    pub fn cycles_completed(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        self.cycles_completed() > 0
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the periodic refresh task. No-op when the interval is zero,
    /// the task is already running, or the coordinator was shut down.
    pub async fn start(&self) {
        let period = self.inner.config.refresh_interval;
        if period.is_zero() || self.inner.cancel.is_cancelled() {
            return;
        }

        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            return;
        }
        let cancel = self.inner.cancel.clone();
        handles.push(tokio::spawn(refresh_task(self.clone(), period, cancel)));
        debug!(period_secs = period.as_secs(), "periodic refresh started");
    }

    /// Stop the periodic refresh and wait for it to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "periodic refresh task ended abnormally");
            }
        }
        debug!("coordinator shut down");
    }
}

// ── Background tasks ─────────────────────────────────────────────

async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = coordinator.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Fold one fetch outcome into the snapshot.
///
/// An API failure degrades the facet to its default. A task that panicked
/// or was cancelled fails the whole cycle.
fn settle<T: Default>(
    facet: Facet,
    joined: Result<Result<T, umbrelly_api::Error>, JoinError>,
    degraded: &mut BTreeSet<Facet>,
) -> Result<T, CoreError> {
    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(facet = %facet, error = %e, "fetch failed, using default");
            degraded.insert(facet);
            Ok(T::default())
        }
        Err(e) => Err(CoreError::Internal(format!("{facet} fetch task failed: {e}"))),
    }
}
