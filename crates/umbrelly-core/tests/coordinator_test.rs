#![allow(clippy::unwrap_used)]
// Integration tests for `Coordinator` and the action adapters using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use umbrelly_core::entity::{AppRestartButton, AppSwitch, SystemButton, SystemSensor, discover};
use umbrelly_core::{Coordinator, CoordinatorConfig, CoreError, Entity, Facet};

// ── Helpers ─────────────────────────────────────────────────────────

fn data(value: Value) -> Value {
    json!({ "result": { "data": value } })
}

fn config(server: &MockServer) -> CoordinatorConfig {
    let mut config = CoordinatorConfig::new(server.uri(), SecretString::from("hunter2".to_string()));
    config.refresh_interval = Duration::ZERO;
    config
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/trpc/user.login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!("tok-1"))))
        .mount(server)
        .await;
}

async fn mount_get(server: &MockServer, endpoint: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(body)))
        .mount(server)
        .await;
}

fn apps_fixture() -> Value {
    json!([
        { "id": "bitcoin", "name": "Bitcoin Node", "state": "running", "version": "27.0" },
        { "id": "nextcloud", "name": "Nextcloud", "state": "starting", "version": "29.0.1" },
        { "id": "plex", "name": "Plex", "state": "stopped", "version": "1.40" }
    ])
}

/// Mount every facet except the ones listed in `skip`.
async fn mount_host_except(server: &MockServer, skip: &[&str]) {
    mount_login(server).await;

    let fixtures = [
        ("/trpc/system.version", json!("1.2.1")),
        ("/trpc/system.uptime", json!(86_400)),
        ("/trpc/system.cpuTemperature", json!({ "temperature": 49 })),
        ("/trpc/system.cpuUsage", json!({ "totalUsed": 7.5 })),
        (
            "/trpc/system.memoryUsage",
            json!({
                "used": 2_147_483_648_u64,
                "total": 4_294_967_296_u64,
                "apps": [{ "id": "bitcoin", "used": 1_048_576_000 }]
            }),
        ),
        ("/trpc/system.diskUsage", json!({ "percentage": 61.2 })),
        ("/trpc/apps.list", apps_fixture()),
        (
            "/trpc/system.checkUpdate",
            json!({ "available": true, "version": "1.3.0", "name": "umbrelOS 1.3" }),
        ),
        ("/trpc/user.is2faEnabled", json!(true)),
        (
            "/trpc/files.externalDevices",
            json!([{ "id": "sda", "name": "Backup", "size": 931.5, "mounted": true }]),
        ),
        (
            "/trpc/backups.backupProgress",
            json!([{ "id": "b1", "status": "In Progress", "progress": 40 }]),
        ),
    ];

    for (endpoint, body) in fixtures {
        if !skip.contains(&endpoint) {
            mount_get(server, endpoint, body).await;
        }
    }
}

async fn mount_host(server: &MockServer) {
    mount_host_except(server, &[]).await;
}

// ── Setup ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_setup_loads_first_snapshot() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();
    let snap = coordinator.snapshot();

    assert_eq!(coordinator.cycles_completed(), 1);
    assert!(coordinator.is_ready());
    assert!(snap.degraded.is_empty());
    assert_eq!(snap.system.version.as_deref(), Some("1.2.1"));
    assert_eq!(SystemSensor::MemoryUsage.value(&snap), Some(50.0));
    assert_eq!(SystemSensor::DiskUsage.value(&snap), Some(61.2));
    assert_eq!(snap.apps.len(), 3);
    assert!(snap.update.available);
    assert!(snap.two_factor_enabled);
    assert_eq!(snap.external_devices[0].size, Some(931.5));
    assert!(snap.backup_running());
}

#[tokio::test]
async fn test_setup_rejected_password_is_authentication_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trpc/user.login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = Coordinator::connect(config(&server)).await;
    assert!(
        matches!(result, Err(CoreError::AuthenticationFailed { .. })),
        "expected AuthenticationFailed, got: {:?}",
        result.err()
    );
}

#[tokio::test]
async fn test_setup_unreachable_host_is_not_ready() {
    let config = CoordinatorConfig::new("http://127.0.0.1:1", SecretString::from("pw".to_string()));

    let result = Coordinator::connect(config).await;
    assert!(
        matches!(result, Err(CoreError::NotReady { .. })),
        "expected NotReady, got: {:?}",
        result.err()
    );
}

#[tokio::test]
async fn test_first_refresh_with_every_facet_failing_is_not_ready() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let result = Coordinator::connect(config(&server)).await;
    assert!(
        matches!(result, Err(CoreError::NotReady { .. })),
        "expected NotReady, got: {:?}",
        result.err()
    );
}

// ── Failure isolation ───────────────────────────────────────────────

#[tokio::test]
async fn test_one_failing_facet_leaves_others_intact() {
    let server = MockServer::start().await;
    mount_host_except(&server, &["/trpc/apps.list"]).await;

    Mock::given(method("GET"))
        .and(path("/trpc/apps.list"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();
    let snap = coordinator.snapshot();

    assert_eq!(snap.degraded.iter().copied().collect::<Vec<_>>(), vec![Facet::Apps]);
    assert!(snap.apps.is_empty());
    assert_eq!(snap.system.version.as_deref(), Some("1.2.1"));
    assert!(snap.update.available);
    assert!(snap.two_factor_enabled);
    assert_eq!(snap.external_devices.len(), 1);
    assert_eq!(snap.backup_progress.len(), 1);
}

#[tokio::test]
async fn test_malformed_app_record_keeps_the_rest_of_the_list() {
    let server = MockServer::start().await;
    mount_host_except(&server, &["/trpc/apps.list"]).await;
    mount_get(
        &server,
        "/trpc/apps.list",
        json!([
            { "id": "bitcoin", "name": "Bitcoin Node", "state": "running", "version": "27.0" },
            { "name": "Entry without id", "state": "running" },
            { "id": "plex", "state": "stopped", "version": 140 }
        ]),
    )
    .await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();
    let snap = coordinator.snapshot();

    assert!(snap.degraded.is_empty());
    assert_eq!(snap.apps.len(), 1);
    assert!(AppSwitch::new(snap.app("bitcoin").unwrap()).is_on(&snap));
    assert!(
        discover(&snap)
            .iter()
            .any(|e| e.unique_id() == "umbrel_app_bitcoin")
    );
}

#[tokio::test]
async fn test_steady_state_total_failure_still_publishes_defaults() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();
    server.reset().await;

    let snap = coordinator.refresh().await.unwrap();

    assert_eq!(coordinator.cycles_completed(), 2);
    assert!(snap.is_empty_cycle());
    assert_eq!(snap.system, umbrelly_api::SystemInfo::default());
    assert!(snap.apps.is_empty());
    assert!(!snap.update.available);
    assert!(!snap.two_factor_enabled);
    assert!(snap.external_devices.is_empty());
    assert!(snap.backup_progress.is_empty());
}

// ── Single-flight refresh ───────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_refreshes_share_one_cycle() {
    let server = MockServer::start().await;
    mount_host_except(&server, &["/trpc/apps.list"]).await;

    Mock::given(method("GET"))
        .and(path("/trpc/apps.list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(data(apps_fixture()))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = config(&server).build_client().unwrap();
    let coordinator = Coordinator::new(client, config(&server));

    let (a, b) = tokio::join!(coordinator.refresh(), coordinator.refresh());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(coordinator.cycles_completed(), 1);
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.apps.len(), 3);
}

#[tokio::test]
async fn test_on_demand_refresh_joins_periodic_cycle() {
    let server = MockServer::start().await;
    mount_host_except(&server, &["/trpc/apps.list"]).await;

    Mock::given(method("GET"))
        .and(path("/trpc/apps.list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(data(apps_fixture()))
                .set_delay(Duration::from_millis(600)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.refresh_interval = Duration::from_millis(300);
    let client = cfg.build_client().unwrap();
    let coordinator = Coordinator::new(client, cfg);
    coordinator.start().await;

    // first periodic tick at 300ms; its cycle runs until ~900ms
    tokio::time::sleep(Duration::from_millis(450)).await;
    let joined = coordinator.refresh().await.unwrap();

    assert_eq!(coordinator.cycles_completed(), 1);
    assert!(Arc::ptr_eq(&joined, &coordinator.snapshot()));
    assert_eq!(joined.apps.len(), 3);
    coordinator.shutdown().await;
}

// ── Observation ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_listeners_and_subscribers_see_each_publish() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();
    let mut rx = coordinator.subscribe();

    let calls = Arc::new(AtomicUsize::new(0));
    let id = coordinator.add_listener({
        let calls = Arc::clone(&calls);
        move |snap| {
            assert_eq!(snap.apps.len(), 3);
            calls.fetch_add(1, Ordering::SeqCst);
        }
    });

    coordinator.request_refresh().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().apps.len(), 3);

    assert!(coordinator.remove_listener(id));
    assert!(!coordinator.remove_listener(id));
    coordinator.request_refresh().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.cycles_completed(), 3);
}

#[tokio::test]
async fn test_panicking_listener_does_not_stop_publishing() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();
    coordinator.add_listener(|_| panic!("listener failure"));
    let calls = Arc::new(AtomicUsize::new(0));
    coordinator.add_listener({
        let calls = Arc::clone(&calls);
        move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    });

    coordinator.request_refresh().await;
    coordinator.request_refresh().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(coordinator.cycles_completed(), 3);
}

#[tokio::test]
async fn test_periodic_refresh_runs_until_shutdown() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    let mut cfg = config(&server);
    cfg.refresh_interval = Duration::from_millis(50);
    let coordinator = Coordinator::connect(cfg).await.unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(coordinator.cycles_completed() >= 2);

    coordinator.shutdown().await;
    let stopped_at = coordinator.cycles_completed();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(coordinator.cycles_completed(), stopped_at);
}

// ── Action adapters ─────────────────────────────────────────────────

#[tokio::test]
async fn test_starting_app_reads_as_on() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();
    let snap = coordinator.snapshot();

    let nextcloud = AppSwitch::new(snap.app("nextcloud").unwrap());
    let plex = AppSwitch::new(snap.app("plex").unwrap());
    assert!(nextcloud.is_on(&snap));
    assert!(!plex.is_on(&snap));
}

#[tokio::test]
async fn test_failed_app_control_does_not_refresh() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    Mock::given(method("POST"))
        .and(path("/trpc/apps.start"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();
    let switch = AppSwitch::new(coordinator.snapshot().app("plex").unwrap());

    assert!(!switch.turn_on(&coordinator).await);
    assert_eq!(coordinator.cycles_completed(), 1);
}

#[tokio::test]
async fn test_successful_app_control_refreshes() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    Mock::given(method("POST"))
        .and(path("/trpc/apps.stop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!(true))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/trpc/apps.restart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!(true))))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();
    let snap = coordinator.snapshot();
    let bitcoin = snap.app("bitcoin").unwrap();

    assert!(AppSwitch::new(bitcoin).turn_off(&coordinator).await);
    assert_eq!(coordinator.cycles_completed(), 2);

    assert!(AppRestartButton::new(bitcoin).press(&coordinator).await);
    assert_eq!(coordinator.cycles_completed(), 3);
}

#[tokio::test]
async fn test_reboot_never_refreshes() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    Mock::given(method("POST"))
        .and(path("/trpc/system.restart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data(json!(true))))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();

    assert!(SystemButton::Reboot.press(&coordinator).await);
    assert_eq!(coordinator.cycles_completed(), 1);
}

#[tokio::test]
async fn test_check_update_button_refreshes() {
    let server = MockServer::start().await;
    mount_host(&server).await;

    let coordinator = Coordinator::connect(config(&server)).await.unwrap();

    assert!(SystemButton::CheckUpdate.press(&coordinator).await);
    assert_eq!(coordinator.cycles_completed(), 2);
}
