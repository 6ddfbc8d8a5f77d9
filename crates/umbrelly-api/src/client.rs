// umbrelOS tRPC HTTP client
//
// Wraps `reqwest::Client` with bearer-token session handling, tRPC input
// encoding, and `result.data` envelope unwrapping. Read accessors come in
// pairs: `fetch_*` propagates errors, the plain form logs and falls back to
// the endpoint's default. Actions never raise; they report a bool.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::endpoints;
use crate::error::Error;
use crate::models::{
    App, AppAction, AppStateInfo, BackupProgress, CpuUsage, ExternalDevice, Reading,
    RpcEnvelope, RpcErrorBody, StorageUsage, SystemInfo, Temperature, UpdateInfo, UpdateStatus,
    VersionReport, decode_records,
};
use crate::transport::{DEFAULT_LOGIN_TIMEOUT, TransportConfig};

/// Async client for one umbrelOS host.
///
/// Owns the credentials and the session token. The token is fetched lazily
/// on the first call and dropped whenever the host answers 401, so the next
/// call logs in again. Concurrent calls that all find no token may each log
/// in; the last successful login wins, which is harmless.
pub struct UmbrelClient {
    http: reqwest::Client,
    base_url: Url,
    password: SecretString,
    login_timeout: Duration,
    token: RwLock<Option<SecretString>>,
}

impl UmbrelClient {
    /// Create a client for `host` from a `TransportConfig`.
    ///
    /// `host` may be a bare `host[:port]` (treated as `http://`) or a full URL.
    pub fn new(host: &str, password: SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Self::normalize_host(host)?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            password,
            login_timeout: transport.login_timeout,
            token: RwLock::new(None),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, password: SecretString) -> Self {
        Self {
            http,
            base_url,
            password,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            token: RwLock::new(None),
        }
    }

    /// Strip trailing slashes and default the scheme to `http://`.
    pub fn normalize_host(host: &str) -> Result<Url, Error> {
        let trimmed = host.trim().trim_end_matches('/');
        let full = if trimmed.starts_with("http") {
            trimmed.to_owned()
        } else {
            format!("http://{trimmed}")
        };
        Ok(Url::parse(&full)?)
    }

    /// The host base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Whether a session token is currently held.
    pub fn has_session(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    /// Drop the session token; the next call logs in again.
    pub fn clear_session(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    fn bearer(&self) -> Option<SecretString> {
        self.token.read().expect("token lock poisoned").clone()
    }

    /// Log in with the configured password.
    ///
    /// `POST /trpc/user.login` with `{"password": ...}`.
    ///
    /// Returns `Ok(true)` and stores the token on HTTP 200 with a token in
    /// `result.data`; `Ok(false)` for any other status or a body without a
    /// token. Transport failures propagate so callers can tell "wrong
    /// password" apart from "host unreachable".
    pub async fn login(&self) -> Result<bool, Error> {
        let url = self.endpoint_url(endpoints::LOGIN)?;
        debug!("logging in at {}", url);

        let body = json!({ "password": self.password.expose_secret() });

        let resp = self
            .http
            .post(url)
            .timeout(self.login_timeout)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "failed to reach host for login");
                Error::Transport(e)
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            warn!(%status, "login rejected");
            return Ok(false);
        }

        let text = resp.text().await.map_err(Error::Transport)?;
        let token = serde_json::from_str::<RpcEnvelope>(&text)
            .ok()
            .and_then(RpcEnvelope::into_data)
            .and_then(|data| data.as_str().map(String::from));

        match token {
            Some(token) => {
                *self.token.write().expect("token lock poisoned") = Some(SecretString::from(token));
                debug!("login successful");
                Ok(true)
            }
            None => {
                warn!("login response carried no token");
                Ok(false)
            }
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{endpoint}"))?)
    }

    /// Build the request URL. Reads carry their input in the query string as
    /// `?input=<escaped {"json": params}>`.
    fn request_url(&self, method: &Method, endpoint: &str, params: Option<&Value>) -> Result<Url, Error> {
        match params {
            Some(params) if *method == Method::GET => {
                let input = json!({ "json": params }).to_string();
                let base = self.base_url.as_str().trim_end_matches('/');
                let encoded = urlencoding::encode(&input);
                Ok(Url::parse(&format!("{base}{endpoint}?input={encoded}"))?)
            }
            _ => self.endpoint_url(endpoint),
        }
    }

    /// Perform one authenticated request and return the decoded JSON body.
    ///
    /// Logs in first if no session is held. Mutating calls send `params` as
    /// the JSON body. No retries: a failed call surfaces immediately and the
    /// next poll cycle is the retry.
    pub async fn call(&self, method: Method, endpoint: &str, params: Option<&Value>) -> Result<Value, Error> {
        if !self.has_session() && !self.login().await? {
            return Err(Error::Authentication {
                message: "login rejected by host".into(),
            });
        }

        let url = self.request_url(&method, endpoint, params)?;
        debug!("{method} {url}");

        let mut builder = self
            .http
            .request(method.clone(), url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = self.bearer() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if method != Method::GET {
            if let Some(params) = params {
                builder = builder.json(params);
            }
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        self.handle_response(resp).await
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                debug!("session rejected, dropping token");
                self.clear_session();
            }
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RpcErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(len = body.len(), "response body received");
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// `GET` an endpoint and decode `result.data` into `T`.
    ///
    /// A missing `result.data` yields `T::default()`; a present but
    /// mistyped one is a `Deserialization` error.
    async fn query<T>(&self, endpoint: &str, params: Option<&Value>) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        let raw = self.call(Method::GET, endpoint, params).await?;
        decode_data(endpoint, raw)
    }

    /// `GET` a list endpoint, decoding each record on its own.
    async fn query_records<T>(&self, endpoint: &str) -> Result<Vec<T>, Error>
    where
        T: DeserializeOwned,
    {
        let items: Vec<Value> = self.query(endpoint, None).await?;
        Ok(decode_records(endpoint, items))
    }

    async fn mutate(&self, endpoint: &str, params: Option<&Value>) -> Result<(), Error> {
        self.call(Method::POST, endpoint, params).await.map(|_| ())
    }

    /// Run a mutation, logging and flattening the outcome to a bool.
    async fn action(&self, what: &str, endpoint: &str, params: Option<&Value>) -> bool {
        match self.mutate(endpoint, params).await {
            Ok(()) => {
                info!("{what} accepted");
                true
            }
            Err(e) => {
                error!(error = %e, "{what} failed");
                false
            }
        }
    }

    // ── System ───────────────────────────────────────────────────────

    /// `GET /trpc/system.version`
    pub async fn fetch_version(&self) -> Result<Option<String>, Error> {
        let report: Option<VersionReport> = self.query(endpoints::VERSION, None).await?;
        Ok(report.map(VersionReport::into_version))
    }

    /// Aggregate the six `system.*` status endpoints concurrently.
    ///
    /// Each sub-field degrades to `None` on its own. Only when every
    /// sub-endpoint fails is the first error returned.
    pub async fn fetch_system_info(&self) -> Result<SystemInfo, Error> {
        let (version, uptime, temperature, cpu_usage, memory, disk) = tokio::join!(
            self.fetch_version(),
            self.query::<Option<f64>>(endpoints::UPTIME, None),
            self.query::<Option<Reading<Temperature>>>(endpoints::CPU_TEMPERATURE, None),
            self.query::<Option<Reading<CpuUsage>>>(endpoints::CPU_USAGE, None),
            self.query::<Option<Reading<StorageUsage>>>(endpoints::MEMORY_USAGE, None),
            self.query::<Option<Reading<StorageUsage>>>(endpoints::DISK_USAGE, None),
        );

        let mut failures = Vec::new();
        let info = SystemInfo {
            version: settle(endpoints::VERSION, version, &mut failures),
            uptime: settle(endpoints::UPTIME, uptime, &mut failures),
            temperature: settle(endpoints::CPU_TEMPERATURE, temperature, &mut failures),
            cpu_usage: settle(endpoints::CPU_USAGE, cpu_usage, &mut failures),
            memory: settle(endpoints::MEMORY_USAGE, memory, &mut failures),
            disk: settle(endpoints::DISK_USAGE, disk, &mut failures),
        };

        if failures.len() == 6 {
            return Err(failures.swap_remove(0));
        }
        Ok(info)
    }

    pub async fn system_info(&self) -> SystemInfo {
        or_default("system info", self.fetch_system_info().await)
    }

    /// `GET /trpc/system.checkUpdate`
    pub async fn fetch_check_update(&self) -> Result<UpdateInfo, Error> {
        self.query(endpoints::CHECK_UPDATE, None).await
    }

    /// Update availability; `{available: false}` on failure.
    pub async fn check_update(&self) -> UpdateInfo {
        or_default("update check", self.fetch_check_update().await)
    }

    /// `GET /trpc/system.updateStatus`
    pub async fn fetch_update_status(&self) -> Result<UpdateStatus, Error> {
        self.query(endpoints::UPDATE_STATUS, None).await
    }

    pub async fn update_status(&self) -> UpdateStatus {
        or_default("update status", self.fetch_update_status().await)
    }

    /// `GET /trpc/user.is2faEnabled`
    pub async fn fetch_two_factor_enabled(&self) -> Result<bool, Error> {
        self.query(endpoints::TWO_FACTOR_ENABLED, None).await
    }

    pub async fn two_factor_enabled(&self) -> bool {
        or_default("two-factor status", self.fetch_two_factor_enabled().await)
    }

    // ── Storage & backups ────────────────────────────────────────────

    /// `GET /trpc/files.externalDevices`
    pub async fn fetch_external_devices(&self) -> Result<Vec<ExternalDevice>, Error> {
        self.query_records(endpoints::EXTERNAL_DEVICES).await
    }

    pub async fn external_devices(&self) -> Vec<ExternalDevice> {
        or_default("external devices", self.fetch_external_devices().await)
    }

    /// `GET /trpc/backups.backupProgress`
    pub async fn fetch_backup_progress(&self) -> Result<Vec<BackupProgress>, Error> {
        self.query_records(endpoints::BACKUP_PROGRESS).await
    }

    pub async fn backup_progress(&self) -> Vec<BackupProgress> {
        or_default("backup progress", self.fetch_backup_progress().await)
    }

    // ── Apps ─────────────────────────────────────────────────────────

    /// `GET /trpc/apps.list`
    pub async fn fetch_apps(&self) -> Result<Vec<App>, Error> {
        self.query_records(endpoints::APPS_LIST).await
    }

    pub async fn apps(&self) -> Vec<App> {
        or_default("app list", self.fetch_apps().await)
    }

    /// `GET /trpc/apps.state?input={"json":{"appId":...}}`
    pub async fn fetch_app_state(&self, app_id: &str) -> Result<AppStateInfo, Error> {
        self.query(endpoints::APP_STATE, Some(&json!({ "appId": app_id })))
            .await
    }

    pub async fn app_state(&self, app_id: &str) -> AppStateInfo {
        or_default("app state", self.fetch_app_state(app_id).await)
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// `POST /trpc/apps.{start,stop,restart}` with `{"appId": ...}`
    pub async fn set_app_state(&self, app_id: &str, action: AppAction) -> bool {
        let endpoint = endpoints::app_action(action);
        debug!(app_id, %action, "setting app state");
        self.action(
            &format!("app {action} for {app_id}"),
            &endpoint,
            Some(&json!({ "appId": app_id })),
        )
        .await
    }

    /// `POST /trpc/apps.update` with `{"appId": ...}`
    pub async fn update_app(&self, app_id: &str) -> bool {
        self.action(
            &format!("app update for {app_id}"),
            endpoints::APP_UPDATE,
            Some(&json!({ "appId": app_id })),
        )
        .await
    }

    /// `POST /trpc/system.update`
    pub async fn update_system(&self) -> bool {
        self.action("system update", endpoints::UPDATE, None).await
    }

    /// `POST /trpc/system.restart`
    pub async fn reboot(&self) -> bool {
        self.action("reboot", endpoints::RESTART, None).await
    }

    /// `POST /trpc/system.shutdown`
    pub async fn shutdown(&self) -> bool {
        self.action("shutdown", endpoints::SHUTDOWN, None).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn decode_data<T>(endpoint: &str, raw: Value) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    let envelope: RpcEnvelope = serde_json::from_value(raw).map_err(|e| Error::Deserialization {
        message: format!("{endpoint}: unexpected envelope: {e}"),
        body: String::new(),
    })?;

    match envelope.into_data() {
        None => Ok(T::default()),
        Some(data) => serde_json::from_value(data.clone()).map_err(|e| Error::Deserialization {
            message: format!("{endpoint}: {e}"),
            body: data.to_string(),
        }),
    }
}

/// Collect a sub-endpoint failure and fall back to the default.
fn settle<T: Default>(endpoint: &str, result: Result<T, Error>, failures: &mut Vec<Error>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(endpoint, error = %e, "system status endpoint failed");
            failures.push(e);
            T::default()
        }
    }
}

/// Downgrade a failed read to the endpoint's default value.
fn or_default<T: Default>(what: &str, result: Result<T, Error>) -> T {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "error fetching {what}, using default");
        T::default()
    })
}
