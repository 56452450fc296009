#![warn(missing_docs)]
//! # finsight-app
//!
//! ## Purpose
//! Wires the finsight session pipeline together: storage, observable session
//! state, the authorized API client, the auth session manager, and the
//! feature loaders.
//!
//! ## Responsibilities
//! - Read runtime configuration from the environment with safe defaults.
//! - Bootstrap the component graph in dependency order, seeding session
//!   state from the vault's cached user.
//! - Provide the headless navigator and log-redaction helpers.
//! - Expose the build-time application version from the root `VERSION` file.
//!
//! ## Data flow
//! Host constructs an [`AppContext`] -> views call its auth session and
//! feature loaders -> every request flows through the shared authorized
//! client -> session transitions publish through the shared state.
//!
//! ## Ownership and lifetimes
//! The context owns the loaders; store, transport, gate and navigator are
//! shared `Arc` seams so hosts and tests can substitute any of them.
//!
//! ## Error model
//! Wiring failures (bad base URL, transport construction) surface as
//! [`AppError`]; everything downstream keeps its own layer's error type.
//!
//! ## Security and privacy notes
//! [`redact_sensitive`] strips token/credential markers before any
//! free-form text reaches a log line.

use std::sync::Arc;

use finsight_auth::{AuthError, AuthSession, SessionGuard, token_is_current};
use finsight_data::{AccountsApi, BillsApi, BudgetsApi, InsightsApi, TransactionsApi};
use finsight_http::{
    ApiClient, ApiError, HttpTransport, LoginRedirect, Navigator, RetryPolicy,
};
use finsight_session::SessionState;
use finsight_store::{KeyValueStore, SessionVault, StoreError};
use thiserror::Error;

/// Build-time application version loaded from the root `VERSION` file.
pub const APP_VERSION: &str = env!("FINSIGHT_VERSION");

/// Default API base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
/// Default referrer the demo-login endpoint accepts.
pub const DEFAULT_DEMO_REFERRER: &str = "https://justjay.net";
/// Default per-request timeout in milliseconds.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5_000;

/// Returns the app version sourced from the root `VERSION` file.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// API base URL.
    pub api_url: String,
    /// Referrer sent on demo-login requests.
    pub demo_referrer: String,
    /// Per-request timeout in milliseconds.
    pub http_timeout_ms: u64,
    /// Retry policy applied uniformly by the API client.
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Reads configuration from the environment.
    ///
    /// Semantics per variable:
    /// - `FINSIGHT_API_URL` => API base URL, default local backend.
    /// - `FINSIGHT_DEMO_REFERRER` => demo referrer, default production host.
    /// - `FINSIGHT_HTTP_TIMEOUT_MS` => request timeout; unparseable values
    ///   fall back to the default.
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("FINSIGHT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let demo_referrer = std::env::var("FINSIGHT_DEMO_REFERRER")
            .unwrap_or_else(|_| DEFAULT_DEMO_REFERRER.to_string());
        let http_timeout_ms = std::env::var("FINSIGHT_HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);

        Self {
            api_url,
            demo_referrer,
            http_timeout_ms,
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            demo_referrer: DEFAULT_DEMO_REFERRER.to_string(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}

/// Fully wired component graph for one session.
pub struct AppContext {
    /// Typed facade over the persisted session keys.
    pub vault: SessionVault,
    /// Observable session state, seeded from the cached user.
    pub state: Arc<SessionState>,
    /// Authentication session manager.
    pub auth: AuthSession,
    /// Shared authorized API client.
    pub client: Arc<ApiClient>,
    /// Account loader.
    pub accounts: AccountsApi,
    /// Bill loader with speculative cache.
    pub bills: BillsApi,
    /// Budget loader.
    pub budgets: BudgetsApi,
    /// Transaction loader.
    pub transactions: TransactionsApi,
    /// Insight loader.
    pub insights: InsightsApi,
}

impl AppContext {
    /// Bootstraps the component graph over injected store, transport and
    /// navigator seams.
    ///
    /// # Errors
    /// Returns [`AppError::Api`] when the configured base URL is invalid.
    pub fn bootstrap(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn HttpTransport>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, AppError> {
        let vault = SessionVault::new(store);
        let state = Arc::new(SessionState::new(vault.cached_user()));
        let guard = Arc::new(SessionGuard::new(vault.clone(), Arc::clone(&state)));

        let client = Arc::new(ApiClient::new(
            &config.api_url,
            transport,
            Arc::clone(&guard) as Arc<dyn finsight_http::SessionGate>,
            navigator,
            config.retry,
        )?);

        let auth = AuthSession::new(Arc::clone(&client), guard, config.demo_referrer.clone());

        Ok(Self {
            vault,
            state,
            auth,
            accounts: AccountsApi::new(Arc::clone(&client)),
            bills: BillsApi::new(Arc::clone(&client)),
            budgets: BudgetsApi::new(Arc::clone(&client)),
            transactions: TransactionsApi::new(Arc::clone(&client)),
            insights: InsightsApi::new(Arc::clone(&client)),
            client,
        })
    }
}

/// Headless navigator: records the redirect in the log instead of routing.
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_login(&self, redirect: &LoginRedirect) {
        log::warn!(
            "redirecting to login (return={}): {}",
            redirect.return_url,
            redirect.message
        );
    }
}

/// Human-readable session status for the headless status display.
pub fn session_status(vault: &SessionVault, now_epoch_s: u64) -> &'static str {
    match vault.token() {
        None => "anonymous",
        Some(token) if token_is_current(&token, now_epoch_s) => "authenticated",
        Some(_) => "expired",
    }
}

/// Current time as seconds since the Unix epoch.
pub fn now_epoch_seconds() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Redacts common secret markers in log-safe output.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for key in ["password", "token", "authorization", "bearer"] {
        redacted = redact_key_value(&redacted, key);
    }
    redacted
}

fn redact_key_value(input: &str, key: &str) -> String {
    let lower = input.to_ascii_lowercase();
    if let Some(position) = lower.find(key) {
        let prefix = &input[..position];
        return format!("{prefix}{key}=<redacted>");
    }

    input.to_string()
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// HTTP layer error (invalid base URL, transport construction).
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    /// Auth subsystem error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    /// Persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
