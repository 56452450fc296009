//! Shared fixtures for app integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use finsight_app::{AppConfig, AppContext};
use finsight_http::{
    ApiError, ApiRequest, ApiResponse, HttpTransport, LoginRedirect, Navigator, RetryPolicy,
    SessionGate,
};
use finsight_store::MemoryStore;

/// Transport replaying a scripted response sequence while recording every
/// outgoing request. An exhausted script reads as an outage.
#[allow(dead_code)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    #[allow(dead_code)]
    pub fn new(script: Vec<Result<ApiResponse, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Returns every request seen so far, in order.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .expect("request lock should work")
            .clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request.clone());
        self.script
            .lock()
            .expect("script lock should work")
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Offline("script exhausted".to_string())))
    }
}

/// Shorthand for one scripted HTTP response.
#[allow(dead_code)]
pub fn response(status: u16, body: &str) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse {
        status,
        body: body.to_string(),
    })
}

/// Navigator recording every login redirect it receives.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<LoginRedirect>>,
}

impl RecordingNavigator {
    #[allow(dead_code)]
    pub fn redirects(&self) -> Vec<LoginRedirect> {
        self.redirects
            .lock()
            .expect("redirect lock should work")
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self, redirect: &LoginRedirect) {
        self.redirects
            .lock()
            .expect("redirect lock should work")
            .push(redirect.clone());
    }
}

/// Session gate with a fixed token that counts forced logouts.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct CountingGate {
    token: Mutex<Option<String>>,
    logouts: AtomicU32,
}

impl CountingGate {
    #[allow(dead_code)]
    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[allow(dead_code)]
    pub fn with_token(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(token.to_string())),
            logouts: AtomicU32::new(0),
        })
    }

    #[allow(dead_code)]
    pub fn logouts(&self) -> u32 {
        self.logouts.load(Ordering::SeqCst)
    }
}

impl SessionGate for CountingGate {
    fn bearer_token(&self) -> Option<String> {
        self.token.lock().expect("token lock should work").clone()
    }

    fn force_logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        *self.token.lock().expect("token lock should work") = None;
    }
}

/// Builds a JWT-shaped token carrying the given claim payload. The signature
/// segment is junk, which the local validity heuristic never inspects.
#[allow(dead_code)]
pub fn forge_token(payload: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload);
    format!("{header}.{body}.sig")
}

/// Bootstraps a full context over a fresh memory store, the scripted
/// transport and a recording navigator. Retries are disabled so scripts
/// line up one-to-one with requests.
#[allow(dead_code)]
pub fn harness(
    script: Vec<Result<ApiResponse, ApiError>>,
) -> (AppContext, Arc<ScriptedTransport>, Arc<RecordingNavigator>) {
    harness_with_store(script, Arc::new(MemoryStore::new()))
}

/// Same as [`harness`], over a caller-provided store.
#[allow(dead_code)]
pub fn harness_with_store(
    script: Vec<Result<ApiResponse, ApiError>>,
    store: Arc<MemoryStore>,
) -> (AppContext, Arc<ScriptedTransport>, Arc<RecordingNavigator>) {
    let transport = ScriptedTransport::new(script);
    let navigator = Arc::new(RecordingNavigator::default());
    let config = AppConfig {
        api_url: "https://api.finsight.test".to_string(),
        retry: RetryPolicy::none(),
        ..AppConfig::default()
    };
    let context = AppContext::bootstrap(
        &config,
        store,
        Arc::clone(&transport) as Arc<dyn HttpTransport>,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
    )
    .expect("context should bootstrap");
    (context, transport, navigator)
}
