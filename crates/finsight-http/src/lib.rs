#![warn(missing_docs)]
//! # finsight-http
//!
//! ## Purpose
//! Implements the HTTP request-authorization pipeline: bearer-token header
//! injection, centralized 401/403 recovery, and the consolidated retry
//! policy applied to every API call.
//!
//! ## Responsibilities
//! - Define the request/response model and the [`HttpTransport`] seam.
//! - Provide a blocking `reqwest` transport for real traffic.
//! - Classify failures into retriable and permanent classes.
//! - Drive retries with capped exponential backoff plus jitter.
//! - Expose [`ApiClient`], the request authorizer every loader goes through.
//!
//! ## Data flow
//! Loaders build paths/bodies -> [`ApiClient`] attaches the bearer token from
//! the injected [`SessionGate`] -> transport executes -> 401/403 responses
//! force logout and a login redirect before the error returns to the caller.
//!
//! ## Ownership and lifetimes
//! Transport, gate and navigator are shared as `Arc<dyn Trait>` so the client
//! stays cheaply cloneable and fully stubbable in tests.
//!
//! ## Error model
//! All failures surface as [`ApiError`]: transport-level outages map to
//! `Offline` (the "status 0" case), non-2xx statuses carry the backend's
//! best-effort message, and undecodable bodies map to `MalformedBody` so
//! callers can drive fallback strategies.
//!
//! ## Security and privacy notes
//! Log lines mention URLs and statuses only; tokens and credential bodies
//! are never logged by this crate.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Human-readable message carried on the login redirect after a 401/403.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// HTTP method subset used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// Returns the wire method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// One outgoing API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Fully resolved request URL.
    pub url: String,
    /// Header name/value pairs (authorization is appended by the client).
    pub headers: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<Value>,
}

/// One API response as seen by the client.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body text.
    pub body: String,
}

impl ApiResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    /// Returns [`ApiError::MalformedBody`] when the body does not decode,
    /// which is the signal the bill loader's fallback chain keys on.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|error| ApiError::MalformedBody(error.to_string()))
    }

    /// Extracts the backend's best-effort error message from the body
    /// (`error.message`, falling back to top-level `message`).
    pub fn error_message(&self) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        let nested = value
            .get("error")
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str);
        let flat = value.get("message").and_then(Value::as_str);
        nested.or(flat).map(str::to_string)
    }
}

/// Abstract transport executing one request. Implementations do not retry
/// and do not inspect authorization state.
pub trait HttpTransport: Send + Sync {
    /// Executes one request.
    ///
    /// # Errors
    /// Returns [`ApiError::Offline`] for transport-level failures; any HTTP
    /// status, including errors, comes back as an [`ApiResponse`].
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Blocking `reqwest` transport with a per-request timeout.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Builds a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    /// Returns [`ApiError::Offline`] when the underlying client cannot be
    /// constructed.
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ApiError::Offline(error.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .map_err(|error| ApiError::Offline(error.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| ApiError::MalformedBody(error.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}

/// Failure classification driving retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Transient; another attempt may succeed.
    Retriable,
    /// Deterministic; retrying cannot help.
    Permanent,
}

/// Classifies an API failure. Outages and 5xx responses are retriable;
/// every 4xx (authorization and validation failures included) is permanent.
pub fn classify_api_error(error: &ApiError) -> FailureClass {
    match error {
        ApiError::Offline(_) => FailureClass::Retriable,
        ApiError::Status { status, .. } if *status >= 500 => FailureClass::Retriable,
        _ => FailureClass::Permanent,
    }
}

/// Retry policy with capped exponential backoff and uniform jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on the backoff delay, before jitter.
    pub max_delay_ms: u64,
    /// Upper bound on the uniform jitter added to each delay.
    pub jitter_ms: u64,
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Returns the backoff delay before retry number `attempt` (1-based),
    /// doubling from the base and capped at `max_delay_ms`, before jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self
            .base_delay_ms
            .saturating_mul(1_u64 << exponent)
            .min(self.max_delay_ms);
        backoff.saturating_add(self.jitter())
    }

    fn jitter(&self) -> u64 {
        if self.jitter_ms == 0 {
            return 0;
        }
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.subsec_nanos() as u64)
            .unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(seed);
        rng.random_range(0..=self.jitter_ms)
    }
}

impl Default for RetryPolicy {
    /// Single timed retry, matching the observed offline-retry behavior.
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
            jitter_ms: 100,
        }
    }
}

/// Session seam the authorizer reads tokens from and reports rejections to.
pub trait SessionGate: Send + Sync {
    /// Returns the current bearer token, if a session exists.
    fn bearer_token(&self) -> Option<String>;

    /// Tears the session down after an authorization rejection. Idempotent.
    fn force_logout(&self);
}

/// Redirect target raised after an authorization rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// URL of the request that was rejected, used as the return target.
    pub return_url: String,
    /// Human-readable explanation shown on the login view.
    pub message: String,
}

/// Navigation seam carrying the post-rejection redirect to the host UI.
pub trait Navigator: Send + Sync {
    /// Navigates to the login view with a return target and message.
    fn redirect_to_login(&self, redirect: &LoginRedirect);
}

/// The request authorizer: attaches bearer credentials, applies the retry
/// policy, and reacts to authorization rejections exactly once per response.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    transport: Arc<dyn HttpTransport>,
    gate: Arc<dyn SessionGate>,
    navigator: Arc<dyn Navigator>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Creates a client over a validated base URL.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidUrl`] when `base_url` does not parse.
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        gate: Arc<dyn SessionGate>,
        navigator: Arc<dyn Navigator>,
        retry: RetryPolicy,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|error| ApiError::InvalidUrl(format!("{base_url}: {error}")))?;
        Ok(Self {
            base,
            transport,
            gate,
            navigator,
            retry,
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Executes a request with retry semantics: retriable failures are
    /// retried up to the policy limit with backoff; permanent failures
    /// (all 4xx included) return immediately.
    ///
    /// # Errors
    /// Returns the final [`ApiError`] once the policy is exhausted or a
    /// permanent failure occurs.
    pub fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt = 0_u32;
        loop {
            attempt += 1;
            match self.execute_once(request) {
                Ok(response) => return Ok(response),
                Err(error) => {
                    let retriable = classify_api_error(&error) == FailureClass::Retriable;
                    if !retriable || attempt > self.retry.max_retries {
                        return Err(error);
                    }
                    let delay = self.retry.delay_for_attempt(attempt);
                    log::debug!(
                        "retrying {} {} after {delay}ms (attempt {attempt}): {error}",
                        request.method.as_str(),
                        request.url
                    );
                    thread::sleep(Duration::from_millis(delay));
                }
            }
        }
    }

    fn execute_once(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut outgoing = request.clone();
        if let Some(token) = self.gate.bearer_token() {
            outgoing
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        // No token: the request goes through unmodified and the backend
        // rejects protected endpoints itself.

        let response = self.transport.execute(&outgoing)?;
        log::debug!(
            "{} {} -> {}",
            request.method.as_str(),
            request.url,
            response.status
        );

        if response.status == 401 || response.status == 403 {
            let message = response
                .error_message()
                .unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string());
            self.gate.force_logout();
            self.navigator.redirect_to_login(&LoginRedirect {
                return_url: request.url.clone(),
                message: SESSION_EXPIRED_MESSAGE.to_string(),
            });
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        if !response.is_success() {
            return Err(ApiError::Status {
                status: response.status,
                message: response.error_message().unwrap_or_default(),
            });
        }

        Ok(response)
    }

    /// Builds a request URL from a path and query pairs.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidUrl`] when the path does not resolve
    /// against the base URL.
    pub fn resolve(&self, path: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|error| ApiError::InvalidUrl(format!("{path}: {error}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url.into())
    }

    /// Executes and decodes a JSON response.
    ///
    /// # Errors
    /// Propagates transport/status failures and body decode failures.
    pub fn send_json<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let request = ApiRequest {
            method,
            url: self.resolve(path, query)?,
            headers: headers
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
            body,
        };
        self.execute(&request)?.json()
    }

    /// Executes a request whose response body is ignored.
    ///
    /// # Errors
    /// Propagates transport/status failures.
    pub fn send_unit(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<(), ApiError> {
        let request = ApiRequest {
            method,
            url: self.resolve(path, &[])?,
            headers: Vec::new(),
            body,
        };
        self.execute(&request).map(|_| ())
    }

    /// GET with query pairs, decoded as JSON.
    ///
    /// # Errors
    /// Propagates transport/status/decoding failures.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.send_json(HttpMethod::Get, path, query, &[], None)
    }

    /// POST with a JSON body, decoded as JSON.
    ///
    /// # Errors
    /// Propagates serialization, transport, status and decoding failures.
    pub fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(HttpMethod::Post, path, &[], &[], Some(to_body(body)?))
    }

    /// PUT with a JSON body, decoded as JSON.
    ///
    /// # Errors
    /// Propagates serialization, transport, status and decoding failures.
    pub fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(HttpMethod::Put, path, &[], &[], Some(to_body(body)?))
    }
}

/// Serializes a request body to a JSON value.
///
/// # Errors
/// Returns [`ApiError::MalformedBody`] when serialization fails.
pub fn to_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|error| ApiError::MalformedBody(error.to_string()))
}

/// HTTP layer error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (no HTTP status; the "service offline" case).
    #[error("service offline: {0}")]
    Offline(String),
    /// Backend returned a non-2xx status.
    #[error("request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Best-effort message extracted from the error body.
        message: String,
    },
    /// Response body could not be decoded.
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    /// Request URL could not be constructed.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}
