#![warn(missing_docs)]
//! # finsight-auth
//!
//! ## Purpose
//! Implements the client-side authentication session: login flows, the
//! local token-validity heuristic, and the forced-logout path shared with
//! the request authorizer.
//!
//! ## Responsibilities
//! - Decode JWT claims without signature verification (3-segment rule,
//!   base64url payload, `exp` expiry heuristic).
//! - Model safe session transitions: anonymous -> authenticated on
//!   login/demo success, authenticated -> anonymous on logout, expiry, or
//!   an authorization rejection during refresh.
//! - Persist token/user/demo-flag through the session vault and publish
//!   every transition to the observable session state.
//!
//! ## Data flow
//! UI collects credentials -> [`AuthSession::login`] posts them through the
//! authorized client -> token/user persist into the vault -> the new user
//! publishes through [`finsight_session::SessionState`]. 401/403 responses
//! anywhere flow back through [`SessionGuard::force_logout`].
//!
//! ## Ownership and lifetimes
//! Token and user values are owned; the guard is shared (`Arc`) between the
//! session manager and the HTTP authorizer.
//!
//! ## Error model
//! Credential rejections, contract violations and malformed tokens surface
//! as [`AuthError`]; transport failures pass through as
//! [`AuthError::Api`].
//!
//! ## Security and privacy notes
//! The validity check is local and unverified: it rules out obviously
//! malformed or expired tokens but never guarantees server-side validity.
//! Credentials and token values are never logged.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use finsight_core::User;
use finsight_http::{ApiClient, ApiError, HttpMethod, SessionGate, to_body};
use finsight_session::SessionState;
use finsight_store::SessionVault;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Login endpoint path.
pub const LOGIN_PATH: &str = "/api/auth/login";
/// Demo-login endpoint path.
pub const DEMO_LOGIN_PATH: &str = "/api/auth/demo";
/// Registration endpoint path.
pub const REGISTER_PATH: &str = "/api/auth/register";
/// "Who am I" endpoint path.
pub const WHO_AM_I_PATH: &str = "/api/auth/me";
/// Marker header the backend requires on demo-login requests.
pub const DEMO_REQUEST_HEADER: &str = "X-Demo-Request";

/// Claims decoded from a JWT payload segment. Signature is never checked.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Subject claim, usually the user id.
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry claim, seconds since epoch.
    #[serde(default)]
    pub exp: Option<u64>,
    /// Remaining claims, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decodes the payload segment of a JWT-formatted token.
///
/// # Errors
/// Returns [`AuthError::MalformedToken`] unless the token splits into
/// exactly three dot-separated segments whose payload is base64url JSON.
pub fn decode_claims(token: &str) -> Result<TokenClaims, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1])
        .map_err(|error| AuthError::MalformedToken(format!("payload is not base64url: {error}")))?;
    serde_json::from_slice(&payload)
        .map_err(|error| AuthError::MalformedToken(format!("payload is not claim JSON: {error}")))
}

/// Returns `true` when the token is well-formed and its `exp` claim (if any)
/// is strictly in the future. Local heuristic only.
pub fn token_is_current(token: &str, now_epoch_s: u64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.exp.is_none_or(|exp| exp > now_epoch_s),
        Err(_) => false,
    }
}

/// Shared session teardown: clears the vault and publishes anonymous state.
///
/// Implements [`SessionGate`] so the request authorizer can read the token
/// and force a logout without a circular dependency on this crate's session
/// manager.
pub struct SessionGuard {
    vault: SessionVault,
    state: Arc<SessionState>,
}

impl SessionGuard {
    /// Creates a guard over the vault and observable state.
    pub fn new(vault: SessionVault, state: Arc<SessionState>) -> Self {
        Self { vault, state }
    }

    /// Returns the session vault.
    pub fn vault(&self) -> &SessionVault {
        &self.vault
    }

    /// Returns the observable session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Persists a fresh session: token plus complete user, then publish.
    fn establish(&self, token: &str, user: &User) {
        if let Err(error) = self.vault.set_token(token) {
            log::warn!("token persistence failed: {error}");
        }
        if let Err(error) = self.vault.set_cached_user(user) {
            log::warn!("cached user persistence failed: {error}");
        }
        self.state.replace(Some(user.clone()));
    }
}

impl SessionGate for SessionGuard {
    fn bearer_token(&self) -> Option<String> {
        self.vault.token()
    }

    fn force_logout(&self) {
        if let Err(error) = self.vault.clear_session() {
            log::warn!("session clear failed: {error}");
        }
        self.state.replace(None);
    }
}

/// Registration request forwarded to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Registration outcome. Registration never establishes a session itself;
/// the caller decides whether to auto-login with a returned token or send
/// the user to the login view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisterResult {
    /// Token the backend may hand out for immediate login.
    #[serde(default)]
    pub token: Option<String>,
    /// User record the backend may include.
    #[serde(default)]
    pub user: Option<User>,
    /// Informational message.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

/// Result of a successful login or demo login.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Token and complete user are persisted and published.
    Established(User),
    /// The backend returned a token without a usable user record. The token
    /// is persisted and a profile refresh was attempted but did not complete;
    /// callers should retry [`AuthSession::refresh_user_info`].
    ProfilePending,
}

/// Client-side authentication session manager.
pub struct AuthSession {
    client: Arc<ApiClient>,
    guard: Arc<SessionGuard>,
    demo_referrer: String,
}

impl AuthSession {
    /// Creates the session manager.
    ///
    /// `demo_referrer` is the referrer value the backend requires on the
    /// demo-login endpoint.
    pub fn new(
        client: Arc<ApiClient>,
        guard: Arc<SessionGuard>,
        demo_referrer: impl Into<String>,
    ) -> Self {
        Self {
            client,
            guard,
            demo_referrer: demo_referrer.into(),
        }
    }

    /// Returns the shared session guard.
    pub fn guard(&self) -> &Arc<SessionGuard> {
        &self.guard
    }

    /// Authenticates with email/password credentials.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidCredentials`] on a 4xx rejection,
    /// [`AuthError::InvalidResponse`] when the response omits the token,
    /// and propagates transport failures as [`AuthError::Api`].
    pub fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response: LoginResponse = self
            .client
            .send_json(HttpMethod::Post, LOGIN_PATH, &[], &[], Some(body))
            .map_err(|error| match error {
                ApiError::Status { status, message } if (400..500).contains(&status) => {
                    AuthError::InvalidCredentials(non_empty_or(message, "invalid credentials"))
                }
                other => AuthError::Api(other),
            })?;

        self.complete_login(response)
    }

    /// Authenticates through the no-credential demo path. The backend
    /// recognizes the request by a marker header and the configured referrer.
    ///
    /// # Errors
    /// Returns [`AuthError::DemoUnavailable`] with a backend-derived reason
    /// (403 referrer rejection, 404 endpoint absent, 401 unauthorized).
    pub fn demo_login(&self) -> Result<LoginOutcome, AuthError> {
        let headers = [
            (DEMO_REQUEST_HEADER, "true"),
            ("Referer", self.demo_referrer.as_str()),
        ];
        let response: LoginResponse = self
            .client
            .send_json(HttpMethod::Post, DEMO_LOGIN_PATH, &[], &headers, None)
            .map_err(|error| match error {
                ApiError::Status { status: 403, .. } => AuthError::DemoUnavailable(
                    "demo mode is only available from an allowed referrer".to_string(),
                ),
                ApiError::Status { status: 404, .. } => {
                    AuthError::DemoUnavailable("demo mode is not available".to_string())
                }
                ApiError::Status { status: 401, .. } => {
                    AuthError::DemoUnavailable("unauthorized".to_string())
                }
                other => AuthError::Api(other),
            })?;

        let outcome = self.complete_login(response)?;
        if let Err(error) = self.guard.vault().set_demo_mode(true) {
            log::warn!("demo flag persistence failed: {error}");
        }
        Ok(outcome)
    }

    /// Forwards a registration request. Never establishes a session.
    ///
    /// # Errors
    /// Propagates backend rejections as [`AuthError::Api`]; validation
    /// messages arrive verbatim inside the status error.
    pub fn register(&self, request: &RegisterRequest) -> Result<RegisterResult, AuthError> {
        let result = self.client.send_json(
            HttpMethod::Post,
            REGISTER_PATH,
            &[],
            &[],
            Some(to_body(request)?),
        )?;
        Ok(result)
    }

    /// Clears the persisted session and publishes anonymous state.
    /// Idempotent.
    pub fn logout(&self) {
        self.guard.force_logout();
    }

    /// Local, unverified session check.
    ///
    /// Returns `false` when no token is stored. A malformed (not three
    /// segments) or expired token additionally forces a logout before
    /// returning `false`.
    pub fn is_authenticated(&self, now_epoch_s: u64) -> bool {
        let Some(token) = self.guard.vault().token() else {
            return false;
        };
        if token_is_current(&token, now_epoch_s) {
            return true;
        }
        log::warn!("stored token is malformed or expired, forcing logout");
        self.guard.force_logout();
        false
    }

    /// Refreshes the user record from the "who am I" endpoint.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] without a stored token. An
    /// authorization rejection (401/403) has already forced a logout by the
    /// time the error surfaces. An incomplete user record is an
    /// [`AuthError::InvalidResponse`].
    pub fn refresh_user_info(&self) -> Result<User, AuthError> {
        if self.guard.vault().token().is_none() {
            return Err(AuthError::NotAuthenticated);
        }

        let user: User = self.client.get_json(WHO_AM_I_PATH, &[])?;
        if !user.is_complete() {
            return Err(AuthError::InvalidResponse(
                "who-am-i response missing user id".to_string(),
            ));
        }

        if let Err(error) = self.guard.vault().set_cached_user(&user) {
            log::warn!("cached user persistence failed: {error}");
        }
        self.guard.state().replace(Some(user.clone()));
        Ok(user)
    }

    /// Returns the cached user when complete, otherwise refreshes it.
    ///
    /// # Errors
    /// Propagates [`Self::refresh_user_info`] failures.
    pub fn authenticated_user(&self) -> Result<User, AuthError> {
        if let Some(user) = self.guard.vault().cached_user()
            && user.is_complete()
        {
            return Ok(user);
        }
        self.refresh_user_info()
    }

    fn complete_login(&self, response: LoginResponse) -> Result<LoginOutcome, AuthError> {
        let Some(token) = response.token.filter(|token| !token.trim().is_empty()) else {
            return Err(AuthError::InvalidResponse(
                "login response missing token".to_string(),
            ));
        };

        if let Some(user) = response.user.filter(User::is_complete) {
            self.guard.establish(&token, &user);
            return Ok(LoginOutcome::Established(user));
        }

        // Token without a usable user: persist the token, then resolve the
        // profile in a well-defined follow-up rather than racing the caller.
        if let Err(error) = self.guard.vault().set_token(&token) {
            log::warn!("token persistence failed: {error}");
        }
        match self.refresh_user_info() {
            Ok(user) => Ok(LoginOutcome::Established(user)),
            Err(error) if is_auth_rejection(&error) => Err(error),
            Err(error) => {
                log::warn!("profile refresh after login failed: {error}");
                Ok(LoginOutcome::ProfilePending)
            }
        }
    }
}

fn is_auth_rejection(error: &AuthError) -> bool {
    matches!(
        error,
        AuthError::Api(ApiError::Status {
            status: 401 | 403,
            ..
        }) | AuthError::NotAuthenticated
    )
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Authentication layer error type.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Backend rejected the supplied credentials.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    /// Demo login is not available, with the backend-derived reason.
    #[error("demo login unavailable: {0}")]
    DemoUnavailable(String),
    /// Token does not have the expected JWT shape.
    #[error("malformed token: {0}")]
    MalformedToken(String),
    /// Operation requires an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,
    /// Response payload violated the auth contract.
    #[error("invalid auth response: {0}")]
    InvalidResponse(String),
    /// Underlying API failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for claim decoding and the expiry heuristic.

    use super::*;

    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.signature")
    }

    #[test]
    fn rejects_tokens_without_three_segments() {
        assert!(matches!(
            decode_claims("a.b"),
            Err(AuthError::MalformedToken(_))
        ));
        assert!(matches!(
            decode_claims("a.b.c.d"),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn decodes_exp_claim_from_payload() {
        let token = token_with_payload(r#"{"sub":"7","exp":1700000000}"#);
        let claims = decode_claims(&token).expect("claims should decode");
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(claims.sub.as_deref(), Some("7"));
    }

    #[test]
    fn expiry_heuristic_is_strictly_greater_than_now() {
        let token = token_with_payload(r#"{"exp":1000}"#);
        assert!(token_is_current(&token, 999));
        assert!(!token_is_current(&token, 1000));
        assert!(!token_is_current(&token, 1001));
    }

    #[test]
    fn token_without_exp_counts_as_current() {
        let token = token_with_payload(r#"{"sub":"7"}"#);
        assert!(token_is_current(&token, u64::MAX));
    }

    #[test]
    fn garbled_payload_is_malformed() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let token = format!("{header}.!!not-base64!!.sig");
        assert!(!token_is_current(&token, 0));
    }
}
