//! Integration tests for bearer-header injection and centralized 401/403
//! recovery.

mod common;

use std::sync::Arc;

use finsight_http::{
    ApiClient, ApiError, ApiResponse, HttpTransport, Navigator, RetryPolicy,
    SESSION_EXPIRED_MESSAGE, SessionGate,
};
use serde_json::Value;

fn client(
    script: Vec<Result<ApiResponse, ApiError>>,
    gate: Arc<common::CountingGate>,
    retry: RetryPolicy,
) -> (
    ApiClient,
    Arc<common::ScriptedTransport>,
    Arc<common::RecordingNavigator>,
) {
    let transport = common::ScriptedTransport::new(script);
    let navigator = Arc::new(common::RecordingNavigator::default());
    let client = ApiClient::new(
        "https://api.finsight.test",
        Arc::clone(&transport) as Arc<dyn HttpTransport>,
        gate as Arc<dyn SessionGate>,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
        retry,
    )
    .expect("client should build");
    (client, transport, navigator)
}

#[test]
fn request_authorizer_tests_attaches_bearer_header_when_token_present() {
    let gate = common::CountingGate::with_token("tok");
    let (client, transport, _navigator) = client(
        vec![common::response(200, "[]")],
        gate,
        RetryPolicy::none(),
    );

    let _: Value = client
        .get_json("/api/accounts", &[])
        .expect("request should succeed");

    let request = &transport.requests()[0];
    assert!(
        request
            .headers
            .iter()
            .any(|(name, value)| name == "Authorization" && value == "Bearer tok")
    );
}

#[test]
fn request_authorizer_tests_sends_anonymous_requests_unmodified() {
    let (client, transport, _navigator) = client(
        vec![common::response(200, "[]")],
        common::CountingGate::anonymous(),
        RetryPolicy::none(),
    );

    let _: Value = client
        .get_json("/api/accounts", &[])
        .expect("request should succeed");

    let request = &transport.requests()[0];
    assert!(
        request
            .headers
            .iter()
            .all(|(name, _)| name != "Authorization")
    );
}

#[test]
fn request_authorizer_tests_rejection_triggers_single_logout_and_redirect() {
    let gate = common::CountingGate::with_token("tok");
    let (client, transport, navigator) = client(
        vec![common::response(401, r#"{"message":"expired"}"#)],
        Arc::clone(&gate),
        // A generous retry budget must not matter: rejections are permanent.
        RetryPolicy {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
            jitter_ms: 0,
        },
    );

    let error = client
        .get_json::<Value>("/api/accounts", &[])
        .expect_err("rejection should surface to the caller");
    match error {
        ApiError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "expired");
        }
        other => panic!("expected a status error, got {other:?}"),
    }

    assert_eq!(gate.logouts(), 1);
    let redirects = navigator.redirects();
    assert_eq!(redirects.len(), 1);
    assert_eq!(redirects[0].message, SESSION_EXPIRED_MESSAGE);
    assert!(redirects[0].return_url.contains("/api/accounts"));
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn request_authorizer_tests_forbidden_behaves_like_unauthorized() {
    let gate = common::CountingGate::with_token("tok");
    let (client, _transport, navigator) = client(
        vec![common::response(403, "{}")],
        Arc::clone(&gate),
        RetryPolicy::none(),
    );

    let error = client
        .get_json::<Value>("/api/budgets", &[])
        .expect_err("rejection should surface");
    assert!(matches!(error, ApiError::Status { status: 403, .. }));
    assert_eq!(gate.logouts(), 1);
    assert_eq!(navigator.redirects().len(), 1);
}

#[test]
fn request_authorizer_tests_server_errors_leave_the_session_alone() {
    let gate = common::CountingGate::with_token("tok");
    let (client, _transport, navigator) = client(
        vec![common::response(500, "")],
        Arc::clone(&gate),
        RetryPolicy::none(),
    );

    let error = client
        .get_json::<Value>("/api/accounts", &[])
        .expect_err("server error should surface");
    assert!(matches!(error, ApiError::Status { status: 500, .. }));
    assert_eq!(gate.logouts(), 0);
    assert!(navigator.redirects().is_empty());
}

#[test]
fn request_authorizer_tests_resolves_paths_against_the_base_url() {
    let (client, transport, _navigator) = client(
        vec![common::response(200, "[]")],
        common::CountingGate::anonymous(),
        RetryPolicy::none(),
    );

    let _: Value = client
        .get_json("/api/bills", &[("userId", "7".to_string())])
        .expect("request should succeed");

    assert_eq!(
        transport.requests()[0].url,
        "https://api.finsight.test/api/bills?userId=7"
    );
}
