//! Integration tests for the local token-validity check and its logout
//! side effects.

mod common;

#[test]
fn token_validation_tests_missing_token_reads_anonymous() {
    let (context, transport, navigator) = common::harness(vec![]);

    assert!(!context.auth.is_authenticated(1_000));
    assert!(transport.requests().is_empty());
    assert!(navigator.redirects().is_empty());
}

#[test]
fn token_validation_tests_two_segment_token_forces_logout() {
    let (context, transport, _navigator) = common::harness(vec![]);
    context.vault.set_token("a.b").expect("set should work");

    assert!(!context.auth.is_authenticated(1_000));
    assert!(context.vault.token().is_none());
    assert!(context.state.current().is_none());
    // Validation is purely local.
    assert!(transport.requests().is_empty());
}

#[test]
fn token_validation_tests_expired_token_forces_logout() {
    let (context, _transport, _navigator) = common::harness(vec![]);
    let token = common::forge_token(r#"{"sub":"7","exp":990}"#);
    context.vault.set_token(&token).expect("set should work");

    assert!(!context.auth.is_authenticated(1_000));
    assert!(context.vault.token().is_none());
    assert!(context.vault.cached_user().is_none());
}

#[test]
fn token_validation_tests_future_expiry_counts_as_authenticated() {
    let (context, _transport, _navigator) = common::harness(vec![]);
    let token = common::forge_token(r#"{"sub":"7","exp":2000}"#);
    context.vault.set_token(&token).expect("set should work");

    assert!(context.auth.is_authenticated(1_000));
    assert_eq!(context.vault.token().as_deref(), Some(token.as_str()));
}

#[test]
fn token_validation_tests_token_without_exp_is_trusted_locally() {
    let (context, _transport, _navigator) = common::harness(vec![]);
    let token = common::forge_token(r#"{"sub":"7"}"#);
    context.vault.set_token(&token).expect("set should work");

    assert!(context.auth.is_authenticated(u64::MAX));
}
