//! Integration tests for the headless session-status projection.

mod common;

use std::sync::Arc;

use finsight_app::session_status;
use finsight_store::{KeyValueStore, MemoryStore, SessionVault};

fn vault() -> SessionVault {
    SessionVault::new(Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>)
}

#[test]
fn session_status_tests_reads_anonymous_without_a_token() {
    assert_eq!(session_status(&vault(), 1_000), "anonymous");
}

#[test]
fn session_status_tests_reads_authenticated_for_current_token() {
    let vault = vault();
    let token = common::forge_token(r#"{"sub":"7","exp":2000}"#);
    vault.set_token(&token).expect("set should work");
    assert_eq!(session_status(&vault, 1_000), "authenticated");
}

#[test]
fn session_status_tests_reads_expired_for_stale_or_malformed_tokens() {
    let vault = vault();
    let token = common::forge_token(r#"{"sub":"7","exp":900}"#);
    vault.set_token(&token).expect("set should work");
    assert_eq!(session_status(&vault, 1_000), "expired");

    vault.set_token("a.b").expect("set should work");
    assert_eq!(session_status(&vault, 1_000), "expired");
}
