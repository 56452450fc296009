#![warn(missing_docs)]
//! # finsight-app binary
//!
//! Headless status entry point: prints the build version, resolved
//! configuration, and the persisted session status.

use std::sync::Arc;
use std::time::Duration;

use finsight_app::{
    AppConfig, AppContext, LogNavigator, app_version, now_epoch_seconds, session_status,
};
use finsight_http::ReqwestTransport;
use finsight_store::FileStore;

fn main() {
    let config = AppConfig::from_env();
    let store_path = std::env::var("FINSIGHT_STORE_PATH")
        .unwrap_or_else(|_| "finsight-session.json".to_string());

    println!("finsight-app {}", app_version());
    println!("api_url={} (FINSIGHT_API_URL)", config.api_url);
    println!("session_store={store_path} (FINSIGHT_STORE_PATH)");

    let transport = match ReqwestTransport::new(Duration::from_millis(config.http_timeout_ms)) {
        Ok(transport) => Arc::new(transport),
        Err(error) => {
            eprintln!("failed to construct http transport: {error}");
            std::process::exit(1);
        }
    };

    let store = Arc::new(FileStore::open(store_path));
    let context = match AppContext::bootstrap(&config, store, transport, Arc::new(LogNavigator)) {
        Ok(context) => context,
        Err(error) => {
            eprintln!("failed to bootstrap finsight: {error}");
            std::process::exit(1);
        }
    };

    let status = session_status(&context.vault, now_epoch_seconds());
    println!("session_status={status}");
    if let Some(user) = context.state.current() {
        println!("session_user={} <{}>", user.first_name, user.email);
    }
    println!("demo_mode={}", context.vault.demo_mode());
}
