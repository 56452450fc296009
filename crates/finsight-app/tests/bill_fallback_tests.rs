//! Integration tests for the bill list fallback chain and speculative cache.

mod common;

use finsight_core::Bill;
use finsight_http::ApiError;

fn bill(id: u64, name: &str) -> Bill {
    Bill {
        id,
        name: name.to_string(),
        amount: 25.0,
        due_day: 15,
        is_paid: false,
        is_recurring: true,
        user_id: Some(7),
        category_id: None,
    }
}

fn bill_json(id: u64, name: &str) -> String {
    format!(r#"{{"id":{id},"name":"{name}","amount":25.0,"dueDay":15}}"#)
}

#[test]
fn bill_fallback_tests_primary_list_merges_with_cache() {
    let body = format!("[{},{}]", bill_json(1, "server-rent"), bill_json(2, "gas"));
    let (context, transport, _navigator) = common::harness(vec![common::response(200, &body)]);
    context.bills.cache().insert(bill(1, "cached-rent"));
    context.bills.cache().insert(bill(3, "water"));

    let bills = context.bills.user_bills(7).expect("list should succeed");

    let names: Vec<&str> = bills.iter().map(|bill| bill.name.as_str()).collect();
    assert_eq!(names, vec!["server-rent", "gas", "water"]);
    assert!(transport.requests()[0].url.ends_with("/api/bills/user/7"));
}

#[test]
fn bill_fallback_tests_secondary_endpoint_covers_undecodable_primary() {
    let (context, transport, _navigator) = common::harness(vec![
        common::response(200, "<html>service listing</html>"),
        common::response(200, &format!("[{}]", bill_json(4, "internet"))),
    ]);

    let bills = context.bills.user_bills(7).expect("fallback should succeed");

    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].name, "internet");
    let requests = transport.requests();
    assert!(requests[0].url.ends_with("/api/bills/user/7"));
    assert!(requests[1].url.ends_with("/api/bills?userId=7"));
}

#[test]
fn bill_fallback_tests_reconstructs_per_id_when_both_lists_fail() {
    let (context, transport, _navigator) = common::harness(vec![
        common::response(200, "<html>"),
        common::response(200, "<html>"),
        common::response(200, &bill_json(1, "rent-refreshed")),
        Err(ApiError::Offline("connection refused".to_string())),
    ]);
    context.bills.cache().insert(bill(1, "rent-stale"));
    context.bills.cache().insert(bill(2, "gas"));

    let bills = context
        .bills
        .user_bills(7)
        .expect("reconstruction should degrade, not fail");

    let names: Vec<&str> = bills.iter().map(|bill| bill.name.as_str()).collect();
    // Bill 1 was refreshed per id; bill 2 kept its cached copy.
    assert_eq!(names, vec!["rent-refreshed", "gas"]);
    let requests = transport.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests[2].url.ends_with("/api/bills/1"));
    assert!(requests[3].url.ends_with("/api/bills/2"));
}

#[test]
fn bill_fallback_tests_non_decoding_failures_propagate() {
    let (context, transport, _navigator) = common::harness(vec![common::response(500, "")]);
    context.bills.cache().insert(bill(1, "rent"));

    let error = context
        .bills
        .user_bills(7)
        .expect_err("server failure should not trigger the fallback");
    assert!(matches!(error, ApiError::Status { status: 500, .. }));
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn bill_fallback_tests_create_caches_the_created_bill() {
    let (context, transport, _navigator) =
        common::harness(vec![common::response(200, &bill_json(9, "electric"))]);

    let created = context
        .bills
        .create(&bill(9, "electric"), 7)
        .expect("create should succeed");

    assert_eq!(created.id, 9);
    assert_eq!(context.bills.cache().ids(), vec![9]);
    assert!(transport.requests()[0].url.contains("userId=7"));
}

#[test]
fn bill_fallback_tests_delete_evicts_the_cached_copy() {
    let (context, _transport, _navigator) = common::harness(vec![common::response(200, "")]);
    context.bills.cache().insert(bill(9, "electric"));

    context.bills.delete(9).expect("delete should succeed");

    assert!(context.bills.cache().ids().is_empty());
}
