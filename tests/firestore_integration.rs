// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore store tests. Run against the emulator:
//!
//! FIRESTORE_EMULATOR_HOST=localhost:8080 cargo test --test firestore_integration

use expense_ledger::db::{CredentialStore, ExpenseStore};
use expense_ledger::models::ExpenseRecord;
use rust_decimal::Decimal;

mod common;

/// Unique user id per test run so reruns against a live emulator stay isolated.
fn unique_user() -> String {
    format!("{}@example.com", uuid::Uuid::new_v4())
}

fn record(user_id: &str, title: &str, created_at: &str) -> ExpenseRecord {
    ExpenseRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: title.to_string(),
        amount: Decimal::new(1250, 2),
        category: "food".to_string(),
        created_at: created_at.to_string(),
    }
}

#[tokio::test]
async fn test_expenses_round_trip_in_order() {
    require_emulator!();
    let db = common::test_db().await;
    let user = unique_user();

    db.append(&record(&user, "first", "2026-01-01T00:00:00.000001Z"))
        .await
        .unwrap();
    db.append(&record(&user, "second", "2026-01-01T00:00:00.000002Z"))
        .await
        .unwrap();
    db.append(&record(&unique_user(), "someone else", "2026-01-01T00:00:00.000003Z"))
        .await
        .unwrap();

    let listed = db.list(&user).await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second"]);
    assert_eq!(listed[0].amount, Decimal::new(1250, 2));
}

#[tokio::test]
async fn test_same_timestamp_orders_by_id() {
    require_emulator!();
    let db = common::test_db().await;
    let user = unique_user();
    let created_at = "2026-01-01T00:00:00.000001Z";

    let mut later = record(&user, "later", created_at);
    later.id = format!("b-{}", later.id);
    let mut earlier = record(&user, "earlier", created_at);
    earlier.id = format!("a-{}", earlier.id);

    db.append(&later).await.unwrap();
    db.append(&earlier).await.unwrap();

    let titles: Vec<String> = db
        .list(&user)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["earlier", "later"]);
}

#[tokio::test]
async fn test_unknown_user_lists_empty() {
    require_emulator!();
    let db = common::test_db().await;

    assert!(db.list(&unique_user()).await.unwrap().is_empty());
    assert!(db.get(&unique_user()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_credential_put_replaces() {
    require_emulator!();
    let db = common::test_db().await;
    let user = unique_user();

    db.put(&user, &common::test_credential("old")).await.unwrap();
    db.put(&user, &common::test_credential("new")).await.unwrap();

    let stored = db.get(&user).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "new");
}

#[tokio::test]
async fn test_credential_and_expenses_are_independent() {
    require_emulator!();
    let db = common::test_db().await;
    let user = unique_user();

    let rec = record(&user, "lunch", "2026-01-02T00:00:00.000000Z");
    let cred = common::test_credential("tok");
    let (appended, stored) = tokio::join!(db.append(&rec), db.put(&user, &cred),);
    appended.unwrap();
    stored.unwrap();

    assert_eq!(db.list(&user).await.unwrap().len(), 1);
    assert_eq!(db.get(&user).await.unwrap().unwrap().access_token, "tok");
}
