// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Request;
use expense_ledger::config::Config;
use expense_ledger::db::{FirestoreDb, MemoryStore};
use expense_ledger::error::AppError;
use expense_ledger::models::Credential;
use expense_ledger::routes::create_router;
use expense_ledger::services::{LedgerClient, LedgerUser, SplitwiseClient};
use expense_ledger::AppState;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Config whose Splitwise and identity-provider URLs all point at `base`
/// (typically a wiremock server).
#[allow(dead_code)]
pub fn config_for(base: &str) -> Config {
    Config {
        splitwise_authorize_url: format!("{}/oauth/authorize", base),
        splitwise_token_url: format!("{}/oauth/token", base),
        splitwise_api_url: format!("{}/api/v3.0", base),
        idp_authorize_url: format!("{}/idp/authorize", base),
        idp_token_url: format!("{}/idp/token", base),
        ..Config::test_default()
    }
}

/// A wired-up app over an in-memory store.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
}

/// Test app using the real Splitwise client against `config`'s API URL.
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let ledger = Arc::new(SplitwiseClient::new(config.splitwise_api_url.clone()).unwrap());
    create_test_app_with_ledger(config, ledger)
}

/// Test app with offline defaults (nothing listens on the provider URLs).
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_ledger(config: Config, ledger: Arc<dyn LedgerClient>) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(
        AppState::new(config, store.clone(), store.clone(), ledger)
            .expect("Failed to build app state"),
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
    }
}

#[allow(dead_code)]
pub fn test_credential(token: &str) -> Credential {
    Credential {
        access_token: token.to_string(),
        token_type: Some("bearer".to_string()),
        refresh_token: None,
        expires_at: None,
        obtained_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

/// Send a GET through the router and decode the JSON response.
#[allow(dead_code)]
pub async fn get_json(router: &axum::Router, uri: &str) -> (axum::http::StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

/// POST a JSON body through the router and decode the JSON response.
#[allow(dead_code)]
pub async fn post_json(
    router: &axum::Router,
    uri: &str,
    body: &serde_json::Value,
) -> (axum::http::StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

#[allow(dead_code)]
pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

/// Scripted ledger client for tests that don't need HTTP.
#[allow(dead_code)]
pub struct StubLedger {
    balance: Option<Decimal>,
    delay: Duration,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubLedger {
    pub fn returning(balance: Decimal) -> Self {
        Self {
            balance: Some(balance),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            balance: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LedgerClient for StubLedger {
    async fn fetch_balance(&self, _credential: &Credential) -> Result<Decimal, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.balance
            .ok_or_else(|| AppError::LedgerApi("HTTP 503 Service Unavailable".to_string()))
    }

    async fn current_user(&self, _credential: &Credential) -> Result<LedgerUser, AppError> {
        Err(AppError::LedgerApi("not scripted".to_string()))
    }
}
