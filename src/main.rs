// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Expense-Ledger API Server
//!
//! Records personal expenses and merges them with the user's live
//! Splitwise balance.

use expense_ledger::{
    config::{Config, StorageBackend},
    db::{CredentialStore, ExpenseStore, FirestoreDb, MemoryStore},
    services::SplitwiseClient,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Expense-Ledger API");

    let (expenses, credentials): (Arc<dyn ExpenseStore>, Arc<dyn CredentialStore>) =
        match config.storage_backend {
            StorageBackend::Firestore => {
                let db = Arc::new(FirestoreDb::new(&config.gcp_project_id).await?);
                let expenses: Arc<dyn ExpenseStore> = db.clone();
                let credentials: Arc<dyn CredentialStore> = db;
                (expenses, credentials)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                let expenses: Arc<dyn ExpenseStore> = store.clone();
                let credentials: Arc<dyn CredentialStore> = store;
                (expenses, credentials)
            }
        };

    let splitwise = Arc::new(SplitwiseClient::new(config.splitwise_api_url.clone())?);
    tracing::info!(api = %config.splitwise_api_url, "Splitwise client initialized");

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        expenses,
        credentials,
        splitwise,
    )?);

    // Build router
    let app = expense_ledger::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("expense_ledger=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
