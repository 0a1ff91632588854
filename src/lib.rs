// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Expense-Ledger: personal expenses merged with a live Splitwise balance
//!
//! This crate provides the backend API for recording expenses, connecting
//! a Splitwise account over OAuth2, and signing users in through an
//! identity provider with PKCE.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{CredentialStore, ExpenseStore};
use services::{LedgerClient, OAuthClient, ReconciliationService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub reconciliation: ReconciliationService,
}

impl AppState {
    /// Wire the reconciliation service from its collaborators.
    pub fn new(
        config: Config,
        expenses: Arc<dyn ExpenseStore>,
        credentials: Arc<dyn CredentialStore>,
        ledger: Arc<dyn LedgerClient>,
    ) -> anyhow::Result<Self> {
        let reconciliation = ReconciliationService::new(
            expenses,
            credentials,
            ledger,
            OAuthClient::new(config.ledger_provider())?,
            OAuthClient::new(config.identity_provider())?,
            config.oauth_session_ttl,
            config.balance_fetch_timeout,
        );

        Ok(Self {
            config,
            reconciliation,
        })
    }
}
