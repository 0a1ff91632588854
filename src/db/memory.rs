// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store, one record per user.
//!
//! Every mutation runs under the DashMap entry lock for that user, so an
//! append and a credential write for the same user never lose each other.

use dashmap::DashMap;

use super::{CredentialStore, ExpenseStore};
use crate::error::AppError;
use crate::models::{Credential, ExpenseRecord, UserRecord};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, UserRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with any stored state.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait::async_trait]
impl ExpenseStore for MemoryStore {
    async fn append(&self, record: &ExpenseRecord) -> Result<(), AppError> {
        self.users
            .entry(record.user_id.clone())
            .or_default()
            .expenses
            .push(record.clone());
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ExpenseRecord>, AppError> {
        Ok(self
            .users
            .get(user_id)
            .map(|user| user.expenses.clone())
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<Option<Credential>, AppError> {
        Ok(self
            .users
            .get(user_id)
            .and_then(|user| user.credential.clone()))
    }

    async fn put(&self, user_id: &str, credential: &Credential) -> Result<(), AppError> {
        self.users.entry(user_id.to_string()).or_default().credential = Some(credential.clone());
        Ok(())
    }
}
