// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Expenses (one document per expense, queried by owner)
//! - Credentials (one document per user, upserted)
//!
//! Appending an expense and replacing a credential touch different
//! documents, and each is a single-document write, so concurrent writes
//! for the same user cannot clobber each other.

use crate::db::{collections, CredentialStore, ExpenseStore};
use crate::error::AppError;
use crate::models::{Credential, ExpenseRecord};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            AppError::StorageUnavailable(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::StorageUnavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client; every operation fails with `StorageUnavailable`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::StorageUnavailable("Database not connected (offline mode)".to_string())
        })
    }
}

/// Firestore document IDs may not contain `/`.
fn credential_doc_id(user_id: &str) -> String {
    urlencoding::encode(user_id).into_owned()
}

#[async_trait::async_trait]
impl ExpenseStore for FirestoreDb {
    async fn append(&self, record: &ExpenseRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::EXPENSES)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;

        tracing::debug!(user_id = %record.user_id, expense_id = %record.id, "Expense stored");
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ExpenseRecord>, AppError> {
        let owner = user_id.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::EXPENSES)
            .filter(move |q| q.for_all([q.field("user_id").eq(owner.clone())]))
            // Appends within the same microsecond fall back to id order.
            .order_by([
                ("created_at", firestore::FirestoreQueryDirection::Ascending),
                ("id", firestore::FirestoreQueryDirection::Ascending),
            ])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }
}

#[async_trait::async_trait]
impl CredentialStore for FirestoreDb {
    async fn get(&self, user_id: &str) -> Result<Option<Credential>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CREDENTIALS)
            .obj()
            .one(&credential_doc_id(user_id))
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }

    async fn put(&self, user_id: &str, credential: &Credential) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CREDENTIALS)
            .document_id(credential_doc_id(user_id))
            .object(credential)
            .execute()
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }
}
