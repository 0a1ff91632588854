//! Storage layer: expense and credential stores.
//!
//! Both stores are traits so the reconciliation service can be built over
//! Firestore in production and over [`MemoryStore`] in tests or local runs.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Credential, ExpenseRecord};

/// Collection names as constants.
pub mod collections {
    /// One document per expense, keyed by expense id
    pub const EXPENSES: &str = "expenses";
    /// One document per user, keyed by user id
    pub const CREDENTIALS: &str = "credentials";
}

/// Durable, per-user, insertion-ordered expense collection.
#[async_trait::async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Append `record` to its owner's collection, creating the user if absent.
    async fn append(&self, record: &ExpenseRecord) -> Result<(), AppError>;

    /// The user's expenses in insertion order; empty for unknown users.
    async fn list(&self, user_id: &str) -> Result<Vec<ExpenseRecord>, AppError>;
}

/// Durable per-user credential slot.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Credential>, AppError>;

    /// Replace the user's credential (upsert, last write wins).
    async fn put(&self, user_id: &str, credential: &Credential) -> Result<(), AppError>;
}
