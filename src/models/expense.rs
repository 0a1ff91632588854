// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Expense models for storage and API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Title of the computed entry that carries the Splitwise balance.
pub const EXTERNAL_BALANCE_TITLE: &str = "Splitwise";
/// Category of the computed entry that carries the Splitwise balance.
pub const EXTERNAL_BALANCE_CATEGORY: &str = "others";

/// A stored expense. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Generated identifier (UUID v4), also the Firestore document ID
    pub id: String,
    /// Owning user (email address)
    pub user_id: String,
    pub title: String,
    /// Always positive. Stored as a decimal string so no precision is lost.
    pub amount: Decimal,
    pub category: String,
    /// Insertion timestamp (RFC 3339, microsecond precision)
    pub created_at: String,
}

/// Raw add-expense body. Fields stay optional so validation can name the
/// missing one instead of failing JSON extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddExpenseRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Number or numeric string
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub category: Option<String>,
}

/// One line of the merged expense view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    /// Absent on the synthetic balance entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    /// JSON number on the wire
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: String,
}

impl ExpenseEntry {
    /// Synthetic entry summarising the user's Splitwise balance.
    pub fn external_balance(amount: Decimal) -> Self {
        Self {
            id: None,
            title: EXTERNAL_BALANCE_TITLE.to_string(),
            amount,
            category: EXTERNAL_BALANCE_CATEGORY.to_string(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.id.is_none()
    }
}

impl From<ExpenseRecord> for ExpenseEntry {
    fn from(record: ExpenseRecord) -> Self {
        Self {
            id: Some(record.id),
            title: record.title,
            amount: record.amount,
            category: record.category,
        }
    }
}
