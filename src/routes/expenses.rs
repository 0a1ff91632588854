// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Expense routes.
//!
//! The caller identifies the user by email on every request.

use crate::error::{AppError, Result};
use crate::models::{AddExpenseRequest, ExpenseEntry};
use crate::services::LedgerUser;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/expenses", get(list_expenses).post(add_expense))
        .route("/api/splitwise/user", get(splitwise_user))
}

#[derive(Deserialize)]
struct EmailQuery {
    #[serde(default)]
    email: Option<String>,
}

impl EmailQuery {
    fn email(&self) -> Result<&str> {
        self.email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::invalid("email", "query parameter is required"))
    }
}

/// Response for a stored expense.
#[derive(Serialize)]
pub struct AddExpenseResponse {
    pub message: String,
    pub id: String,
    pub expense: ExpenseEntry,
}

async fn add_expense(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AddExpenseRequest>, JsonRejection>,
) -> Result<Json<AddExpenseResponse>> {
    let Json(request) = payload.map_err(|e| AppError::invalid("body", e.body_text()))?;

    let expense = state.reconciliation.add_expense(request).await?;

    Ok(Json(AddExpenseResponse {
        message: "Expense added successfully".to_string(),
        id: expense.id.clone(),
        expense: expense.into(),
    }))
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Vec<ExpenseEntry>>> {
    let entries = state.reconciliation.list_expenses(query.email()?).await?;
    Ok(Json(entries))
}

async fn splitwise_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<LedgerUser>> {
    let user = state
        .reconciliation
        .ledger_user_details(query.email()?)
        .await?;
    Ok(Json(user))
}
