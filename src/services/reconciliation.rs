// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciliation service: expenses, credentials and the merged view.
//!
//! This is the only place that combines the stores, the OAuth clients and
//! the Splitwise client. All collaborators are injected, so tests can swap
//! any of them.
//!
//! Nothing here retries. Two authorization completions racing for the same
//! user both write their credential and the later write wins; re-authorizing
//! is a human-paced action, so no lock is taken.

use crate::db::{CredentialStore, ExpenseStore};
use crate::error::AppError;
use crate::models::money::parse_amount;
use crate::models::{AddExpenseRequest, Credential, ExpenseEntry, ExpenseRecord};
use crate::services::oauth::{OAuthClient, TokenResponse};
use crate::services::oauth_session::{OAuthFlow, OAuthSessionStore, PendingSession};
use crate::services::splitwise::{LedgerClient, LedgerUser};
use crate::time_utils::{format_utc_rfc3339, format_utc_rfc3339_micros};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Authorization URL and the state the provider must echo back.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationStart {
    pub url: String,
    pub state: String,
}

/// Tokens handed back to the client after app sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SignInTokens {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

pub struct ReconciliationService {
    expenses: Arc<dyn ExpenseStore>,
    credentials: Arc<dyn CredentialStore>,
    ledger: Arc<dyn LedgerClient>,
    ledger_oauth: OAuthClient,
    identity_oauth: OAuthClient,
    sessions: OAuthSessionStore,
    balance_timeout: Duration,
}

impl ReconciliationService {
    pub fn new(
        expenses: Arc<dyn ExpenseStore>,
        credentials: Arc<dyn CredentialStore>,
        ledger: Arc<dyn LedgerClient>,
        ledger_oauth: OAuthClient,
        identity_oauth: OAuthClient,
        session_ttl: Duration,
        balance_timeout: Duration,
    ) -> Self {
        Self {
            expenses,
            credentials,
            ledger,
            ledger_oauth,
            identity_oauth,
            sessions: OAuthSessionStore::new(session_ttl),
            balance_timeout,
        }
    }

    pub fn sessions(&self) -> &OAuthSessionStore {
        &self.sessions
    }

    // ─── Expenses ─────────────────────────────────────────────────

    /// Validate and store an expense. Nothing is written on failure.
    pub async fn add_expense(&self, request: AddExpenseRequest) -> Result<ExpenseRecord, AppError> {
        let user_id = validate_user_id(request.email.as_deref())?;
        let title = required_text("title", request.title.as_deref())?;
        let category = required_text("category", request.category.as_deref())?;
        let amount = validate_amount(request.amount.as_ref())?;

        let record = ExpenseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            title,
            amount,
            category,
            created_at: format_utc_rfc3339_micros(chrono::Utc::now()),
        };

        self.expenses.append(&record).await?;

        tracing::info!(
            user_id = %record.user_id,
            expense_id = %record.id,
            "Expense added"
        );

        Ok(record)
    }

    /// Stored expenses, plus one Splitwise balance entry when the user has a
    /// credential and the balance could be fetched in time.
    ///
    /// Balance failures are logged and dropped: the user's own expenses are
    /// returned regardless of Splitwise's health.
    pub async fn list_expenses(&self, user_id: &str) -> Result<Vec<ExpenseEntry>, AppError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::invalid("email", "is required"));
        }

        let (records, credential) =
            tokio::try_join!(self.expenses.list(user_id), self.credentials.get(user_id))?;

        let mut entries: Vec<ExpenseEntry> = records.into_iter().map(ExpenseEntry::from).collect();

        if let Some(credential) = credential {
            if let Some(balance) = self.fetch_balance_bounded(user_id, &credential).await {
                entries.push(ExpenseEntry::external_balance(balance));
            }
        }

        Ok(entries)
    }

    async fn fetch_balance_bounded(&self, user_id: &str, credential: &Credential) -> Option<Decimal> {
        match tokio::time::timeout(self.balance_timeout, self.ledger.fetch_balance(credential)).await
        {
            Ok(Ok(balance)) => Some(balance),
            Ok(Err(e)) if e.is_ledger_token_rejected() => {
                tracing::warn!(
                    user_id,
                    "Splitwise rejected stored credential; user must re-authorize"
                );
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(user_id, error = %e, "Splitwise balance unavailable");
                None
            }
            Err(_) => {
                tracing::warn!(
                    user_id,
                    timeout_ms = self.balance_timeout.as_millis() as u64,
                    "Splitwise balance fetch timed out"
                );
                None
            }
        }
    }

    // ─── Splitwise Authorization ──────────────────────────────────

    /// Start Splitwise authorization and remember the issued state.
    pub fn begin_authorization(&self, redirect_uri: &str) -> Result<AuthorizationStart, AppError> {
        self.begin(OAuthFlow::Ledger, &self.ledger_oauth, redirect_uri)
    }

    /// Finish Splitwise authorization: check state, exchange the code,
    /// store the credential, return the access token.
    ///
    /// The state is checked before any network call and no credential is
    /// written unless the exchange succeeds.
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
        user_id: &str,
    ) -> Result<String, AppError> {
        let code = required_text("code", Some(code))?;
        let user_id = validate_user_id(Some(user_id))?;
        let session = self.sessions.consume(state, OAuthFlow::Ledger)?;

        let token = self
            .ledger_oauth
            .exchange_code(&code, &session.redirect_uri, None)
            .await?;

        let credential = credential_from_token(&token);
        self.credentials.put(&user_id, &credential).await?;

        tracing::info!(user_id = %user_id, "Splitwise credential stored");
        Ok(token.access_token)
    }

    /// Splitwise profile for the user's stored credential.
    pub async fn ledger_user_details(&self, user_id: &str) -> Result<LedgerUser, AppError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::invalid("email", "is required"));
        }

        let credential = self
            .credentials
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Splitwise connection for {}", user_id)))?;

        self.ledger.current_user(&credential).await
    }

    // ─── App Sign-In (PKCE) ───────────────────────────────────────

    pub fn begin_sign_in(&self, redirect_uri: &str) -> Result<AuthorizationStart, AppError> {
        self.begin(OAuthFlow::Identity, &self.identity_oauth, redirect_uri)
    }

    pub async fn complete_sign_in(&self, code: &str, state: &str) -> Result<SignInTokens, AppError> {
        let code = required_text("code", Some(code))?;
        let session = self.sessions.consume(state, OAuthFlow::Identity)?;

        let token = self
            .identity_oauth
            .exchange_code(
                &code,
                &session.redirect_uri,
                session.code_verifier.as_deref(),
            )
            .await?;

        tracing::info!("Identity provider sign-in completed");

        Ok(SignInTokens {
            access_token: token.access_token,
            id_token: token.id_token,
            expires_in: token.expires_in,
        })
    }

    fn begin(
        &self,
        flow: OAuthFlow,
        client: &OAuthClient,
        redirect_uri: &str,
    ) -> Result<AuthorizationStart, AppError> {
        let redirect_uri = required_text("redirect_uri", Some(redirect_uri))?;

        let request = client.build_authorization_request(&redirect_uri)?;
        self.sessions.insert(
            request.state.clone(),
            PendingSession::new(flow, redirect_uri, request.code_verifier),
        )?;

        tracing::info!(
            provider = %client.provider().name,
            "Authorization started"
        );

        Ok(AuthorizationStart {
            url: request.url,
            state: request.state,
        })
    }
}

fn credential_from_token(token: &TokenResponse) -> Credential {
    let now = chrono::Utc::now();
    Credential {
        access_token: token.access_token.clone(),
        token_type: token.token_type.clone(),
        refresh_token: token.refresh_token.clone(),
        // Out-of-range lifetimes are recorded as unknown expiry.
        expires_at: token
            .expires_in
            .and_then(chrono::Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .map(format_utc_rfc3339),
        obtained_at: format_utc_rfc3339(now),
    }
}

fn required_text(field: &'static str, value: Option<&str>) -> Result<String, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::invalid(field, "is required")),
    }
}

/// Syntactic check only: present and contains `@`.
fn validate_user_id(value: Option<&str>) -> Result<String, AppError> {
    let email = required_text("email", value)?;
    if !email.contains('@') {
        return Err(AppError::invalid("email", "must be an email address"));
    }
    Ok(email)
}

fn validate_amount(value: Option<&serde_json::Value>) -> Result<Decimal, AppError> {
    let value = match value {
        Some(serde_json::Value::Null) | None => {
            return Err(AppError::invalid("amount", "is required"))
        }
        Some(v) => v,
    };

    let amount =
        parse_amount(value).ok_or_else(|| AppError::invalid("amount", "must be a number"))?;

    if amount <= Decimal::ZERO {
        return Err(AppError::invalid("amount", "must be greater than 0"));
    }

    Ok(amount)
}
