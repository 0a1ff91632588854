// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Splitwise API client.
//!
//! Handles:
//! - Net balance across all friends (`get_friends`)
//! - Current user profile (`get_current_user`)
//! - Rejected-token detection (401), reported but never acted on here

use crate::error::AppError;
use crate::models::money::parse_amount;
use crate::models::Credential;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Read access to the user's Splitwise account.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    /// Signed sum of every friend balance: positive means the user is owed.
    async fn fetch_balance(&self, credential: &Credential) -> Result<Decimal, AppError>;

    async fn current_user(&self, credential: &Credential) -> Result<LedgerUser, AppError>;
}

/// Splitwise API client.
#[derive(Clone)]
pub struct SplitwiseClient {
    http: reqwest::Client,
    base_url: String,
}

impl SplitwiseClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building Splitwise HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// List friends with their per-currency balances.
    pub async fn get_friends(&self, access_token: &str) -> Result<Vec<Friend>, AppError> {
        let url = format!("{}/get_friends", self.base_url);
        let response: FriendsResponse = self.get_json(&url, access_token).await?;
        Ok(response.friends)
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Splitwise request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::LedgerApi(
                    AppError::LEDGER_TOKEN_REJECTED.to_string(),
                ));
            }

            return Err(AppError::LedgerApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("Splitwise JSON parse error: {}", e)))
    }
}

#[async_trait::async_trait]
impl LedgerClient for SplitwiseClient {
    async fn fetch_balance(&self, credential: &Credential) -> Result<Decimal, AppError> {
        let friends = self.get_friends(&credential.access_token).await?;
        net_balance(&friends).ok_or_else(|| {
            AppError::MalformedResponse("Splitwise balance total overflowed".to_string())
        })
    }

    async fn current_user(&self, credential: &Credential) -> Result<LedgerUser, AppError> {
        let url = format!("{}/get_current_user", self.base_url);
        let response: CurrentUserResponse = self.get_json(&url, &credential.access_token).await?;
        Ok(response.user)
    }
}

/// Sum every balance entry of every friend.
///
/// Entries whose amount is missing or non-numeric are skipped; one bad
/// entry does not void the rest of the total. `None` if the total does not
/// fit in a `Decimal`.
pub fn net_balance(friends: &[Friend]) -> Option<Decimal> {
    let mut total = Decimal::ZERO;

    for friend in friends {
        for entry in &friend.balance {
            match entry.amount.as_ref().and_then(parse_amount) {
                Some(amount) => match total.checked_add(amount) {
                    Some(sum) => total = sum,
                    None => {
                        tracing::warn!(
                            friend_id = ?friend.id,
                            "Splitwise balance total overflowed"
                        );
                        return None;
                    }
                },
                None => {
                    tracing::warn!(
                        friend_id = ?friend.id,
                        amount = ?entry.amount,
                        "Skipping malformed Splitwise balance entry"
                    );
                }
            }
        }
    }

    Some(total)
}

#[derive(Debug, Clone, Deserialize)]
struct FriendsResponse {
    #[serde(default)]
    friends: Vec<Friend>,
}

/// A Splitwise friend (counterparty).
#[derive(Debug, Clone, Deserialize)]
pub struct Friend {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub balance: Vec<BalanceEntry>,
}

/// One per-currency balance with a friend.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceEntry {
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Signed decimal, usually a string such as `"-5.00"`
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct CurrentUserResponse {
    user: LedgerUser,
}

/// Splitwise profile of the connected user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerUser {
    pub id: u64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub default_currency: Option<String>,
}
