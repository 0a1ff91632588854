// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth routes: Splitwise connection and identity-provider sign-in.
//!
//! These return JSON. Building the deep link that hands control back to
//! the client app is the client's job.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::{AuthorizationStart, SignInTokens};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/splitwise", get(splitwise_start))
        .route("/auth/splitwise/callback", get(splitwise_callback))
        .route("/auth/login", get(login_start))
        .route("/auth/login/callback", get(login_callback))
}

/// Query parameters for starting an OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Where the provider sends the user back to.
    #[serde(default)]
    redirect_uri: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    /// Required for the Splitwise flow; the credential is stored under it.
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl CallbackParams {
    /// Reject provider-reported errors before anything else is looked at.
    fn check_provider_error(&self) -> Result<()> {
        match &self.error {
            Some(error) => {
                tracing::warn!(error = %error, "OAuth error from provider");
                Err(AppError::invalid(
                    "code",
                    format!("provider returned error: {}", error),
                ))
            }
            None => Ok(()),
        }
    }
}

#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Start Splitwise authorization.
async fn splitwise_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Json<AuthorizationStart>> {
    let redirect_uri = params.redirect_uri.unwrap_or_default();
    let start = state.reconciliation.begin_authorization(&redirect_uri)?;
    Ok(Json(start))
}

/// Splitwise callback - verify state, exchange code, store credential.
async fn splitwise_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<AccessTokenResponse>> {
    params.check_provider_error()?;

    let access_token = state
        .reconciliation
        .complete_authorization(
            params.code.as_deref().unwrap_or_default(),
            params.state.as_deref().unwrap_or_default(),
            params.email.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

/// Start identity-provider sign-in (PKCE).
async fn login_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Json<AuthorizationStart>> {
    let redirect_uri = params.redirect_uri.unwrap_or_default();
    let start = state.reconciliation.begin_sign_in(&redirect_uri)?;
    Ok(Json(start))
}

/// Identity-provider callback - verify state, exchange code with verifier.
async fn login_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<SignInTokens>> {
    params.check_provider_error()?;

    let tokens = state
        .reconciliation
        .complete_sign_in(
            params.code.as_deref().unwrap_or_default(),
            params.state.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(tokens))
}
