// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("{provider} token exchange failed with status {status}")]
    ExchangeFailed {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Splitwise API error: {0}")]
    LedgerApi(String),

    #[error("Invalid OAuth session: {0}")]
    InvalidSession(String),

    #[error("OAuth state expired or invalid")]
    StateExpiredOrInvalid,

    #[error("Too many pending OAuth sessions")]
    TooManySessions,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message used when the ledger service rejects a stored access token.
    pub const LEDGER_TOKEN_REJECTED: &'static str = "Splitwise rejected the access token";

    /// Shorthand for a client-correctable input error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// True when the ledger service answered 401 for a stored credential.
    ///
    /// The credential stays in place; the user has to authorize again.
    pub fn is_ledger_token_rejected(&self) -> bool {
        matches!(self, AppError::LedgerApi(msg) if msg == Self::LEDGER_TOKEN_REJECTED)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::InvalidInput { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_input", Some(self.to_string()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::StorageUnavailable(msg) => {
                tracing::error!(error = %msg, "Storage unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", None)
            }
            AppError::ExchangeFailed {
                provider,
                status,
                body,
            } => {
                tracing::warn!(provider = %provider, status, body = %body, "Token exchange failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "exchange_failed",
                    Some(format!("{} returned {}: {}", provider, status, body)),
                )
            }
            AppError::MalformedResponse(msg) => (
                StatusCode::BAD_GATEWAY,
                "malformed_response",
                Some(msg.clone()),
            ),
            AppError::NetworkError(msg) => {
                (StatusCode::BAD_GATEWAY, "network_error", Some(msg.clone()))
            }
            AppError::LedgerApi(msg) => {
                (StatusCode::BAD_GATEWAY, "splitwise_error", Some(msg.clone()))
            }
            AppError::InvalidSession(msg) => {
                tracing::warn!(reason = %msg, "Rejected OAuth completion");
                (StatusCode::BAD_REQUEST, "invalid_session", Some(msg.clone()))
            }
            AppError::StateExpiredOrInvalid => {
                tracing::warn!("Rejected OAuth completion with unknown or expired state");
                (StatusCode::BAD_REQUEST, "state_expired_or_invalid", None)
            }
            AppError::TooManySessions => (
                StatusCode::SERVICE_UNAVAILABLE,
                "too_many_pending_sessions",
                None,
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
