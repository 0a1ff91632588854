// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 authorization-code client.
//!
//! One type serves both providers:
//! - Splitwise, a confidential client that authenticates with its secret
//! - the identity provider, a public client that proves possession of a
//!   PKCE `code_verifier` instead
//!
//! Token exchanges are never retried. An authorization code is single-use,
//! so a second attempt would fail anyway and mask the original error.

use crate::error::AppError;
use anyhow::Context;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// 32 random bytes, 43 characters once base64url encoded.
const RANDOM_TOKEN_BYTES: usize = 32;

/// How the client authenticates at the token endpoint.
#[derive(Debug, Clone)]
pub enum ClientAuth {
    /// Confidential client: `client_secret` is sent with the exchange.
    ClientSecret(String),
    /// Public client: a per-attempt PKCE verifier is sent instead.
    Pkce,
}

/// Static description of an OAuth provider.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    /// Short name used in logs and errors
    pub name: String,
    pub authorize_url: String,
    pub token_url: String,
    pub client_id: String,
    pub auth: ClientAuth,
    pub scopes: Vec<String>,
}

/// An authorization attempt ready to hand to the user agent.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    /// Present for PKCE providers; must stay server-side.
    pub code_verifier: Option<String>,
}

/// Token endpoint success body (RFC 6749 §5.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// OAuth2 client for a single provider.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    provider: OAuthProvider,
    rng: SystemRandom,
}

impl OAuthClient {
    pub fn new(provider: OAuthProvider) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building OAuth HTTP client")?;

        Ok(Self {
            http,
            provider,
            rng: SystemRandom::new(),
        })
    }

    pub fn provider(&self) -> &OAuthProvider {
        &self.provider
    }

    /// Build the authorization URL for a fresh attempt. No network I/O.
    ///
    /// Every call draws a new state token (and verifier, for PKCE) from the
    /// system CSPRNG.
    pub fn build_authorization_request(
        &self,
        redirect_uri: &str,
    ) -> Result<AuthorizationRequest, AppError> {
        let state = random_token(&self.rng)?;

        let mut params: Vec<(&str, String)> = vec![
            ("response_type", "code".to_string()),
            ("client_id", self.provider.client_id.clone()),
            ("redirect_uri", redirect_uri.to_string()),
            ("state", state.clone()),
        ];

        if !self.provider.scopes.is_empty() {
            params.push(("scope", self.provider.scopes.join(" ")));
        }

        let code_verifier = match self.provider.auth {
            ClientAuth::Pkce => {
                let verifier = random_token(&self.rng)?;
                params.push(("code_challenge", pkce_challenge(&verifier)));
                params.push(("code_challenge_method", "S256".to_string()));
                Some(verifier)
            }
            ClientAuth::ClientSecret(_) => None,
        };

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.provider.authorize_url.contains('?') {
            '&'
        } else {
            '?'
        };

        Ok(AuthorizationRequest {
            url: format!("{}{}{}", self.provider.authorize_url, separator, query),
            state,
            code_verifier,
        })
    }

    /// Exchange an authorization code for tokens. One round-trip, no retry.
    ///
    /// `redirect_uri` must be the one used to build the authorization URL.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenResponse, AppError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.provider.client_id.as_str()),
        ];

        match &self.provider.auth {
            ClientAuth::ClientSecret(secret) => form.push(("client_secret", secret.as_str())),
            ClientAuth::Pkce => {
                let verifier = code_verifier.ok_or_else(|| {
                    AppError::InvalidSession("missing PKCE code verifier".to_string())
                })?;
                form.push(("code_verifier", verifier));
            }
        }

        let response = self
            .http
            .post(&self.provider.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                AppError::NetworkError(format!(
                    "{} token request failed: {}",
                    self.provider.name, e
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::NetworkError(format!(
                "{} token response unreadable: {}",
                self.provider.name, e
            ))
        })?;

        if !status.is_success() {
            tracing::error!(
                provider = %self.provider.name,
                status = %status,
                "Token exchange rejected"
            );
            return Err(AppError::ExchangeFailed {
                provider: self.provider.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let token = parse_token_response(&body).ok_or_else(|| {
            AppError::MalformedResponse(format!(
                "{} token response has no access_token",
                self.provider.name
            ))
        })?;

        tracing::info!(provider = %self.provider.name, "Authorization code exchanged");
        Ok(token)
    }
}

/// Parse a token response, insisting on a non-empty `access_token`.
fn parse_token_response(body: &str) -> Option<TokenResponse> {
    let token: TokenResponse = serde_json::from_str(body).ok()?;
    if token.access_token.trim().is_empty() {
        return None;
    }
    Some(token)
}

/// Unguessable URL-safe token from the system CSPRNG.
fn random_token(rng: &SystemRandom) -> Result<String, AppError> {
    let mut bytes = [0u8; RANDOM_TOKEN_BYTES];
    rng.fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// S256 PKCE challenge (RFC 7636 §4.2).
pub fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
