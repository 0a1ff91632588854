//! Application configuration loaded from environment variables.
//!
//! Client secrets are read once at startup and kept in memory.

use crate::services::oauth::{ClientAuth, OAuthProvider};
use std::env;
use std::time::Duration;

const DEFAULT_SPLITWISE_AUTHORIZE_URL: &str = "https://secure.splitwise.com/oauth/authorize";
const DEFAULT_SPLITWISE_TOKEN_URL: &str = "https://secure.splitwise.com/oauth/token";
const DEFAULT_SPLITWISE_API_URL: &str = "https://secure.splitwise.com/api/v3.0";
const DEFAULT_IDP_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_IDP_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_IDP_SCOPES: &str = "openid email profile";

/// Where expenses and credentials are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Splitwise OAuth client ID (consumer key)
    pub splitwise_client_id: String,
    pub splitwise_authorize_url: String,
    pub splitwise_token_url: String,
    /// Base URL of the Splitwise REST API
    pub splitwise_api_url: String,
    /// Identity provider client ID (public PKCE client)
    pub idp_client_id: String,
    pub idp_authorize_url: String,
    pub idp_token_url: String,
    pub idp_scopes: Vec<String>,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    pub storage_backend: StorageBackend,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// How long an issued OAuth state stays redeemable
    pub oauth_session_ttl: Duration,
    /// Upper bound on the Splitwise balance lookup during expense listing
    pub balance_fetch_timeout: Duration,

    // --- Secrets ---
    /// Splitwise OAuth client secret (consumer secret)
    pub splitwise_client_secret: String,
}

impl Config {
    /// Config for tests; all provider URLs point at localhost.
    pub fn test_default() -> Self {
        Self {
            splitwise_client_id: "test_client_id".to_string(),
            splitwise_authorize_url: "http://localhost:9999/oauth/authorize".to_string(),
            splitwise_token_url: "http://localhost:9999/oauth/token".to_string(),
            splitwise_api_url: "http://localhost:9999/api/v3.0".to_string(),
            idp_client_id: "test_idp_client".to_string(),
            idp_authorize_url: "http://localhost:9998/authorize".to_string(),
            idp_token_url: "http://localhost:9998/token".to_string(),
            idp_scopes: vec!["openid".to_string(), "email".to_string()],
            frontend_url: "http://localhost:5173".to_string(),
            storage_backend: StorageBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            oauth_session_ttl: Duration::from_secs(600),
            balance_fetch_timeout: Duration::from_secs(5),
            splitwise_client_secret: "test_secret".to_string(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StorageBackend::Firestore,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            splitwise_client_id: required("SPLITWISE_CLIENT_ID")?,
            splitwise_authorize_url: env::var("SPLITWISE_AUTHORIZE_URL")
                .unwrap_or_else(|_| DEFAULT_SPLITWISE_AUTHORIZE_URL.to_string()),
            splitwise_token_url: env::var("SPLITWISE_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_SPLITWISE_TOKEN_URL.to_string()),
            splitwise_api_url: env::var("SPLITWISE_API_URL")
                .unwrap_or_else(|_| DEFAULT_SPLITWISE_API_URL.to_string()),
            idp_client_id: required("IDP_CLIENT_ID")?,
            idp_authorize_url: env::var("IDP_AUTHORIZE_URL")
                .unwrap_or_else(|_| DEFAULT_IDP_AUTHORIZE_URL.to_string()),
            idp_token_url: env::var("IDP_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_IDP_TOKEN_URL.to_string()),
            idp_scopes: env::var("IDP_SCOPES")
                .unwrap_or_else(|_| DEFAULT_IDP_SCOPES.to_string())
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            storage_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or("PORT", 8080)?,
            oauth_session_ttl: Duration::from_secs(parse_or("OAUTH_SESSION_TTL_SECS", 600)?),
            balance_fetch_timeout: Duration::from_secs(parse_or(
                "BALANCE_FETCH_TIMEOUT_SECS",
                5,
            )?),

            splitwise_client_secret: required("SPLITWISE_CLIENT_SECRET")?,
        })
    }

    /// Confidential OAuth client for the Splitwise ledger.
    pub fn ledger_provider(&self) -> OAuthProvider {
        OAuthProvider {
            name: "splitwise".to_string(),
            authorize_url: self.splitwise_authorize_url.clone(),
            token_url: self.splitwise_token_url.clone(),
            client_id: self.splitwise_client_id.clone(),
            auth: ClientAuth::ClientSecret(self.splitwise_client_secret.clone()),
            scopes: Vec::new(),
        }
    }

    /// Public PKCE client for signing users into the app.
    pub fn identity_provider(&self) -> OAuthProvider {
        OAuthProvider {
            name: "identity".to_string(),
            authorize_url: self.idp_authorize_url.clone(),
            token_url: self.idp_token_url.clone(),
            client_id: self.idp_client_id.clone(),
            auth: ClientAuth::Pkce,
            scopes: self.idp_scopes.clone(),
        }
    }
}

/// Present and non-blank, trimmed.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => {
            let parsed = raw.trim().parse();
            parsed.map_err(|_| ConfigError::Invalid { name, value: raw })
        }
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global; keep every env-mutating assertion in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("SPLITWISE_CLIENT_ID", "test_id");
        env::set_var("SPLITWISE_CLIENT_SECRET", " test_secret \n");
        env::set_var("IDP_CLIENT_ID", "idp_id");
        env::set_var("IDP_SCOPES", "openid email");
        env::set_var("STORAGE_BACKEND", "memory");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.splitwise_client_id, "test_id");
        assert_eq!(config.splitwise_client_secret, "test_secret");
        assert_eq!(config.splitwise_token_url, DEFAULT_SPLITWISE_TOKEN_URL);
        assert_eq!(config.idp_scopes, vec!["openid", "email"]);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.port, 8080);
        assert_eq!(config.oauth_session_ttl, Duration::from_secs(600));
        assert_eq!(config.balance_fetch_timeout, Duration::from_secs(5));

        env::set_var("BALANCE_FETCH_TIMEOUT_SECS", "soon");
        let err = Config::from_env().expect_err("bad timeout should fail");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "BALANCE_FETCH_TIMEOUT_SECS",
                ..
            }
        ));
        env::remove_var("BALANCE_FETCH_TIMEOUT_SECS");

        env::set_var("STORAGE_BACKEND", "postgres");
        assert!(Config::from_env().is_err());
        env::remove_var("STORAGE_BACKEND");

        env::set_var("SPLITWISE_CLIENT_SECRET", "  ");
        let err = Config::from_env().expect_err("blank secret should fail");
        assert!(matches!(
            err,
            ConfigError::Missing("SPLITWISE_CLIENT_SECRET")
        ));
        env::set_var("SPLITWISE_CLIENT_SECRET", "");
        assert!(Config::from_env().is_err());
        env::set_var("SPLITWISE_CLIENT_SECRET", "test_secret");
    }

    #[test]
    fn test_providers_use_expected_client_auth() {
        let config = Config::test_default();

        let ledger = config.ledger_provider();
        assert!(matches!(ledger.auth, ClientAuth::ClientSecret(ref s) if s == "test_secret"));

        let identity = config.identity_provider();
        assert!(matches!(identity.auth, ClientAuth::Pkce));
        assert_eq!(identity.scopes, vec!["openid", "email"]);
    }
}
