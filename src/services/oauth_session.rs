// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ephemeral store of outstanding OAuth attempts, keyed by state token.
//!
//! A session is created when an authorization URL is issued and removed
//! the first time its state comes back, whether or not it then validates.
//! Unknown, expired or already-consumed states fail closed.
//!
//! The store is per process. Deployments running several instances need
//! sticky routing for the OAuth round-trip.

use crate::error::AppError;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Which authorization flow issued a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthFlow {
    /// Splitwise authorization (confidential client)
    Ledger,
    /// App sign-in via the identity provider (PKCE)
    Identity,
}

/// What we remember about an outstanding authorization attempt.
#[derive(Debug, Clone)]
pub struct PendingSession {
    pub flow: OAuthFlow,
    /// Must be replayed verbatim at the token endpoint
    pub redirect_uri: String,
    pub code_verifier: Option<String>,
    issued_at: Instant,
}

impl PendingSession {
    pub fn new(flow: OAuthFlow, redirect_uri: String, code_verifier: Option<String>) -> Self {
        Self {
            flow,
            redirect_uri,
            code_verifier,
            issued_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.issued_at.elapsed() >= ttl
    }
}

/// Upper bound on outstanding authorization attempts per process.
pub const MAX_PENDING_SESSIONS: usize = 10_000;

pub struct OAuthSessionStore {
    sessions: DashMap<String, PendingSession>,
    ttl: Duration,
    limit: usize,
}

impl OAuthSessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_limit(ttl, MAX_PENDING_SESSIONS)
    }

    pub fn with_limit(ttl: Duration, limit: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            limit,
        }
    }

    /// Record a freshly issued state.
    ///
    /// Expired sessions are swept only once the store is full. If it is
    /// still full afterwards the new attempt is refused.
    pub fn insert(&self, state: String, session: PendingSession) -> Result<(), AppError> {
        if self.sessions.len() >= self.limit {
            self.purge_expired();
            if self.sessions.len() >= self.limit {
                tracing::warn!(limit = self.limit, "Too many pending OAuth sessions");
                return Err(AppError::TooManySessions);
            }
        }

        self.sessions.insert(state, session);
        Ok(())
    }

    /// Redeem `state` for the given flow. Single use.
    pub fn consume(&self, state: &str, flow: OAuthFlow) -> Result<PendingSession, AppError> {
        if state.is_empty() {
            return Err(AppError::InvalidSession("missing state".to_string()));
        }

        let (_, session) = self
            .sessions
            .remove(state)
            .ok_or(AppError::StateExpiredOrInvalid)?;

        if session.is_expired(self.ttl) {
            return Err(AppError::StateExpiredOrInvalid);
        }

        if session.flow != flow {
            return Err(AppError::InvalidSession(format!(
                "state was issued for the {:?} flow",
                session.flow
            )));
        }

        Ok(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn purge_expired(&self) {
        let ttl = self.ttl;
        self.sessions.retain(|_, session| !session.is_expired(ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_session() -> PendingSession {
        PendingSession::new(OAuthFlow::Ledger, "myapp://cb".to_string(), None)
    }

    #[test]
    fn test_consume_is_single_use() {
        let store = OAuthSessionStore::new(Duration::from_secs(600));
        store.insert("abc".to_string(), ledger_session()).unwrap();

        let session = store.consume("abc", OAuthFlow::Ledger).unwrap();
        assert_eq!(session.redirect_uri, "myapp://cb");

        let err = store.consume("abc", OAuthFlow::Ledger).unwrap_err();
        assert!(matches!(err, AppError::StateExpiredOrInvalid));
    }

    #[test]
    fn test_unknown_state_fails_closed() {
        let store = OAuthSessionStore::new(Duration::from_secs(600));
        store.insert("abc".to_string(), ledger_session()).unwrap();

        let err = store.consume("expected_state", OAuthFlow::Ledger).unwrap_err();
        assert!(matches!(err, AppError::StateExpiredOrInvalid));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_state_is_invalid_session() {
        let store = OAuthSessionStore::new(Duration::from_secs(600));
        let err = store.consume("", OAuthFlow::Identity).unwrap_err();
        assert!(matches!(err, AppError::InvalidSession(_)));
    }

    #[test]
    fn test_expired_state_is_rejected() {
        let store = OAuthSessionStore::new(Duration::ZERO);
        store.insert("abc".to_string(), ledger_session()).unwrap();

        let err = store.consume("abc", OAuthFlow::Ledger).unwrap_err();
        assert!(matches!(err, AppError::StateExpiredOrInvalid));
    }

    #[test]
    fn test_state_from_other_flow_is_rejected_and_burned() {
        let store = OAuthSessionStore::new(Duration::from_secs(600));
        store.insert("abc".to_string(), ledger_session()).unwrap();

        let err = store.consume("abc", OAuthFlow::Identity).unwrap_err();
        assert!(matches!(err, AppError::InvalidSession(_)));

        // A rejected state cannot be replayed against the right flow either.
        let err = store.consume("abc", OAuthFlow::Ledger).unwrap_err();
        assert!(matches!(err, AppError::StateExpiredOrInvalid));
    }

    #[test]
    fn test_full_store_sweeps_expired_sessions() {
        let store = OAuthSessionStore::with_limit(Duration::ZERO, 1);
        store.insert("one".to_string(), ledger_session()).unwrap();
        store.insert("two".to_string(), ledger_session()).unwrap();

        // "one" expired immediately and was swept to make room for "two".
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_full_store_refuses_new_sessions() {
        let store = OAuthSessionStore::with_limit(Duration::from_secs(600), 2);
        store.insert("one".to_string(), ledger_session()).unwrap();
        store.insert("two".to_string(), ledger_session()).unwrap();

        let err = store
            .insert("three".to_string(), ledger_session())
            .unwrap_err();
        assert!(matches!(err, AppError::TooManySessions));
        assert_eq!(store.len(), 2);

        // Redeeming a session frees a slot.
        store.consume("one", OAuthFlow::Ledger).unwrap();
        store.insert("three".to_string(), ledger_session()).unwrap();
    }
}
