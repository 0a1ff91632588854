// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod oauth;
pub mod oauth_session;
pub mod reconciliation;
pub mod splitwise;

pub use oauth::{ClientAuth, OAuthClient, OAuthProvider, TokenResponse};
pub use oauth_session::{OAuthFlow, OAuthSessionStore};
pub use reconciliation::{AuthorizationStart, ReconciliationService, SignInTokens};
pub use splitwise::{LedgerClient, LedgerUser, SplitwiseClient};
