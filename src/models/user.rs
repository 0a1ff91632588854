//! Per-user credential model.

use serde::{Deserialize, Serialize};

/// Splitwise access credential. At most one per user; last write wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Stored for a future refresh path; never used today
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When the provider said the token expires (RFC 3339), if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// When the token was obtained (RFC 3339)
    pub obtained_at: String,
}

/// In-memory shape of one user's data: ordered expenses plus the
/// credential slot.
#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    pub expenses: Vec<crate::models::ExpenseRecord>,
    pub credential: Option<Credential>,
}
