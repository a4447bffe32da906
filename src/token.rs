use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// TokenResponse is a successful answer from the OAuth token endpoint.
/// Fields the provider adds beyond the common ones are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token for API requests
    pub access_token: String,

    /// Token lifetime in seconds, 0 for a token that does not expire
    #[serde(default)]
    pub expires_in: i64,

    /// Authorized user, absent for client-credentials tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// Remaining response fields (email, secret, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// When the token was received
    #[serde(skip, default = "Utc::now")]
    pub obtained_at: DateTime<Utc>,
}

impl TokenResponse {
    /// Expiration instant, or None when the token does not expire.
    /// A lifetime past the representable date range counts as no expiry.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expires_in <= 0 {
            return None;
        }
        Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| self.obtained_at.checked_add_signed(lifetime))
    }

    /// Check whether the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at().map_or(false, |at| Utc::now() >= at)
    }
}
