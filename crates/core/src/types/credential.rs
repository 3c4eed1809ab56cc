//! Session credential types.
//!
//! The backend issues a short-lived access token and a longer-lived refresh
//! token. Both are opaque strings; this module only gives them a shape and
//! keeps them out of `Debug` output.

use serde::{Deserialize, Serialize};

/// The access/refresh token pair that makes up a logged-in session.
///
/// Created at login, replaced wholesale on refresh, deleted on logout or
/// when a refresh fails. `Debug` is implemented manually to redact both
/// tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived token sent on every API call.
    pub access_token: String,
    /// Token used solely to obtain a new access token.
    pub refresh_token: String,
}

impl TokenPair {
    /// Create a new token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Body returned by `GET /auth/refresh/token`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    /// Replacement access token.
    pub new_access_token: String,
    /// Replacement refresh token.
    pub new_refresh_token: String,
}

impl From<RefreshedTokens> for TokenPair {
    fn from(tokens: RefreshedTokens) -> Self {
        Self {
            access_token: tokens.new_access_token,
            refresh_token: tokens.new_refresh_token,
        }
    }
}

impl std::fmt::Debug for RefreshedTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshedTokens").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_pair_debug_redacts() {
        let pair = TokenPair::new("access-secret", "refresh-secret");
        let debug = format!("{pair:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));
    }

    #[test]
    fn test_token_pair_wire_names() {
        let pair = TokenPair::new("a", "r");
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
    }

    #[test]
    fn test_refreshed_tokens_into_pair() {
        let body = r#"{"newAccessToken":"A2","newRefreshToken":"R2"}"#;
        let refreshed: RefreshedTokens = serde_json::from_str(body).unwrap();
        let pair = TokenPair::from(refreshed);
        assert_eq!(pair, TokenPair::new("A2", "R2"));
    }

    #[test]
    fn test_refreshed_tokens_rejects_missing_field() {
        let body = r#"{"newAccessToken":"A2"}"#;
        assert!(serde_json::from_str::<RefreshedTokens>(body).is_err());
    }
}
