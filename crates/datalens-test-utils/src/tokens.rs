// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unsigned bearer tokens for tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use datalens_core::AuthTokens;
use serde_json::{json, Value};

/// Encode `claims` as the payload of a three-segment token.
///
/// The signature segment is a fixed placeholder; nothing on the client
/// verifies it.
pub fn mint_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// Access token for `sub` with `role_id`, expiring `ttl_secs` from now.
/// A negative `ttl_secs` yields an already expired token.
pub fn access_token(sub: &str, role_id: i64, ttl_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + ttl_secs;
    mint_token(&json!({ "sub": sub, "role_id": role_id, "exp": exp }))
}

/// Token pair whose access token expires `ttl_secs` from now.
pub fn token_pair(sub: &str, role_id: i64, ttl_secs: i64) -> AuthTokens {
    AuthTokens::new(
        access_token(sub, role_id, ttl_secs),
        format!("refresh-{sub}-{}", chrono::Utc::now().timestamp_micros()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_token_has_three_segments() {
        let token = mint_token(&json!({"sub": "alice"}));
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
    }

    #[test]
    fn token_pair_refresh_tokens_differ() {
        let a = token_pair("alice", 1, 60);
        std::thread::sleep(std::time::Duration::from_millis(1));
        let b = token_pair("alice", 1, 60);
        assert_ne!(a.refresh_token, b.refresh_token);
    }
}
