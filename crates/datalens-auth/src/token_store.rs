// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence of the current token pair and stateless claim decoding.
//!
//! The token pair is the only state shared between components. Only
//! [`TokenStore::save_tokens`] and [`TokenStore::remove_tokens`] write it, and
//! readers always go back to storage instead of caching.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use datalens_core::{AuthTokens, DatalensError, KeyValueStorage, User};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

/// Storage key holding the serialized [`AuthTokens`].
pub const TOKEN_STORAGE_KEY: &str = "auth_tokens";

/// Decode the claims carried in a token's payload segment.
///
/// The token must have exactly three dot-separated segments; the middle one
/// is base64url JSON. Padding is tolerated. The signature is not checked.
pub fn decode_claims<T: DeserializeOwned>(token: &str) -> Result<T, DatalensError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(DatalensError::TokenDecode(format!(
            "expected 3 dot-separated segments, found {}",
            segments.len()
        )));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| DatalensError::TokenDecode(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| DatalensError::TokenDecode(format!("payload is not valid claims JSON: {e}")))
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

/// Expiry (epoch seconds) of `token`, if it decodes and carries one.
pub fn token_expiry(token: &str) -> Option<i64> {
    decode_claims::<ExpiryClaim>(token).ok()?.exp
}

/// Whether `token` is expired at `now` (epoch seconds).
///
/// Undecodable tokens and tokens without `exp` count as expired.
pub fn is_token_expired_at(token: &str, now: i64) -> bool {
    match token_expiry(token) {
        Some(exp) => exp <= now,
        None => true,
    }
}

/// Whether `token` is expired right now.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, chrono::Utc::now().timestamp())
}

/// Reads and writes the persisted token pair.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Overwrite the persisted pair.
    pub fn save_tokens(&self, tokens: &AuthTokens) -> Result<(), DatalensError> {
        let json = serde_json::to_string(tokens).map_err(|e| DatalensError::Storage {
            source: Box::new(e),
        })?;
        self.storage.set(TOKEN_STORAGE_KEY, &json)
    }

    /// The persisted pair, or `None` when absent or unreadable.
    ///
    /// Read and parse failures are logged, never returned.
    pub fn stored_tokens(&self) -> Option<AuthTokens> {
        let raw = match self.storage.get(TOKEN_STORAGE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "failed to read stored tokens");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                warn!(error = %e, "stored tokens are corrupt, ignoring them");
                None
            }
        }
    }

    /// Delete the persisted pair. Removing an absent pair succeeds.
    pub fn remove_tokens(&self) -> Result<(), DatalensError> {
        self.storage.remove(TOKEN_STORAGE_KEY)
    }

    /// Claims of the stored access token, decoded afresh on every call.
    pub fn current_user(&self) -> Option<User> {
        let tokens = self.stored_tokens()?;
        decode_claims(&tokens.access_token).ok()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use datalens_test_utils::{access_token, mint_token};
    use proptest::prelude::*;
    use serde_json::json;

    fn store() -> TokenStore {
        TokenStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn decode_reads_claims() {
        let token = access_token("alice", 2, 600);
        let user: User = decode_claims(&token).unwrap();
        assert_eq!(user.sub, "alice");
        assert_eq!(user.role_id, 2);
        assert!(user.exp.is_some());
    }

    #[test]
    fn decode_tolerates_padding() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"sub":"bo"}"#);
        assert!(payload.ends_with('='));
        let user: User = decode_claims(&format!("h.{payload}.s")).unwrap();
        assert_eq!(user.sub, "bo");
    }

    #[test]
    fn decode_rejects_wrong_segment_count() {
        let err = decode_claims::<User>("only.two").unwrap_err();
        assert!(matches!(err, DatalensError::TokenDecode(_)));
        assert!(decode_claims::<User>("a.b.c.d").is_err());
        assert!(decode_claims::<User>("").is_err());
    }

    #[test]
    fn missing_exp_counts_as_expired() {
        let token = mint_token(&json!({"sub": "alice"}));
        assert!(is_token_expired(&token));
    }

    #[test]
    fn future_exp_is_not_expired() {
        assert!(!is_token_expired(&access_token("alice", 1, 600)));
    }

    #[test]
    fn corrupt_stored_value_reads_as_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_STORAGE_KEY, "{not json").unwrap();
        let store = TokenStore::new(storage);
        assert!(store.stored_tokens().is_none());
    }

    #[test]
    fn current_user_follows_the_stored_token() {
        let store = store();
        assert!(store.current_user().is_none());

        store
            .save_tokens(&AuthTokens::new(access_token("alice", 1, 600), "r1"))
            .unwrap();
        assert_eq!(store.current_user().unwrap().sub, "alice");

        store
            .save_tokens(&AuthTokens::new(access_token("bob", 3, 600), "r2"))
            .unwrap();
        let user = store.current_user().unwrap();
        assert_eq!(user.sub, "bob");
        assert_eq!(user.role_id, 3);
    }

    #[test]
    fn remove_twice_leaves_nothing() {
        let store = store();
        store.save_tokens(&AuthTokens::new("a", "r")).unwrap();
        store.remove_tokens().unwrap();
        assert!(store.stored_tokens().is_none());
        store.remove_tokens().unwrap();
        assert!(store.stored_tokens().is_none());
    }

    fn arb_tokens() -> impl Strategy<Value = AuthTokens> {
        (
            "[ -~]{0,64}",
            "[ -~]{0,64}",
            "[a-zA-Z]{1,10}",
            proptest::option::of(any::<u64>()),
        )
            .prop_map(|(access_token, refresh_token, token_type, expires_in)| AuthTokens {
                access_token,
                refresh_token,
                token_type,
                expires_in,
            })
    }

    proptest! {
        #[test]
        fn past_exp_is_always_expired(age in 0i64..1_000_000, now in 1_000_000i64..4_000_000_000) {
            let token = mint_token(&json!({"sub": "x", "exp": now - age}));
            prop_assert!(is_token_expired_at(&token, now));
        }

        #[test]
        fn garbage_payload_is_always_expired(payload in "[^.]{0,40}") {
            // Skip the rare payload that happens to decode to claims with `exp`.
            let token = format!("header.{payload}.sig");
            let decodes = decode_claims::<ExpiryClaim>(&token).map(|c| c.exp.is_some()).unwrap_or(false);
            prop_assume!(!decodes);
            prop_assert!(is_token_expired_at(&token, 0));
        }

        #[test]
        fn saved_tokens_read_back_equal(tokens in arb_tokens()) {
            let store = store();
            store.save_tokens(&tokens).unwrap();
            prop_assert_eq!(store.stored_tokens(), Some(tokens));
        }
    }
}
