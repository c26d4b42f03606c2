// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auth lifecycle FSM.
//!
//! States: Unauthenticated -> Authenticating -> Authenticated <-> Refreshing,
//! with Error reachable from a failed login. Events a state does not list are
//! ignored. Every applied transition publishes the new snapshot on a
//! `watch` channel.

use datalens_core::{AuthTokens, User};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::token_store::{decode_claims, is_token_expired, TokenStore};

/// Consecutive refresh failures that end the session.
pub const MAX_REFRESH_RETRIES: u32 = 3;

/// Error recorded when refresh retries are exhausted.
pub const SESSION_EXPIRED: &str = "Session expired";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Refreshing,
    Error,
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Authenticating => write!(f, "authenticating"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::Refreshing => write!(f, "refreshing"),
            AuthState::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    Login,
    LoginSuccess {
        tokens: AuthTokens,
        user: Option<User>,
    },
    LoginFailure {
        error: String,
    },
    Logout,
    Refresh,
    RefreshSuccess {
        tokens: AuthTokens,
    },
    RefreshFailure {
        error: String,
    },
    ClearError,
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::Login => "LOGIN",
            AuthEvent::LoginSuccess { .. } => "LOGIN_SUCCESS",
            AuthEvent::LoginFailure { .. } => "LOGIN_FAILURE",
            AuthEvent::Logout => "LOGOUT",
            AuthEvent::Refresh => "REFRESH",
            AuthEvent::RefreshSuccess { .. } => "REFRESH_SUCCESS",
            AuthEvent::RefreshFailure { .. } => "REFRESH_FAILURE",
            AuthEvent::ClearError => "CLEAR_ERROR",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthContext {
    pub user: Option<User>,
    pub tokens: Option<AuthTokens>,
    pub error: Option<String>,
    pub retry_count: u32,
}

/// State value plus context, as published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub value: AuthState,
    pub context: AuthContext,
}

impl AuthSnapshot {
    pub fn unauthenticated() -> Self {
        Self {
            value: AuthState::Unauthenticated,
            context: AuthContext::default(),
        }
    }

    /// Starting snapshot for whatever the store holds.
    ///
    /// A pair counts as a session when its access token is still valid or it
    /// carries a refresh token to renew it with.
    pub fn from_store(store: &TokenStore) -> Self {
        match store.stored_tokens() {
            Some(tokens)
                if !tokens.refresh_token.is_empty()
                    || !is_token_expired(&tokens.access_token) =>
            {
                Self {
                    value: AuthState::Authenticated,
                    context: AuthContext {
                        user: decode_claims(&tokens.access_token).ok(),
                        tokens: Some(tokens),
                        error: None,
                        retry_count: 0,
                    },
                }
            }
            _ => Self::unauthenticated(),
        }
    }

    /// True while a session exists, including during a background refresh.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.value, AuthState::Authenticated | AuthState::Refreshing)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.value, AuthState::Authenticating | AuthState::Refreshing)
    }

    /// Apply `event`, returning the next snapshot or `None` if the event is
    /// not accepted in the current state.
    pub fn next(&self, event: AuthEvent) -> Option<AuthSnapshot> {
        use AuthState::*;

        let mut context = self.context.clone();
        let value = match (self.value, event) {
            (Unauthenticated | Error, AuthEvent::Login) => {
                context.error = None;
                Authenticating
            }
            (Authenticating, AuthEvent::LoginSuccess { tokens, user }) => {
                context.user = user;
                context.tokens = Some(tokens);
                context.error = None;
                context.retry_count = 0;
                Authenticated
            }
            (Authenticating, AuthEvent::LoginFailure { error }) => {
                context.error = Some(error);
                context.user = None;
                context.tokens = None;
                Error
            }
            (Authenticated | Refreshing, AuthEvent::Logout) => {
                context = AuthContext::default();
                Unauthenticated
            }
            (Authenticated, AuthEvent::Refresh) => Refreshing,
            (Refreshing, AuthEvent::RefreshSuccess { tokens }) => {
                // The user is derived from the access token, so it follows the new one.
                context.user = decode_claims(&tokens.access_token).ok();
                context.tokens = Some(tokens);
                context.error = None;
                context.retry_count = 0;
                Authenticated
            }
            (Refreshing, AuthEvent::RefreshFailure { error }) => {
                let attempts = context.retry_count + 1;
                if attempts >= MAX_REFRESH_RETRIES {
                    context = AuthContext {
                        error: Some(SESSION_EXPIRED.to_string()),
                        ..AuthContext::default()
                    };
                    Unauthenticated
                } else {
                    context.retry_count = attempts;
                    context.error = Some(error);
                    Refreshing
                }
            }
            (Error, AuthEvent::ClearError) => {
                context.error = None;
                Unauthenticated
            }
            _ => return None,
        };

        Some(AuthSnapshot { value, context })
    }
}

/// The single auth state instance, publishing every transition.
pub struct AuthMachine {
    snapshot: AuthSnapshot,
    tx: watch::Sender<AuthSnapshot>,
}

impl AuthMachine {
    pub fn new(initial: AuthSnapshot) -> Self {
        let (tx, _) = watch::channel(initial.clone());
        Self {
            snapshot: initial,
            tx,
        }
    }

    pub fn state(&self) -> AuthState {
        self.snapshot.value
    }

    pub fn snapshot(&self) -> &AuthSnapshot {
        &self.snapshot
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    /// Apply `event` and return the resulting snapshot. Ignored events leave
    /// the state untouched and notify no one.
    pub fn send(&mut self, event: AuthEvent) -> &AuthSnapshot {
        let name = event.name();
        match self.snapshot.next(event) {
            Some(next) => {
                debug!(
                    event = name,
                    from = %self.snapshot.value,
                    to = %next.value,
                    retry_count = next.context.retry_count,
                    "auth transition"
                );
                self.snapshot = next;
                self.tx.send_replace(self.snapshot.clone());
            }
            None => trace!(event = name, state = %self.snapshot.value, "auth event ignored"),
        }
        &self.snapshot
    }
}

impl Default for AuthMachine {
    fn default() -> Self {
        Self::new(AuthSnapshot::unauthenticated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalens_test_utils::{access_token, token_pair};

    fn authenticated() -> AuthMachine {
        let mut machine = AuthMachine::default();
        machine.send(AuthEvent::Login);
        let tokens = token_pair("alice", 2, 600);
        let user = decode_claims(&tokens.access_token).ok();
        machine.send(AuthEvent::LoginSuccess { tokens, user });
        assert_eq!(machine.state(), AuthState::Authenticated);
        machine
    }

    fn failure() -> AuthEvent {
        AuthEvent::RefreshFailure {
            error: "refresh rejected".into(),
        }
    }

    #[test]
    fn login_flow_sets_user_and_tokens() {
        let machine = authenticated();
        let ctx = &machine.snapshot().context;
        assert_eq!(ctx.user.as_ref().unwrap().role_id, 2);
        assert!(ctx.tokens.is_some());
        assert!(machine.snapshot().is_authenticated());
        assert!(!machine.snapshot().is_loading());
    }

    #[test]
    fn three_refresh_failures_end_the_session() {
        let mut machine = authenticated();
        machine.send(AuthEvent::Refresh);

        machine.send(failure());
        assert_eq!(machine.state(), AuthState::Refreshing);
        assert_eq!(machine.snapshot().context.retry_count, 1);

        machine.send(failure());
        assert_eq!(machine.state(), AuthState::Refreshing);
        assert_eq!(machine.snapshot().context.retry_count, 2);
        assert!(machine.snapshot().is_authenticated());

        let snap = machine.send(failure()).clone();
        assert_eq!(snap.value, AuthState::Unauthenticated);
        assert_eq!(snap.context.error.as_deref(), Some(SESSION_EXPIRED));
        assert_eq!(snap.context.retry_count, 0);
        assert!(snap.context.user.is_none());
        assert!(snap.context.tokens.is_none());
    }

    #[test]
    fn refresh_success_resets_retry_count() {
        let mut machine = authenticated();
        machine.send(AuthEvent::Refresh);
        machine.send(failure());
        machine.send(failure());
        let tokens = token_pair("alice", 5, 600);
        let snap = machine.send(AuthEvent::RefreshSuccess { tokens }).clone();
        assert_eq!(snap.value, AuthState::Authenticated);
        assert_eq!(snap.context.retry_count, 0);
        assert!(snap.context.error.is_none());
        assert_eq!(snap.context.user.unwrap().role_id, 5);
    }

    #[test]
    fn logout_ignored_when_unauthenticated_or_error() {
        let mut machine = AuthMachine::default();
        let mut rx = machine.subscribe();
        let before = machine.snapshot().clone();
        machine.send(AuthEvent::Logout);
        assert_eq!(machine.snapshot(), &before);

        machine.send(AuthEvent::Login);
        machine.send(AuthEvent::LoginFailure {
            error: "bad password".into(),
        });
        assert_eq!(machine.state(), AuthState::Error);
        rx.mark_unchanged();
        let before = machine.snapshot().clone();
        machine.send(AuthEvent::Logout);
        assert_eq!(machine.snapshot(), &before);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn error_exits_only_by_clear_or_login() {
        let mut machine = AuthMachine::default();
        machine.send(AuthEvent::Login);
        machine.send(AuthEvent::LoginFailure {
            error: "bad password".into(),
        });
        machine.send(AuthEvent::Refresh);
        assert_eq!(machine.state(), AuthState::Error);
        assert_eq!(machine.snapshot().context.error.as_deref(), Some("bad password"));

        machine.send(AuthEvent::ClearError);
        assert_eq!(machine.state(), AuthState::Unauthenticated);
        assert!(machine.snapshot().context.error.is_none());

        machine.send(AuthEvent::Login);
        machine.send(AuthEvent::LoginFailure { error: "again".into() });
        machine.send(AuthEvent::Login);
        assert_eq!(machine.state(), AuthState::Authenticating);
        assert!(machine.snapshot().context.error.is_none());
    }

    #[test]
    fn refresh_ignored_while_authenticating() {
        let mut machine = AuthMachine::default();
        machine.send(AuthEvent::Login);
        machine.send(AuthEvent::Refresh);
        assert_eq!(machine.state(), AuthState::Authenticating);
        assert!(machine.snapshot().is_loading());
        assert!(!machine.snapshot().is_authenticated());
    }

    #[test]
    fn logout_during_refresh_clears_everything() {
        let mut machine = authenticated();
        machine.send(AuthEvent::Refresh);
        machine.send(failure());
        let snap = machine.send(AuthEvent::Logout).clone();
        assert_eq!(snap, AuthSnapshot::unauthenticated());
    }

    #[test]
    fn subscribers_see_each_transition() {
        let mut machine = AuthMachine::default();
        let rx = machine.subscribe();
        machine.send(AuthEvent::Login);
        assert_eq!(rx.borrow().value, AuthState::Authenticating);
        machine.send(AuthEvent::LoginFailure { error: "nope".into() });
        assert_eq!(rx.borrow().value, AuthState::Error);
    }

    #[test]
    fn initial_state_from_store() {
        use crate::storage::MemoryStorage;
        use std::sync::Arc;

        let store = TokenStore::new(Arc::new(MemoryStorage::new()));
        assert_eq!(AuthSnapshot::from_store(&store).value, AuthState::Unauthenticated);

        store
            .save_tokens(&AuthTokens::new(access_token("alice", 2, -60), "refresh"))
            .unwrap();
        let snap = AuthSnapshot::from_store(&store);
        assert_eq!(snap.value, AuthState::Authenticated);
        assert_eq!(snap.context.user.unwrap().sub, "alice");

        store
            .save_tokens(&AuthTokens::new(access_token("alice", 2, -60), ""))
            .unwrap();
        assert_eq!(AuthSnapshot::from_store(&store).value, AuthState::Unauthenticated);
    }
}
