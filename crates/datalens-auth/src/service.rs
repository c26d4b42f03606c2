// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The auth context object.
//!
//! [`AuthService`] ties the token store, the state machine and the refresh
//! coordinator together. One instance is built at startup and cloned into
//! whatever needs credentials; clones share all state.

use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use datalens_config::AuthConfig;
use datalens_core::{AuthBackend, AuthTokens, DatalensError, LoginCredentials, User};
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coordinator::{RefreshCoordinator, RefreshFailure};
use crate::machine::{AuthEvent, AuthMachine, AuthSnapshot, AuthState, SESSION_EXPIRED};
use crate::token_store::{decode_claims, is_token_expired, token_expiry, TokenStore};

/// Timing knobs for token renewal.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Renew this long before the access token expires.
    pub margin: Duration,
    /// Pause between attempts after a transient failure.
    pub retry_delay: Duration,
    /// Whether to renew ahead of expiry at all.
    pub auto_refresh: bool,
}

impl From<&AuthConfig> for RefreshSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            margin: Duration::from_secs(config.refresh_margin_secs),
            retry_delay: Duration::from_millis(config.refresh_retry_delay_ms),
            auto_refresh: config.auto_refresh,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    store: TokenStore,
    backend: Arc<dyn AuthBackend>,
    machine: Mutex<AuthMachine>,
    snapshots: watch::Receiver<AuthSnapshot>,
    coordinator: RefreshCoordinator,
    timer: std::sync::Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
    settings: RefreshSettings,
}

fn not_authenticated() -> DatalensError {
    DatalensError::unauthenticated("not authenticated")
}

fn bearer(tokens: &AuthTokens) -> String {
    format!("Bearer {}", tokens.access_token)
}

impl AuthService {
    /// Build the service with the machine initialised from `store`.
    ///
    /// When called inside a Tokio runtime and a session is restored, the
    /// refresh timer is armed immediately.
    pub fn new(store: TokenStore, backend: Arc<dyn AuthBackend>, config: &AuthConfig) -> Self {
        Self::with_settings(store, backend, RefreshSettings::from(config))
    }

    pub fn with_settings(
        store: TokenStore,
        backend: Arc<dyn AuthBackend>,
        settings: RefreshSettings,
    ) -> Self {
        let initial = AuthSnapshot::from_store(&store);
        let machine = AuthMachine::new(initial.clone());
        let snapshots = machine.subscribe();

        let service = Self {
            inner: Arc::new(AuthInner {
                store,
                backend,
                machine: Mutex::new(machine),
                snapshots,
                coordinator: RefreshCoordinator::new(),
                timer: std::sync::Mutex::new(None),
                shutdown: CancellationToken::new(),
                settings,
            }),
        };

        debug!(state = %initial.value, "auth service initialised");
        if let Some(tokens) = initial.context.tokens.as_ref() {
            service.schedule_refresh(tokens);
        }
        service
    }

    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Receiver that observes every transition from now on.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.snapshots.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.snapshots.borrow().is_authenticated()
    }

    /// Claims of the stored access token, decoded on every call.
    pub fn current_user(&self) -> Option<User> {
        self.inner.store.current_user()
    }

    pub async fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing().await
    }

    /// Exchange credentials for a token pair and start a session.
    ///
    /// An existing session is ended first. A login already in flight is
    /// rejected rather than raced.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSnapshot, DatalensError> {
        {
            let mut machine = self.inner.machine.lock().await;
            match machine.state() {
                AuthState::Authenticating => {
                    return Err(DatalensError::invalid("a login is already in progress"));
                }
                AuthState::Authenticated | AuthState::Refreshing => {
                    self.sign_out(&mut machine, "replaced by a new login");
                }
                AuthState::Unauthenticated | AuthState::Error => {}
            }
            machine.send(AuthEvent::Login);
        }

        let result = self.inner.backend.login(credentials).await;

        let mut machine = self.inner.machine.lock().await;
        let saved = result.and_then(|tokens| {
            self.inner.store.save_tokens(&tokens)?;
            Ok(tokens)
        });
        let tokens = match saved {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(username = %credentials.username, error = %e, "login failed");
                machine.send(AuthEvent::LoginFailure {
                    error: e.user_message(),
                });
                return Err(e);
            }
        };

        let user: Option<User> = decode_claims(&tokens.access_token)
            .inspect_err(|e| warn!(error = %e, "access token carries no readable claims"))
            .ok();
        let snapshot = machine
            .send(AuthEvent::LoginSuccess {
                tokens: tokens.clone(),
                user,
            })
            .clone();
        drop(machine);

        self.schedule_refresh(&tokens);
        info!(username = %credentials.username, "logged in");
        Ok(snapshot)
    }

    /// End the session: cancel the refresh timer, drop the stored pair, and
    /// return to `unauthenticated`.
    pub async fn logout(&self) {
        let mut machine = self.inner.machine.lock().await;
        self.sign_out(&mut machine, "logout");
    }

    /// React to the backend rejecting the session (HTTP 401).
    pub async fn expire_session(&self) {
        let mut machine = self.inner.machine.lock().await;
        warn!(state = %machine.state(), "backend rejected the session");
        self.sign_out(&mut machine, "session rejected by backend");
    }

    /// Leave the `error` state.
    pub async fn clear_error(&self) -> AuthSnapshot {
        self.inner
            .machine
            .lock()
            .await
            .send(AuthEvent::ClearError)
            .clone()
    }

    /// Renew the token pair, joining a refresh already in flight.
    pub async fn refresh(&self) -> Result<(), DatalensError> {
        let this = self.clone();
        self.inner
            .coordinator
            .coordinate(move || this.run_refresh())
            .await
            .map_err(DatalensError::from)
    }

    /// `Authorization` header value for an outbound request.
    ///
    /// Uses the stored access token while it is valid; otherwise waits for
    /// the shared refresh and re-reads the store.
    pub async fn authorization(&self) -> Result<String, DatalensError> {
        let tokens = self.inner.store.stored_tokens().ok_or_else(not_authenticated)?;
        if !is_token_expired(&tokens.access_token) {
            return Ok(bearer(&tokens));
        }

        debug!("access token expired, refreshing before request");
        self.refresh().await?;
        self.inner
            .store
            .stored_tokens()
            .map(|tokens| bearer(&tokens))
            .ok_or_else(not_authenticated)
    }

    /// Stop background work. Pending refresh timers are cancelled.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    fn sign_out(&self, machine: &mut AuthMachine, reason: &str) {
        self.cancel_timer();
        if let Err(e) = self.inner.store.remove_tokens() {
            warn!(error = %e, "failed to remove stored tokens");
        }
        machine.send(AuthEvent::Logout);
        info!(reason, "signed out");
    }

    /// Body of one shared refresh: up to `MAX_REFRESH_RETRIES` attempts, each
    /// failure reported to the machine. A rejection the backend will repeat
    /// exhausts the remaining attempts without calling it again.
    fn run_refresh(self) -> BoxFuture<'static, Result<(), RefreshFailure>> {
        async move {
            {
                let mut machine = self.inner.machine.lock().await;
                match machine.state() {
                    AuthState::Authenticated => {
                        machine.send(AuthEvent::Refresh);
                    }
                    AuthState::Refreshing => {}
                    other => {
                        return Err(RefreshFailure::new(format!("cannot refresh while {other}")));
                    }
                }
            }

            loop {
                let outcome = match self.inner.store.stored_tokens() {
                    Some(tokens) => self.inner.backend.refresh(&tokens.refresh_token).await,
                    None => Err(DatalensError::unauthenticated("no refresh token stored")),
                };

                let mut machine = self.inner.machine.lock().await;
                if machine.state() != AuthState::Refreshing {
                    return Err(RefreshFailure::new("session ended during refresh"));
                }

                let saved = outcome.and_then(|tokens| {
                    self.inner.store.save_tokens(&tokens)?;
                    Ok(tokens)
                });
                match saved {
                    Ok(tokens) => {
                        machine.send(AuthEvent::RefreshSuccess {
                            tokens: tokens.clone(),
                        });
                        drop(machine);
                        self.schedule_refresh(&tokens);
                        info!("access token refreshed");
                        return Ok(());
                    }
                    Err(e) => {
                        let error = e.user_message();
                        let snapshot = machine.send(AuthEvent::RefreshFailure {
                            error: error.clone(),
                        });
                        warn!(
                            error = %e,
                            retry_count = snapshot.context.retry_count,
                            "token refresh failed"
                        );
                        if !e.is_transient() {
                            while machine.state() == AuthState::Refreshing {
                                machine.send(AuthEvent::RefreshFailure {
                                    error: error.clone(),
                                });
                            }
                        }
                        if machine.state() != AuthState::Refreshing {
                            let reason = machine
                                .snapshot()
                                .context
                                .error
                                .clone()
                                .unwrap_or_else(|| SESSION_EXPIRED.to_string());
                            self.cancel_timer();
                            if let Err(e) = self.inner.store.remove_tokens() {
                                warn!(error = %e, "failed to remove stored tokens");
                            }
                            warn!(reason = %reason, "session ended after failed refresh");
                            return Err(RefreshFailure::new(reason));
                        }
                    }
                }
                drop(machine);
                tokio::time::sleep(self.inner.settings.retry_delay).await;
            }
        }
        .boxed()
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.timer_slot().take() {
            timer.cancel();
        }
    }

    /// Arm the timer that renews `tokens` ahead of expiry, replacing any
    /// earlier timer.
    fn schedule_refresh(&self, tokens: &AuthTokens) {
        let settings = &self.inner.settings;
        if !settings.auto_refresh {
            return;
        }
        let Some(exp) = token_expiry(&tokens.access_token) else {
            debug!("access token has no expiry, refresh timer not armed");
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no async runtime, refresh timer not armed");
            return;
        };

        let margin = i64::try_from(settings.margin.as_secs()).unwrap_or(i64::MAX);
        let now = chrono::Utc::now().timestamp();
        let wait = u64::try_from(exp.saturating_sub(margin).saturating_sub(now)).unwrap_or(0);
        let delay = Duration::from_secs(wait);

        let cancel = self.inner.shutdown.child_token();
        if let Some(previous) = self.timer_slot().replace(cancel.clone()) {
            previous.cancel();
        }

        let inner = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => debug!("refresh timer cancelled"),
                _ = tokio::time::sleep(delay) => {
                    let Some(inner) = inner.upgrade() else { return };
                    let service = AuthService { inner };
                    if let Err(e) = service.refresh().await {
                        warn!(error = %e, "scheduled token refresh failed");
                    }
                }
            }
        });
        debug!(in_secs = wait, "token refresh scheduled");
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("state", &self.inner.snapshots.borrow().value)
            .finish_non_exhaustive()
    }
}
