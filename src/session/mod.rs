//! Session store — who is logged in, and the on-device copy of it.
//!
//! SYSTEM CONTEXT
//! ==============
//! Built once at startup and shared by clone. UI code reads flags via
//! `snapshot()`/`subscribe()` and triggers credential flows; it never sees
//! an error value, only `bool` results and notices.
//!
//! DESIGN
//! ======
//! State lives in a `watch` channel so readers observe every transition.
//! All storage writes go through `write_gate`, which makes the store the only
//! writer and serializes writes without further locking.
//!
//! Ordering: authenticating transitions persist first and flip memory second;
//! logout flips memory first and clears storage second. Either way a reader
//! never sees `is_authenticated == true` without a persisted token.
//!
//! Every sign-in and sign-out bumps `epoch` under the gate. The boot check
//! records the epoch before it calls the server and applies its verdict only
//! if the epoch is unchanged, so a login or logout that lands while the check
//! is in flight always wins.
//!
//! ERROR HANDLING
//! ==============
//! Gateway failures become exactly one notice. The boot check retries
//! timeouts, keeps the cached session on network errors, and logs out on
//! anything else.

pub mod messages;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde_json::{Map, Value};
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use self::messages::AuthFlow;
use crate::api::{ApiError, AuthApi, Envelope, LoginRequest, ResetPasswordRequest, User};
use crate::notify::{Notice, Notifier};
use crate::retry::{RetryDecision, RetryError, RetryPolicy};
use crate::storage::{KeyValueStore, StorageError, TOKEN_KEY, USER_KEY};

// =============================================================================
// SESSION
// =============================================================================

/// Observable session state.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub is_authenticated: bool,
    /// True until the boot check completes.
    pub is_loading: bool,
    token: Option<String>,
}

impl Session {
    fn booting() -> Self {
        Self { is_loading: true, ..Self::default() }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn authenticate(&mut self, token: String, user: User) {
        self.token = Some(token);
        self.user = Some(user);
        self.is_authenticated = true;
    }

    fn clear(&mut self) {
        self.token = None;
        self.user = None;
        self.is_authenticated = false;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("is_authenticated", &self.is_authenticated)
            .field("is_loading", &self.is_loading)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    boot_retry: RetryPolicy,
    state: watch::Sender<Session>,
    write_gate: Mutex<()>,
    epoch: AtomicU64,
    active: AtomicBool,
}

struct Persisted {
    token: Option<String>,
    user: Option<User>,
}

impl SessionStore {
    #[must_use]
    pub fn new(
        api: Arc<dyn AuthApi>,
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        boot_retry: RetryPolicy,
    ) -> Self {
        let (state, _) = watch::channel(Session::booting());
        Self {
            inner: Arc::new(Inner {
                api,
                storage,
                notifier,
                boot_retry,
                state,
                write_gate: Mutex::new(()),
                epoch: AtomicU64::new(0),
                active: AtomicBool::new(true),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token.clone()
    }

    /// Receiver that yields every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Stop applying results. Calls still in flight complete but are ignored.
    pub fn shutdown(&self) {
        self.inner.active.store(false, Ordering::SeqCst);
        debug!("session store shut down");
    }

    fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    /// Caller holds the write gate.
    fn bump_epoch(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// True while no sign-in/sign-out happened since `epoch` was read and the
    /// store is still running. Caller holds the write gate.
    fn is_current(&self, epoch: u64) -> bool {
        self.is_active() && self.epoch() == epoch
    }

    fn notify(&self, notice: Notice) {
        if self.is_active() {
            self.inner.notifier.notify(notice);
        }
    }

    // -------------------------------------------------------------------------
    // Credential flows
    // -------------------------------------------------------------------------

    /// Log in with an email/username and password.
    ///
    /// Blank input is rejected locally without a request.
    pub async fn login(&self, identifier: &str, password: &str) -> bool {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.trim().is_empty() {
            self.notify(Notice::error(AuthFlow::Login.failure_title(), messages::MISSING_CREDENTIALS));
            return false;
        }

        let request = LoginRequest { identifier: identifier.to_owned(), password: password.to_owned() };
        let result = self.inner.api.login(&request).await;
        self.complete_authentication(AuthFlow::Login, result).await
    }

    pub async fn register(&self, user_data: &Value) -> bool {
        let result = self.inner.api.register(user_data).await;
        self.complete_authentication(AuthFlow::Register, result).await
    }

    pub async fn google_login(&self, google_data: &Value) -> bool {
        let result = self.inner.api.google_auth(google_data).await;
        self.complete_authentication(AuthFlow::Google, result).await
    }

    /// Reset a password with an emailed reset token. Session state is untouched.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> bool {
        let flow = AuthFlow::ResetPassword;
        if token.trim().is_empty() || new_password.trim().is_empty() {
            self.notify(Notice::error(flow.failure_title(), messages::MISSING_RESET_FIELDS));
            return false;
        }

        let request = ResetPasswordRequest { token: token.trim().to_owned(), new_password: new_password.to_owned() };
        match self.inner.api.reset_password(&request).await {
            Ok(envelope) if envelope.success => {
                let message = envelope.message().unwrap_or(messages::RESET_SUCCEEDED);
                self.notify(Notice::success(flow.success_title(), message));
                true
            }
            Ok(envelope) => {
                let message = envelope.message().unwrap_or(flow.fallback_message());
                self.notify(Notice::error(flow.failure_title(), message));
                false
            }
            Err(err) => {
                warn!(error = %err, "password reset failed");
                self.notify(Notice::error(flow.failure_title(), messages::describe_error(&err, flow)));
                false
            }
        }
    }

    async fn complete_authentication(&self, flow: AuthFlow, result: Result<Envelope, ApiError>) -> bool {
        if !self.is_active() {
            debug!(?flow, "store shut down; ignoring auth result");
            return false;
        }

        let envelope = match result {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(?flow, error = %err, "auth request failed");
                self.notify(Notice::error(flow.failure_title(), messages::describe_error(&err, flow)));
                return false;
            }
        };

        if !envelope.success {
            let message = envelope.message().unwrap_or(flow.fallback_message()).to_owned();
            info!(?flow, reason = %message, "auth rejected by server");
            self.notify(Notice::error(flow.failure_title(), message));
            return false;
        }

        let welcome = envelope.message().map(str::to_owned);
        let (Some(token), Some(user)) = (envelope.token.filter(|t| !t.is_empty()), envelope.user) else {
            warn!(?flow, "success envelope missing token or user");
            self.notify(Notice::error(flow.failure_title(), messages::INVALID_RESPONSE));
            return false;
        };

        if let Err(err) = self.establish(token, user).await {
            error!(?flow, error = %err, "failed to persist session");
            self.notify(Notice::error(flow.failure_title(), messages::STORAGE_FAILED));
            return false;
        }

        let name = self.user().map(|u| u.display_name().to_owned()).unwrap_or_default();
        info!(?flow, user = %name, "authenticated");
        let message = welcome.unwrap_or_else(|| format!("Signed in as {name}"));
        self.notify(Notice::success(flow.success_title(), message));
        true
    }

    /// Persist token + user, then flip memory.
    async fn establish(&self, token: String, user: User) -> Result<(), StorageError> {
        let _gate = self.inner.write_gate.lock().await;
        let user_json = serde_json::to_string(&user)?;

        self.inner.storage.set(TOKEN_KEY, &token).await?;
        if let Err(err) = self.inner.storage.set(USER_KEY, &user_json).await {
            if let Err(rollback) = self.inner.storage.remove(TOKEN_KEY).await {
                warn!(error = %rollback, "token rollback failed");
            }
            return Err(err);
        }

        self.inner.state.send_modify(|s| s.authenticate(token, user));
        self.bump_epoch();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Logout
    // -------------------------------------------------------------------------

    /// Clear the session. Safe to call repeatedly.
    pub async fn logout(&self) {
        let _gate = self.inner.write_gate.lock().await;
        self.clear_locked().await;
    }

    async fn clear_locked(&self) {
        self.inner.state.send_modify(Session::clear);
        self.bump_epoch();

        let mut complete = true;
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.inner.storage.remove(key).await {
                error!(key, error = %err, "failed to remove persisted session key");
                complete = false;
            }
        }
        if complete {
            debug!("session cleared");
        } else {
            self.notify(Notice::warning("Sign-Out Incomplete", messages::LOGOUT_INCOMPLETE));
        }
    }

    // -------------------------------------------------------------------------
    // Boot check
    // -------------------------------------------------------------------------

    /// Rehydrate the persisted session and re-verify it with the server.
    ///
    /// The cached snapshot is applied optimistically before verification.
    /// `is_loading` is false once this returns, whatever the outcome.
    pub async fn check_auth_status(&self) {
        let epoch = self.epoch();
        let persisted = self.read_persisted().await;

        if let Some(token) = persisted.token {
            if self.restore_cached(&token, persisted.user, epoch).await {
                self.verify_session(token, epoch).await;
            }
        } else {
            debug!("no persisted session");
        }

        if self.is_active() {
            self.inner.state.send_modify(|s| s.is_loading = false);
        }
    }

    async fn read_persisted(&self) -> Persisted {
        let storage = &self.inner.storage;
        let token = match storage.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(err) => {
                warn!(error = %err, "failed to read persisted token");
                None
            }
        };
        let user = match storage.get(USER_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!(error = %err, "discarding corrupt user snapshot");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to read persisted user");
                None
            }
        };
        Persisted { token, user }
    }

    /// Apply the cached snapshot unless a sign-in/sign-out already happened.
    async fn restore_cached(&self, token: &str, user: Option<User>, epoch: u64) -> bool {
        let _gate = self.inner.write_gate.lock().await;
        if !self.is_current(epoch) {
            debug!("session changed before boot check; skipping verification");
            return false;
        }
        if let Some(user) = user {
            debug!(user = %user.display_name(), "restoring cached session");
            let token = token.to_owned();
            self.inner.state.send_modify(|s| s.authenticate(token, user));
        } else {
            warn!("persisted token without user snapshot; verifying before sign-in");
        }
        true
    }

    async fn verify_session(&self, token: String, epoch: u64) {
        let api = Arc::clone(&self.inner.api);
        let call_token = token.clone();
        let result = self
            .inner
            .boot_retry
            .run(
                move |attempt| {
                    let api = Arc::clone(&api);
                    let token = call_token.clone();
                    async move {
                        debug!(attempt, "verifying session with server");
                        api.get_profile(&token).await
                    }
                },
                |err: &ApiError| if err.is_timeout() { RetryDecision::Retry } else { RetryDecision::Stop },
            )
            .await;

        if !self.is_active() {
            debug!("store shut down; ignoring verification result");
            return;
        }

        match result {
            Ok(envelope) if envelope.success => self.accept_verified(token, envelope.user, epoch).await,
            Ok(envelope) => {
                info!(reason = envelope.message().unwrap_or(""), "server rejected persisted session");
                self.expire_session(messages::SESSION_EXPIRED, epoch).await;
            }
            Err(RetryError { error, attempts, exhausted: true }) => {
                warn!(attempts, error = %error, "session verification kept timing out");
                self.expire_session(messages::SESSION_VERIFY_TIMEOUT, epoch).await;
            }
            Err(RetryError { error, .. }) if error.is_network_error() => {
                info!(error = %error, "offline during boot check; keeping cached session");
            }
            Err(RetryError { error: error @ ApiError::Status { status: 401 | 403, .. }, .. }) => {
                info!(error = %error, "persisted token rejected");
                self.expire_session(messages::SESSION_EXPIRED, epoch).await;
            }
            Err(RetryError { error, .. }) => {
                warn!(error = %error, "session verification failed");
                self.expire_session(messages::SESSION_VERIFY_FAILED, epoch).await;
            }
        }
    }

    async fn accept_verified(&self, token: String, user: Option<User>, epoch: u64) {
        let _gate = self.inner.write_gate.lock().await;
        if !self.is_current(epoch) {
            debug!("session changed during verification; dropping result");
            return;
        }

        let Some(user) = user else {
            if self.is_authenticated() {
                debug!("verification returned no profile; keeping cached user");
            } else {
                warn!("verification returned no profile and no cached user");
                self.sign_out_locked(messages::SESSION_VERIFY_FAILED).await;
            }
            return;
        };

        self.persist_user(&user).await;
        info!(user = %user.display_name(), "session verified");
        self.inner.state.send_modify(|s| s.authenticate(token, user));
    }

    /// Log out the session the boot check verified, if it is still the current one.
    async fn expire_session(&self, message: &str, epoch: u64) {
        let _gate = self.inner.write_gate.lock().await;
        if !self.is_current(epoch) {
            debug!("session changed during verification; keeping it");
            return;
        }
        self.sign_out_locked(message).await;
    }

    async fn sign_out_locked(&self, message: &str) {
        self.notify(Notice::warning("Signed Out", message));
        self.clear_locked().await;
    }

    // -------------------------------------------------------------------------
    // Profile maintenance
    // -------------------------------------------------------------------------

    /// Shallow-merge `partial` into the current user and re-persist it.
    ///
    /// Returns `false` when nobody is signed in or the snapshot could not be saved.
    pub async fn update_user(&self, partial: Map<String, Value>) -> bool {
        let _gate = self.inner.write_gate.lock().await;
        let Some(mut user) = self.user() else {
            warn!("update_user called without a signed-in user");
            return false;
        };
        user.merge(partial);

        let raw = match serde_json::to_string(&user) {
            Ok(raw) => raw,
            Err(err) => {
                error!(error = %err, "failed to encode user snapshot");
                return false;
            }
        };
        if let Err(err) = self.inner.storage.set(USER_KEY, &raw).await {
            error!(error = %err, "failed to persist updated user");
            return false;
        }
        self.inner.state.send_modify(|s| s.user = Some(user));
        true
    }

    /// Re-fetch the profile and overwrite the snapshot. Failures are logged only.
    pub async fn refresh_user(&self) {
        let Some(token) = self.token() else {
            debug!("refresh_user skipped: no token");
            return;
        };

        let user = match self.inner.api.get_profile(&token).await {
            Ok(Envelope { success: true, user: Some(user), .. }) => user,
            Ok(envelope) => {
                warn!(reason = envelope.message().unwrap_or(""), "profile refresh returned no user");
                return;
            }
            Err(err) => {
                warn!(error = %err, "profile refresh failed");
                return;
            }
        };

        if !self.is_active() {
            return;
        }
        let _gate = self.inner.write_gate.lock().await;
        if self.token().as_deref() != Some(token.as_str()) {
            debug!("session changed during refresh; dropping stale profile");
            return;
        }
        self.persist_user(&user).await;
        self.inner.state.send_modify(|s| s.user = Some(user));
    }

    /// Write the user snapshot; caller holds the write gate.
    async fn persist_user(&self, user: &User) {
        let raw = match serde_json::to_string(user) {
            Ok(raw) => raw,
            Err(err) => {
                error!(error = %err, "failed to encode user snapshot");
                return;
            }
        };
        if let Err(err) = self.inner.storage.set(USER_KEY, &raw).await {
            warn!(error = %err, "failed to persist user snapshot");
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
