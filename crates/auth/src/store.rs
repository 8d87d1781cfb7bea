//! Session/authorization store.
//!
//! Single source of truth for "who is logged in and what may they do".
//! Constructed explicitly with its storage and (optional) logout notifier;
//! there is no process-global instance.
//!
//! State machine: `Uninitialized -> Loading -> { Authenticated | Anonymous }`,
//! then cycling between the last two via `login` / `logout`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    LoginRejected, LoginResponse, LogoutNotifier, PermissionCode, PermissionSet, RoleRef, Session,
    SessionStorage, StorageError, StorageKey, UserProfile,
};

/// Observable lifecycle state of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Error)]
pub enum LoginError {
    /// The payload arrived but is missing required fields.
    #[error("login rejected: {0}")]
    Rejected(#[from] LoginRejected),

    /// The payload is not shaped like a login response at all.
    #[error("malformed login payload: {0}")]
    Malformed(String),

    #[error("failed to encode session for storage: {0}")]
    Encode(#[from] serde_json::Error),

    /// Persisting the session failed; in-memory state was left untouched.
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    notifier: Option<Arc<dyn LogoutNotifier>>,
    session: Session,
    phase: Phase,
    state_tx: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Uninitialized);
        Self {
            storage,
            notifier: None,
            session: Session::default(),
            phase: Phase::Uninitialized,
            state_tx,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn LogoutNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Rebuild the session from device-local storage.
    ///
    /// Runs once; later calls (or calls after a `login`/`logout` already
    /// settled the session) are no-ops. Never fails: unreadable or malformed
    /// values degrade to their empty/absent defaults.
    pub async fn rehydrate(&mut self) -> SessionState {
        if self.phase != Phase::Uninitialized {
            debug!(state = ?self.state(), "rehydrate skipped; session already settled");
            return self.state();
        }

        self.phase = Phase::Loading;
        self.publish();

        let access_token = self.read(StorageKey::AccessToken).await.filter(|t| !t.is_empty());
        let refresh_token = self.read(StorageKey::RefreshToken).await.filter(|t| !t.is_empty());
        let permissions = self
            .read(StorageKey::Permissions)
            .await
            .map(|raw| PermissionSet::from_stored(&raw))
            .unwrap_or_default();
        let role = self.read_json::<RoleRef>(StorageKey::Role).await;
        let user = self.read_json::<UserProfile>(StorageKey::User).await;

        self.session = Session {
            access_token,
            refresh_token,
            permissions,
            role,
            user,
        };
        self.phase = Phase::Ready;
        self.publish();

        info!(
            authenticated = self.session.is_authenticated(),
            permissions = self.session.permissions.len(),
            "session rehydrated"
        );
        self.state()
    }

    /// Establish a session from an identity API login response.
    ///
    /// On any error the in-memory session is left exactly as it was.
    pub async fn login(&mut self, response: Option<LoginResponse>) -> Result<(), LoginError> {
        let accepted = LoginResponse::accept(response).inspect_err(|reason| {
            error!(%reason, "login response rejected; session unchanged");
        })?;

        let next = Session::from(accepted);
        let entries = encode(&next)?;

        if let Err(err) = self.write_entries(&entries).await {
            error!(error = %err, "failed to persist login; restoring previous session in storage");
            self.restore_persisted().await;
            return Err(err.into());
        }

        self.session = next;
        self.phase = Phase::Ready;
        self.publish();

        info!(
            user = ?self.session.user.as_ref().map(UserProfile::display_name),
            role = ?self.session.role.as_ref().and_then(|r| r.name.as_deref()),
            permissions = self.session.permissions.len(),
            superuser = self.session.is_superuser(),
            "login successful"
        );
        Ok(())
    }

    /// [`login`](Self::login) for an untyped JSON payload (`null` included).
    pub async fn login_value(&mut self, payload: Value) -> Result<(), LoginError> {
        let response = serde_json::from_value::<Option<LoginResponse>>(payload).map_err(|err| {
            error!(error = %err, "login payload has unexpected shape; session unchanged");
            LoginError::Malformed(err.to_string())
        })?;
        self.login(response).await
    }

    /// End the session.
    ///
    /// Local state and storage are cleared before the remote notification is
    /// sent, so a slow or unreachable endpoint never keeps credentials around.
    /// The return value only tells whether every step (remote notification
    /// included) went cleanly; it must not be used to decide whether the user
    /// is logged out.
    pub async fn logout(&mut self) -> bool {
        let access = self.session.access_token.take();
        let refresh = self.session.refresh_token.take();

        let mut clean = true;
        let mut removal_failed = false;
        for key in StorageKey::ALL {
            if let Err(err) = self.storage.remove(key).await {
                warn!(%key, error = %err, "failed to remove session key");
                removal_failed = true;
            }
        }
        if removal_failed {
            clean = false;
            if let Err(err) = self.storage.clear().await {
                error!(error = %err, "failed to clear session storage; persisted state may linger");
            }
        }

        self.session = Session::default();
        self.phase = Phase::Ready;
        self.publish();

        if let Some(notifier) = &self.notifier {
            if access.is_some() || refresh.is_some() {
                if let Err(err) = notifier.notify(access.as_deref(), refresh.as_deref()).await {
                    warn!(error = %err, "logout notification failed; session already cleared locally");
                    clean = false;
                }
            }
        }

        info!(clean, "logout complete");
        clean
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Uninitialized => SessionState::Uninitialized,
            Phase::Loading => SessionState::Loading,
            Phase::Ready if self.session.is_authenticated() => SessionState::Authenticated,
            Phase::Ready => SessionState::Anonymous,
        }
    }

    /// True until the first rehydration (or login/logout) has settled.
    /// Views should hold off on access-denied rendering meanwhile.
    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Ready
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_superuser(&self) -> bool {
        self.session.is_superuser()
    }

    pub fn has_permission(&self, code: &str) -> bool {
        let granted = self.session.has_permission(code);
        debug!(permission = code, granted, "permission check");
        granted
    }

    pub fn has_any_permission<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.session.has_any_permission(codes)
    }

    pub fn has_all_permissions<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.session.has_all_permissions(codes)
    }

    pub fn granted_permission_keys(&self) -> Vec<PermissionCode> {
        self.session.granted_permission_keys()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.session.refresh_token.as_deref()
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.session.permissions
    }

    pub fn role(&self) -> Option<&RoleRef> {
        self.session.role.as_ref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.session.user.as_ref()
    }

    /// Watch lifecycle transitions (rehydrated, logged in, logged out).
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Storage plumbing
    // ─────────────────────────────────────────────────────────────────────

    fn publish(&self) {
        self.state_tx.send_replace(self.state());
    }

    async fn read(&self, key: StorageKey) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(%key, error = %err, "failed to read session key; treating as absent");
                None
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let raw = self.read(key).await?;
        match serde_json::from_str::<Option<T>>(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(%key, error = %err, "stored value is not valid JSON; treating as absent");
                None
            }
        }
    }

    /// Write a full session encoding.
    ///
    /// The access token is dropped first and written last: rehydration treats
    /// a missing token as logged out, so an interrupted write can never pair
    /// a new token with another session's user, role or permissions.
    async fn write_entries(&self, entries: &[(StorageKey, Option<String>)]) -> Result<(), StorageError> {
        self.storage.remove(StorageKey::AccessToken).await?;

        let mut access_token = None;
        for (key, value) in entries {
            match (key, value) {
                (StorageKey::AccessToken, value) => access_token = value.as_deref(),
                (key, Some(value)) => self.storage.set(*key, value).await?,
                (key, None) => self.storage.remove(*key).await?,
            }
        }

        if let Some(token) = access_token {
            self.storage.set(StorageKey::AccessToken, token).await?;
        }
        Ok(())
    }

    /// Put storage back in line with the in-memory session after a failed write.
    async fn restore_persisted(&self) {
        let entries = match encode(&self.session) {
            Ok(entries) => entries,
            Err(err) => {
                error!(error = %err, "failed to encode current session for restore");
                return;
            }
        };
        if let Err(err) = self.write_entries(&entries).await {
            warn!(error = %err, "failed to restore storage; it may drift until the next login/logout");
        }
    }
}

/// Storage representation of a session; `None` means "key absent".
fn encode(session: &Session) -> Result<Vec<(StorageKey, Option<String>)>, serde_json::Error> {
    if !session.is_authenticated() {
        return Ok(StorageKey::ALL.iter().map(|key| (*key, None)).collect());
    }

    Ok(vec![
        (StorageKey::AccessToken, session.access_token.clone()),
        (StorageKey::RefreshToken, session.refresh_token.clone()),
        (
            StorageKey::Permissions,
            Some(serde_json::to_string(&session.permissions)?),
        ),
        (
            StorageKey::Role,
            session.role.as_ref().map(serde_json::to_string).transpose()?,
        ),
        (
            StorageKey::User,
            session.user.as_ref().map(serde_json::to_string).transpose()?,
        ),
    ])
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .field("session", &self.session)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}
