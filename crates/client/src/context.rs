//! Wiring of configuration, storage, identity client and session store.

use std::sync::Arc;

use anyhow::Context;
use curator_auth::{LoginError, MemoryStorage, SessionStorage, SessionStore};
use thiserror::Error;

use crate::config::{ClientConfig, StorageBackend};
use crate::identity::{IdentityClient, IdentityError};
use crate::notifier::HttpLogoutNotifier;
use crate::storage::{FileStorage, SqliteStorage};

#[derive(Debug, Error)]
pub enum SignInError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("login response rejected: {0}")]
    Session(#[from] LoginError),
}

/// Everything a front end needs to authenticate and answer permission queries.
#[derive(Debug)]
pub struct ClientContext {
    config: ClientConfig,
    store: SessionStore,
    identity: IdentityClient,
}

impl ClientContext {
    /// Open storage, attach the logout notifier if configured, and rehydrate.
    pub async fn bootstrap(config: ClientConfig) -> anyhow::Result<Self> {
        let storage = open_storage(&config).await?;
        let mut store = SessionStore::new(storage);

        if let Some(path) = config.logout_path.as_deref() {
            let notifier = HttpLogoutNotifier::new(&config.api_url, path, config.http_timeout)
                .context("failed to build logout notifier")?;
            tracing::debug!(url = notifier.url(), "remote logout notification enabled");
            store = store.with_notifier(Arc::new(notifier));
        }

        let identity = IdentityClient::new(&config.api_url, config.http_timeout)
            .context("failed to build identity client")?;

        let state = store.rehydrate().await;
        tracing::info!(?state, backend = ?config.storage, "client context ready");

        Ok(Self::from_parts(config, store, identity))
    }

    pub fn from_parts(config: ClientConfig, store: SessionStore, identity: IdentityClient) -> Self {
        Self {
            config,
            store,
            identity,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn identity(&self) -> &IdentityClient {
        &self.identity
    }

    /// Authenticate with the API and establish the session from its response.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), SignInError> {
        let response = self.identity.authenticate(email.trim(), password).await?;
        self.store.login(Some(response)).await?;
        Ok(())
    }

    /// Sign in with an identity provider's ID token (Google sign-in).
    pub async fn sign_in_with_id_token(&mut self, id_token: &str) -> Result<(), SignInError> {
        let response = self.identity.authenticate_with_id_token(id_token.trim()).await?;
        self.store.login(Some(response)).await?;
        Ok(())
    }

    /// Clear the session. The local session is always gone afterwards; `false`
    /// only means some step (server notification or storage cleanup) failed
    /// and is meant for a UI warning.
    pub async fn sign_out(&mut self) -> bool {
        self.store.logout().await
    }
}

async fn open_storage(config: &ClientConfig) -> anyhow::Result<Arc<dyn SessionStorage>> {
    let path = config.storage_path.as_deref();
    let storage: Arc<dyn SessionStorage> = match (config.storage, path) {
        (StorageBackend::File, Some(path)) => Arc::new(FileStorage::new(path)),
        (StorageBackend::File, None) => Arc::new(FileStorage::at_default_location()?),
        (StorageBackend::Sqlite, Some(path)) => Arc::new(SqliteStorage::open_path(path).await?),
        (StorageBackend::Sqlite, None) => Arc::new(SqliteStorage::at_default_location().await?),
        (StorageBackend::Memory, _) => Arc::new(MemoryStorage::new()),
    };
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use curator_auth::{SessionState, StorageKey};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::identity::{ID_TOKEN_LOGIN_PATH, LOGIN_PATH};

    fn login_body() -> serde_json::Value {
        json!({
            "message": "Login successful",
            "access_token": "t1",
            "refresh_token": "r1",
            "token_type": "bearer",
            "user": {"id": 1, "username": "alice", "email": "alice@example.com", "role_id": 5, "role_name": "Editor"},
            "permissions": {"read_image": true, "delete_image": false}
        })
    }

    async fn context_for(server: &MockServer, storage: MemoryStorage) -> ClientContext {
        let config = ClientConfig {
            api_url: server.uri(),
            storage: StorageBackend::Memory,
            logout_path: Some("/api/logout".into()),
            ..ClientConfig::default()
        };
        let notifier = HttpLogoutNotifier::new(&server.uri(), "/api/logout", Duration::from_secs(5)).unwrap();
        let mut store = SessionStore::new(Arc::new(storage)).with_notifier(Arc::new(notifier));
        store.rehydrate().await;
        let identity = IdentityClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        ClientContext::from_parts(config, store, identity)
    }

    #[tokio::test]
    async fn sign_in_then_sign_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let storage = MemoryStorage::new();
        let mut ctx = context_for(&server, storage.clone()).await;
        assert_eq!(ctx.store().state(), SessionState::Anonymous);

        ctx.sign_in(" alice@example.com ", "pw").await.unwrap();
        assert_eq!(ctx.store().state(), SessionState::Authenticated);
        assert!(ctx.store().has_permission("read_image"));
        assert!(!ctx.store().has_permission("delete_image"));
        assert_eq!(storage.raw(StorageKey::AccessToken).as_deref(), Some("t1"));

        assert!(ctx.sign_out().await);
        assert_eq!(ctx.store().state(), SessionState::Anonymous);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn sign_out_when_server_rejects_still_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/logout"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let storage = MemoryStorage::new();
        let mut ctx = context_for(&server, storage.clone()).await;
        ctx.sign_in("alice@example.com", "pw").await.unwrap();

        assert!(!ctx.sign_out().await);
        assert_eq!(ctx.store().state(), SessionState::Anonymous);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn id_token_sign_in_establishes_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ID_TOKEN_LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Successful",
                "data": login_body(),
                "count": null
            })))
            .mount(&server)
            .await;

        let storage = MemoryStorage::new();
        let mut ctx = context_for(&server, storage.clone()).await;

        ctx.sign_in_with_id_token("google-jwt").await.unwrap();
        assert_eq!(ctx.store().state(), SessionState::Authenticated);
        assert!(ctx.store().has_permission("read_image"));
        assert_eq!(storage.raw(StorageKey::RefreshToken).as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn response_without_token_leaves_session_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok", "user": {"id": 1}})))
            .mount(&server)
            .await;

        let storage = MemoryStorage::new();
        let mut ctx = context_for(&server, storage.clone()).await;

        let err = ctx.sign_in("alice@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, SignInError::Session(LoginError::Rejected(_))));
        assert!(!ctx.store().is_authenticated());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn bootstrap_with_file_storage_rehydrates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let storage = FileStorage::new(&path);
        storage.set(StorageKey::AccessToken, "t1").await.unwrap();
        storage
            .set(StorageKey::Permissions, r#"{"read_image": true}"#)
            .await
            .unwrap();

        let config = ClientConfig {
            storage: StorageBackend::File,
            storage_path: Some(path),
            ..ClientConfig::default()
        };
        let ctx = ClientContext::bootstrap(config).await.unwrap();
        assert_eq!(ctx.store().state(), SessionState::Authenticated);
        assert!(ctx.store().has_permission("read_image"));
    }
}
