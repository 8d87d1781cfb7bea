//! HTTP implementation of the logout notification.

use std::time::Duration;

use async_trait::async_trait;
use curator_auth::{LogoutNotifier, NotifyError};
use serde_json::json;

/// POSTs `{"refresh_token": ...}` (bearer-authenticated) to a logout endpoint.
#[derive(Debug, Clone)]
pub struct HttpLogoutNotifier {
    http: reqwest::Client,
    url: String,
}

impl HttpLogoutNotifier {
    pub fn new(api_url: &str, path: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: format!("{}/{}", api_url.trim_end_matches('/'), path.trim_start_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LogoutNotifier for HttpLogoutNotifier {
    async fn notify(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), NotifyError> {
        let mut req = self
            .http
            .post(&self.url)
            .json(&json!({ "refresh_token": refresh_token }));
        if let Some(token) = access_token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(resp.status().as_u16()))
        }
    }
}
