//! Best-effort remote notification on logout.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("logout notification could not be delivered: {0}")]
    Transport(String),

    #[error("logout endpoint answered {0}")]
    Rejected(u16),
}

/// Tells the identity API that a session is ending.
///
/// The session store never depends on the outcome: local state is cleared
/// whether or not this succeeds.
#[async_trait]
pub trait LogoutNotifier: Send + Sync {
    async fn notify(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), NotifyError>;
}
