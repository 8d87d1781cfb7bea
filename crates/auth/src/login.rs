use curator_core::{RoleId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{PermissionSet, RoleRef, UserProfile};

/// Raw payload returned by the identity API's login endpoint.
///
/// Every field is optional here; [`LoginResponse::accept`] decides whether the
/// payload is complete enough to establish a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
    /// Code -> flag mapping, kept raw until normalized.
    #[serde(default)]
    pub permissions: Option<Value>,
}

/// User block nested in a [`LoginResponse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_superuser: Option<bool>,
    #[serde(default)]
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub role_name: Option<String>,
}

/// Why a login payload was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoginRejected {
    #[error("login response is missing")]
    MissingResponse,

    #[error("login response has no user")]
    MissingUser,

    #[error("login response has no access token")]
    MissingAccessToken,
}

/// Everything the session store persists after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedLogin {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub permissions: PermissionSet,
    pub role: RoleRef,
    pub user: UserProfile,
}

fn present(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

impl LoginResponse {
    /// Validate a login payload and derive the session projection.
    ///
    /// - No IO
    /// - No panics
    /// - Empty token strings count as absent
    pub fn accept(response: Option<LoginResponse>) -> Result<AcceptedLogin, LoginRejected> {
        let response = response.ok_or(LoginRejected::MissingResponse)?;
        let user = response.user.ok_or(LoginRejected::MissingUser)?;
        let access_token =
            present(response.access_token).ok_or(LoginRejected::MissingAccessToken)?;
        let refresh_token = present(response.refresh_token);

        let permissions = response
            .permissions
            .as_ref()
            .map(PermissionSet::from_json)
            .unwrap_or_default();

        let profile = UserProfile {
            id: user.id,
            username: user.username,
            email: user.email,
            is_superuser: user.is_superuser.unwrap_or(false),
            role_id: user.role_id,
            role_name: user.role_name,
            permissions: permissions.clone(),
        };

        Ok(AcceptedLogin {
            access_token,
            refresh_token,
            permissions,
            role: profile.role_ref(),
            user: profile,
        })
    }
}
