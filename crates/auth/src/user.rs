//! Identity snapshot captured at login time.

use curator_core::{RoleId, UserId};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{PermissionSet, RoleRef};

/// Projection of the authenticated user, as persisted by the session store.
///
/// The permission set is duplicated here from the session for convenience of
/// views that only hold the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default, deserialize_with = "permissions_from_any_shape")]
    pub permissions: PermissionSet,
}

impl UserProfile {
    pub fn role_ref(&self) -> RoleRef {
        RoleRef::new(self.role_id, self.role_name.clone())
    }

    /// Best label for display: username, then email, then id.
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .or_else(|| self.id.map(|id| format!("user #{id}")))
            .unwrap_or_else(|| "unknown user".to_string())
    }
}

fn permissions_from_any_shape<'de, D>(deserializer: D) -> Result<PermissionSet, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(PermissionSet::from_json(&value))
}
