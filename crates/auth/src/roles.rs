use curator_core::RoleId;
use serde::{Deserialize, Serialize};

/// Role names that confer superuser status regardless of the user flag.
pub const PRIVILEGED_ROLE_NAMES: [&str; 2] = ["Super", "Admin"];

/// Denormalized role reference captured at login.
///
/// The client never sees the role-to-permission mapping; it only keeps the
/// role's id and display name next to the resolved permission set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    #[serde(default)]
    pub id: Option<RoleId>,
    #[serde(default)]
    pub name: Option<String>,
}

impl RoleRef {
    pub fn new(id: Option<RoleId>, name: Option<String>) -> Self {
        Self { id, name }
    }

    /// Exact, case-sensitive match against [`PRIVILEGED_ROLE_NAMES`].
    pub fn is_privileged(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| PRIVILEGED_ROLE_NAMES.contains(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privileged_names_match_exactly() {
        assert!(RoleRef::new(None, Some("Admin".into())).is_privileged());
        assert!(RoleRef::new(None, Some("Super".into())).is_privileged());
        assert!(!RoleRef::new(None, Some("admin".into())).is_privileged());
        assert!(!RoleRef::new(Some(RoleId::new(5)), Some("Editor".into())).is_privileged());
        assert!(!RoleRef::default().is_privileged());
    }

    #[test]
    fn tolerates_missing_fields_when_parsed() {
        let role: RoleRef = serde_json::from_str("{}").unwrap();
        assert_eq!(role, RoleRef::default());
    }
}
