use crate::{AcceptedLogin, PermissionCode, PermissionSet, RoleRef, UserProfile};

/// The single authoritative record of who is logged in.
///
/// All five fields are replaced together; there are no partial updates.
/// `is_authenticated` and `is_superuser` are derived on every call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub permissions: PermissionSet,
    pub role: Option<RoleRef>,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Explicit superuser flag on the user, or a privileged role name.
    pub fn is_superuser(&self) -> bool {
        let flagged = self.user.as_ref().is_some_and(|u| u.is_superuser);
        let privileged_role = self.role.as_ref().is_some_and(RoleRef::is_privileged);
        flagged || privileged_role
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.permissions.grants(code)
    }

    pub fn has_any_permission<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.permissions.grants_any(codes)
    }

    pub fn has_all_permissions<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.permissions.grants_all(codes)
    }

    pub fn granted_permission_keys(&self) -> Vec<PermissionCode> {
        self.permissions.granted_codes()
    }
}

impl From<AcceptedLogin> for Session {
    fn from(login: AcceptedLogin) -> Self {
        Self {
            access_token: Some(login.access_token),
            refresh_token: login.refresh_token,
            permissions: login.permissions,
            role: Some(login.role),
            user: Some(login.user),
        }
    }
}

// Tokens are credentials; only their presence is printed.
impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("permissions", &self.permissions)
            .field("role", &self.role)
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::RoleId;

    fn with_role(name: &str, flagged: bool) -> Session {
        Session {
            access_token: Some("t".into()),
            role: Some(RoleRef::new(Some(RoleId::new(1)), Some(name.into()))),
            user: Some(UserProfile {
                is_superuser: flagged,
                ..UserProfile::default()
            }),
            ..Session::default()
        }
    }

    #[test]
    fn superuser_is_an_or_of_flag_and_role() {
        assert!(with_role("Editor", true).is_superuser());
        assert!(with_role("Admin", false).is_superuser());
        assert!(with_role("Super", false).is_superuser());
        assert!(!with_role("Editor", false).is_superuser());
        assert!(!Session::default().is_superuser());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let session = Session {
            access_token: Some(String::new()),
            ..Session::default()
        };
        assert!(!session.is_authenticated());
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let session = Session {
            access_token: Some("secret-access".into()),
            refresh_token: Some("secret-refresh".into()),
            ..Session::default()
        };
        let printed = format!("{session:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }
}
