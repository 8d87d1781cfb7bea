//! Route/view gating on top of the session store.
//!
//! Views describe what they need as an [`AccessRequirement`] and render from
//! the returned [`AccessDecision`]. Nothing here renders or redirects.

use serde::Serialize;

use crate::{PermissionCode, Session, SessionStore};

/// What a route or view requires before it may render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Any logged-in session.
    Authenticated,
    /// One specific permission.
    Permission(PermissionCode),
    /// At least one of the listed permissions.
    AnyOf(Vec<PermissionCode>),
    /// Every listed permission (an empty list only needs a login).
    AllOf(Vec<PermissionCode>),
    /// The superuser flag or a privileged role.
    Superuser,
}

impl AccessRequirement {
    pub fn permission(code: impl Into<PermissionCode>) -> Self {
        Self::Permission(code.into())
    }

    pub fn any_of<I, C>(codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<PermissionCode>,
    {
        Self::AnyOf(codes.into_iter().map(Into::into).collect())
    }

    pub fn all_of<I, C>(codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<PermissionCode>,
    {
        Self::AllOf(codes.into_iter().map(Into::into).collect())
    }
}

/// Outcome of evaluating an [`AccessRequirement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Session still rehydrating; render neither content nor a denial.
    Pending,
    Granted,
    /// No session; send the user to the login screen.
    LoginRequired,
    /// Logged in but lacking access. `missing` lists the codes that would
    /// have satisfied the requirement (empty for `Superuser`).
    Forbidden { missing: Vec<PermissionCode> },
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

/// Decide access for a session snapshot.
///
/// Superuser status is not an implicit bypass: the API already resolves
/// every code to `true` for superusers, so only `Superuser` consults it.
pub fn evaluate(session: &Session, loading: bool, requirement: &AccessRequirement) -> AccessDecision {
    if loading {
        return AccessDecision::Pending;
    }
    if !session.is_authenticated() {
        return AccessDecision::LoginRequired;
    }

    let forbidden = |missing: Vec<PermissionCode>| AccessDecision::Forbidden { missing };

    match requirement {
        AccessRequirement::Authenticated => AccessDecision::Granted,
        AccessRequirement::Permission(code) if session.has_permission(code.as_str()) => {
            AccessDecision::Granted
        }
        AccessRequirement::Permission(code) => forbidden(vec![code.clone()]),
        // An empty list can never be satisfied.
        AccessRequirement::AnyOf(codes) if session.has_any_permission(codes) => AccessDecision::Granted,
        AccessRequirement::AnyOf(codes) => forbidden(codes.clone()),
        AccessRequirement::AllOf(codes) => {
            let missing: Vec<PermissionCode> = codes
                .iter()
                .filter(|code| !session.has_permission(code.as_str()))
                .cloned()
                .collect();
            if missing.is_empty() {
                AccessDecision::Granted
            } else {
                forbidden(missing)
            }
        }
        AccessRequirement::Superuser if session.is_superuser() => AccessDecision::Granted,
        AccessRequirement::Superuser => forbidden(Vec::new()),
    }
}

impl SessionStore {
    /// Evaluate a requirement against the current session.
    pub fn check(&self, requirement: &AccessRequirement) -> AccessDecision {
        let decision = evaluate(self.session(), self.is_loading(), requirement);
        tracing::debug!(?requirement, ?decision, "access check");
        decision
    }
}
