//! `curator-auth` — client-side session and authorization state.
//!
//! Holds who is logged in and which permission codes they were granted, and
//! answers the access questions views and routes ask. This crate is
//! intentionally decoupled from HTTP and concrete storage: both are injected
//! through [`SessionStorage`] and [`LogoutNotifier`].

pub mod catalog;
pub mod guard;
pub mod login;
pub mod notifier;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod storage;
pub mod store;
pub mod user;

pub use catalog::{KnownPermission, UnknownPermission};
pub use guard::{AccessDecision, AccessRequirement, evaluate};
pub use login::{AcceptedLogin, LoginRejected, LoginResponse, LoginUser};
pub use notifier::{LogoutNotifier, NotifyError};
pub use permissions::{PermissionCode, PermissionSet};
pub use roles::{PRIVILEGED_ROLE_NAMES, RoleRef};
pub use session::Session;
pub use storage::{MemoryStorage, SessionStorage, StorageError, StorageKey};
pub use store::{LoginError, SessionState, SessionStore};
pub use user::UserProfile;
