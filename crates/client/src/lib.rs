//! `curator-client`
//!
//! **Responsibility:** device-side adapters for the admin client's session.
//!
//! This crate provides:
//! - Persistent session storage (JSON file or SQLite)
//! - The HTTP identity client used to log in
//! - Best-effort logout notification
//! - Env-driven configuration and a [`ClientContext`] that wires it together
//!
//! Authorization decisions themselves live in `curator-auth`.

pub mod config;
pub mod context;
pub mod identity;
pub mod notifier;
pub mod storage;

pub use config::{ClientConfig, ConfigError, StorageBackend};
pub use context::{ClientContext, SignInError};
pub use identity::{IdentityClient, IdentityError};
pub use notifier::HttpLogoutNotifier;
pub use storage::{FileStorage, SqliteStorage};
