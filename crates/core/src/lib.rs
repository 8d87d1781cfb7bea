//! `curator-core` — foundation building blocks shared by the admin client crates.
//!
//! This crate contains **pure** primitives (no IO, no transport).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{RoleId, UserId};
