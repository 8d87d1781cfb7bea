//! Persistent backends for [`curator_auth::SessionStorage`].

mod file;
mod sqlite;

use std::path::PathBuf;

use anyhow::Context;

pub use file::FileStorage;
pub use sqlite::SqliteStorage;

/// Resolve the app data directory: `{os_data_dir}/curator`.
///
/// The directory is created if it does not exist yet.
pub fn app_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut dir = base;
    dir.push("curator");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create app data directory at {:?}", dir))?;

    Ok(dir)
}
