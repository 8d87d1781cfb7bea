//! Device-local persistence seam for the session store.
//!
//! The store only talks to [`SessionStorage`]; concrete backends (files,
//! SQLite, browser storage) live outside this crate. [`MemoryStorage`] is the
//! in-process backend used by tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

/// The five keys a session occupies in device-local storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    Permissions,
    Role,
    User,
}

impl StorageKey {
    pub const ALL: [StorageKey; 5] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::Permissions,
        StorageKey::Role,
        StorageKey::User,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StorageKey::AccessToken => "access_token",
            StorageKey::RefreshToken => "refresh_token",
            StorageKey::Permissions => "permissions",
            StorageKey::Role => "role",
            StorageKey::User => "user",
        }
    }
}

impl core::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read '{key}': {reason}")]
    Read { key: String, reason: String },

    #[error("failed to write '{key}': {reason}")]
    Write { key: String, reason: String },
}

impl StorageError {
    pub fn read(key: StorageKey, reason: impl ToString) -> Self {
        Self::Read {
            key: key.as_str().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(key: StorageKey, reason: impl ToString) -> Self {
        Self::Write {
            key: key.as_str().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// String key/value storage scoped to this device.
///
/// Every operation may fail; callers decide how to degrade.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: StorageKey) -> Result<(), StorageError>;

    /// Drop every session key at once.
    async fn clear(&self) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<StorageKey, String>,
    fail_reads: bool,
    fail_writes: bool,
    fail_clear: bool,
    /// Writes (set/remove) left before every later write fails.
    writes_before_outage: Option<usize>,
    /// Successful `set` calls left before a single injected failure.
    sets_before_failure: Option<usize>,
}

impl MemoryState {
    fn check_write(&mut self, key: StorageKey) -> Result<(), StorageError> {
        match self.writes_before_outage {
            Some(0) => self.fail_writes = true,
            Some(remaining) => self.writes_before_outage = Some(remaining - 1),
            None => {}
        }
        if self.fail_writes {
            return Err(StorageError::write(key, "injected write failure"));
        }
        Ok(())
    }
}

/// In-process storage backend.
///
/// Clones share the same underlying map, so a test can keep a handle and
/// inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }

    /// Seed a raw value directly, bypassing fault injection.
    pub fn insert_raw(&self, key: StorageKey, value: impl Into<String>) {
        if let Ok(mut state) = self.state() {
            state.values.insert(key, value.into());
        }
    }

    pub fn raw(&self, key: StorageKey) -> Option<String> {
        self.state().ok().and_then(|s| s.values.get(&key).cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.state().map(|s| s.values.is_empty()).unwrap_or(true)
    }

    /// Make every subsequent read fail.
    pub fn fail_reads(&self, enabled: bool) {
        if let Ok(mut state) = self.state() {
            state.fail_reads = enabled;
        }
    }

    /// Make every subsequent `set`/`remove` fail. `clear` has its own switch.
    pub fn fail_writes(&self, enabled: bool) {
        if let Ok(mut state) = self.state() {
            state.fail_writes = enabled;
        }
    }

    /// Make `clear` fail.
    pub fn fail_clear(&self, enabled: bool) {
        if let Ok(mut state) = self.state() {
            state.fail_clear = enabled;
        }
    }

    /// Let `n` more writes (set/remove) through, then fail every write.
    pub fn fail_writes_after(&self, n: usize) {
        if let Ok(mut state) = self.state() {
            state.writes_before_outage = Some(n);
        }
    }

    /// Let `n` more `set` calls through, fail the next one, then recover.
    pub fn fail_one_set_after(&self, n: usize) {
        if let Ok(mut state) = self.state() {
            state.sets_before_failure = Some(n);
        }
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let state = self.state()?;
        if state.fail_reads {
            return Err(StorageError::read(key, "injected read failure"));
        }
        Ok(state.values.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let mut state = self.state()?;
        state.check_write(key)?;
        match state.sets_before_failure {
            Some(0) => {
                state.sets_before_failure = None;
                return Err(StorageError::write(key, "quota exceeded"));
            }
            Some(remaining) => state.sets_before_failure = Some(remaining - 1),
            None => {}
        }
        state.values.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let mut state = self.state()?;
        state.check_write(key)?;
        state.values.remove(&key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.state()?;
        if state.fail_clear {
            return Err(StorageError::Unavailable("injected clear failure".to_string()));
        }
        state.values.clear();
        Ok(())
    }
}
