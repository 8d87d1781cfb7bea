use std::borrow::{Borrow, Cow};
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "create_role"). The server
/// may add codes the client has never heard of; those stay representable here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(Cow<'static, str>);

impl PermissionCode {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PermissionCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for PermissionCode {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl core::fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for PermissionCode {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PermissionCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Flat authorization fact table: permission code -> granted flag.
///
/// A code is granted only when it is present *and* mapped to `true`. Absent
/// codes and codes mapped to `false` are both "not granted"; there is no
/// "unknown" answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(HashMap<PermissionCode, bool>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an arbitrary JSON value into a permission set.
    ///
    /// - object: boolean entries are kept as-is; any other value type is
    ///   recorded as not granted (`"true"` is not `true`)
    /// - array: every string element becomes a granted code
    /// - anything else: empty set
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(entries) => entries
                .iter()
                .map(|(code, flag)| {
                    (
                        PermissionCode::new(code.clone()),
                        matches!(flag, Value::Bool(true)),
                    )
                })
                .collect(),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|code| (PermissionCode::new(code.to_owned()), true))
                .collect(),
            _ => Self::default(),
        }
    }

    /// Rebuild a permission set from its persisted string form.
    ///
    /// Accepts both the object shape and the legacy array-of-codes shape.
    /// Unparseable input degrades to an empty set.
    pub fn from_stored(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_json(&value),
            Err(err) => {
                tracing::warn!(error = %err, "stored permissions are not valid JSON; using empty set");
                Self::default()
            }
        }
    }

    pub fn insert(&mut self, code: impl Into<PermissionCode>, granted: bool) {
        self.0.insert(code.into(), granted);
    }

    pub fn grants(&self, code: &str) -> bool {
        self.0.get(code).copied().unwrap_or(false)
    }

    pub fn grants_any<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        codes.into_iter().any(|code| self.grants(code.as_ref()))
    }

    /// True when every listed code is granted; vacuously true for no codes.
    pub fn grants_all<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        codes.into_iter().all(|code| self.grants(code.as_ref()))
    }

    /// Codes mapped to exactly `true`, in no particular order.
    pub fn granted_codes(&self) -> Vec<PermissionCode> {
        self.0
            .iter()
            .filter(|(_, granted)| **granted)
            .map(|(code, _)| code.clone())
            .collect()
    }

    /// Number of entries, granted or not.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(PermissionCode, bool)> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = (PermissionCode, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
