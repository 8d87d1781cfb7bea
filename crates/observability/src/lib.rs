//! Process-wide logging setup shared by the curator binaries.

/// Initialize tracing for the process.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    crate::tracing::init(crate::tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, formats).
pub mod tracing;
