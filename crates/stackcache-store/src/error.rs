//! Error types for the stackcache cache engine.
//!
//! All cache subsystems surface errors through [`CacheError`], which is the
//! single error type returned by every public API in this crate. Each variant
//! carries enough context for callers to decide how to handle the failure
//! without inspecting opaque strings.
//!
//! A load-time deserialization fallback is deliberately *not* an error: it is
//! recorded as a `tracing` warning and counted on the owning
//! [`LeafCache`](crate::cache::LeafCache).

use std::path::PathBuf;

/// Unified error type for the stackcache cache engine.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    // -- Storage errors -----------------------------------------------------
    /// The on-disk store could not be created or opened. Fatal during
    /// bootstrap; callers outside bootstrap may retry at their own policy.
    #[error("storage unavailable at {path}: {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },

    /// `get` or `delete` addressed a key that is not present.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    // -- Namespace errors ---------------------------------------------------
    /// An operation would have replaced a leaf cache with a plain value (or
    /// the other way round) at the given tree path.
    #[error("namespace conflict at {path}")]
    NamespaceConflict { path: String },

    // -- Configuration errors -----------------------------------------------
    /// A required configuration value was absent at the boundary.
    #[error("missing configuration value: {var}")]
    MissingConfig { var: String },

    // -- Underlying errors --------------------------------------------------
    /// SQLite error from `rusqlite`.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the filesystem.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Construct a [`CacheError::KeyNotFound`] for `key`.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Construct a [`CacheError::NamespaceConflict`] from path segments.
    pub fn conflict(path: &[&str]) -> Self {
        Self::NamespaceConflict {
            path: path.join("/"),
        }
    }
}

/// Convenience alias used throughout the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
