//! Bootstrap configuration.
//!
//! All externally supplied values (the admin credential record and the API
//! endpoint/version fields) are collected into a [`CacheConfig`] once, at
//! the process boundary, and handed to
//! [`CacheRoot::bootstrap`](crate::root::CacheRoot::bootstrap). Nothing in
//! the cache engine reads the environment after this point.
//!
//! The fields mirror the standard `OS_*` environment variables of an
//! OpenStack RC file; [`CacheConfig::from_env`] reads exactly those.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CacheError, Result};

/// Credential record for one cloud user.
///
/// Stored as-is in the `users` leaf cache, keyed by username; all fields are
/// opaque strings the cache never validates or transforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub project_name: String,
    pub project_domain_id: String,
    pub user_domain_id: String,
}

impl Credentials {
    /// The JSON value persisted for this record.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// API endpoint and per-service version fields.
///
/// Serialized field names match the `api` namespace keys callers address,
/// e.g. `api["os_compute_api_version"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub auth_url: String,
    #[serde(rename = "os_compute_api_version")]
    pub compute_api_version: String,
    #[serde(rename = "os_identity_api_version")]
    pub identity_api_version: String,
    #[serde(rename = "os_image_api_version")]
    pub image_api_version: String,
    #[serde(rename = "os_network_api_version")]
    pub network_api_version: String,
    #[serde(rename = "os_volume_api_version")]
    pub volume_api_version: String,
}

impl ApiConfig {
    /// The JSON value installed at the tree's `api` node.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Everything [`CacheRoot::bootstrap`](crate::root::CacheRoot::bootstrap)
/// needs from the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub credentials: Credentials,
    pub api: ApiConfig,
}

impl CacheConfig {
    /// Build the configuration from the process environment (`OS_*`
    /// variables).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::MissingConfig`] naming the first absent
    /// variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// `from_env` is a thin wrapper over this; tests inject a map instead of
    /// mutating process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn require<F>(lookup: &F, var: &'static str) -> Result<String>
        where
            F: Fn(&str) -> Option<String>,
        {
            lookup(var).ok_or_else(|| CacheError::MissingConfig { var: var.into() })
        }

        Ok(Self {
            credentials: Credentials {
                username: require(&lookup, "OS_USERNAME")?,
                password: require(&lookup, "OS_PASSWORD")?,
                project_name: require(&lookup, "OS_PROJECT_NAME")?,
                project_domain_id: require(&lookup, "OS_PROJECT_DOMAIN_ID")?,
                user_domain_id: require(&lookup, "OS_USER_DOMAIN_ID")?,
            },
            api: ApiConfig {
                auth_url: require(&lookup, "OS_AUTH_URL")?,
                compute_api_version: require(&lookup, "OS_COMPUTE_API_VERSION")?,
                identity_api_version: require(&lookup, "OS_IDENTITY_API_VERSION")?,
                image_api_version: require(&lookup, "OS_IMAGE_API_VERSION")?,
                network_api_version: require(&lookup, "OS_NETWORK_API_VERSION")?,
                volume_api_version: require(&lookup, "OS_VOLUME_API_VERSION")?,
            },
        })
    }
}

// ── tests ────────────────────────────────────────────────────────────
