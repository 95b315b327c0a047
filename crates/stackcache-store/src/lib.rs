//! # stackcache-store
//!
//! Cache engine for stackcache.
//!
//! A hierarchical, persistence-backed cache for the resource catalog of an
//! OpenStack-style cloud: a tree of named namespaces whose leaves are
//! durable key-value stores, addressed like nested mappings.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  CacheRoot (bootstrap, service catalog)      │
//! ├──────────────────────────────────────────────┤
//! │  NamespaceTree (auto-vivifying node map)     │
//! ├──────────────────────────────────────────────┤
//! │  LeafCache (HashMap mirror, write-through)   │
//! ├──────────────────────────────────────────────┤
//! │  DurableStore (rusqlite, key-ordered scans)  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use stackcache_store::{CacheConfig, CacheRoot};
//!
//! let config = CacheConfig::from_env()?;
//! let mut root = CacheRoot::bootstrap("data/cache", &config)?;
//!
//! root.leaf_mut("nova", "flavors")?
//!     .set("m1.small", serde_json::json!({ "vcpus": 1, "ram": 2048 }))?;
//! root.flush_all()?;
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod naming;
pub mod root;
pub mod tree;

// ── re-exports ───────────────────────────────────────────────────────

pub use cache::LeafCache;
pub use config::{ApiConfig, CacheConfig, Credentials};
pub use db::DurableStore;
pub use error::{CacheError, Result};
pub use root::{CacheRoot, SERVICE_CATALOG};
pub use tree::{NamespaceTree, Node};
