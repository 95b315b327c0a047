//! Cache root bootstrap.
//!
//! [`CacheRoot`] builds the whole [`NamespaceTree`] in one deterministic
//! sequence at startup: a durable `users` leaf seeded with the configured
//! credential record, a plain `api` node holding the endpoint and version
//! fields, and one durable leaf per resource category in the service
//! catalog, each bound to its own directory under the cache root.
//!
//! Bootstrap is all-or-nothing. The first directory or store failure aborts
//! it; the cache never runs with a partially built namespace.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cache::LeafCache;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tree::{NamespaceTree, Node};

/// Resource categories per service, mirrored as `<root>/<service>/<resource>`
/// store directories and `service → resource` tree paths.
pub const SERVICE_CATALOG: &[(&str, &[&str])] = &[
    ("cinder", &["volumes"]),
    ("glance", &["images"]),
    ("keystone", &["projects", "users"]),
    ("neutron", &["networks", "routers", "ports", "security_groups"]),
    ("nova", &["flavors", "servers"]),
    ("swift", &["containers", "objects"]),
];

/// The populated namespace tree plus the directory everything lives under.
pub struct CacheRoot {
    tree: NamespaceTree,
    path: PathBuf,
}

impl CacheRoot {
    /// Build the cache under `path` from `config`.
    ///
    /// Opens (or creates) every store directory, loads every persisted leaf,
    /// and seeds the fixed entries. Safe to run on every process start: the
    /// seeded records are rewritten with the configured values and all other
    /// persisted entries are reloaded as-is.
    ///
    /// # Errors
    ///
    /// Any directory or store failure surfaces immediately (usually as
    /// [`CacheError::StorageUnavailable`]) and aborts the bootstrap.
    pub fn bootstrap(path: impl AsRef<Path>, config: &CacheConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_dir(&path)?;
        info!(path = %path.display(), "bootstrapping cache root");

        let mut tree = NamespaceTree::new();

        // Durable user credentials, keyed by username.
        let mut users = LeafCache::open(path.join("users"))?;
        users.set(
            config.credentials.username.clone(),
            config.credentials.to_value()?,
        )?;
        tree.install_leaf(&["users"], users)?;

        // API endpoint and versions: plain in-memory value, never persisted.
        tree.set_value(&["api"], config.api.to_value()?)?;

        // One durable leaf per resource category.
        for &(service, resources) in SERVICE_CATALOG {
            let service_dir = path.join(service);
            ensure_dir(&service_dir)?;
            for &resource in resources {
                let leaf = LeafCache::open(service_dir.join(resource))?;
                tree.install_leaf(&[service, resource], leaf)?;
            }
        }

        info!(services = SERVICE_CATALOG.len(), "cache root ready");
        Ok(Self { tree, path })
    }

    /// The directory every leaf store lives under.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The namespace tree.
    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    /// The namespace tree, mutably.
    pub fn tree_mut(&mut self) -> &mut NamespaceTree {
        &mut self.tree
    }

    /// The leaf cache for one catalog resource, e.g. `("nova", "flavors")`.
    pub fn leaf(&self, service: &str, resource: &str) -> Result<&LeafCache> {
        self.tree.leaf(&[service, resource])
    }

    /// Mutable access to one catalog resource leaf.
    pub fn leaf_mut(&mut self, service: &str, resource: &str) -> Result<&mut LeafCache> {
        self.tree.leaf_mut(&[service, resource])
    }

    /// The top-level `users` credential leaf.
    pub fn users(&self) -> Result<&LeafCache> {
        self.tree.leaf(&["users"])
    }

    /// Mutable access to the `users` credential leaf.
    pub fn users_mut(&mut self) -> Result<&mut LeafCache> {
        self.tree.leaf_mut(&["users"])
    }

    /// The plain `api` configuration value.
    pub fn api(&self) -> Result<&serde_json::Value> {
        self.tree.value(&["api"])
    }

    /// Flush every leaf cache in the tree; returns how many were flushed.
    ///
    /// A durability barrier over the whole cache: reconciles all in-place
    /// edits and checkpoints every store.
    pub fn flush_all(&mut self) -> Result<usize> {
        fn walk(ns: &mut NamespaceTree) -> Result<usize> {
            let mut flushed = 0;
            for (_, node) in ns.iter_mut() {
                match node {
                    Node::Leaf(leaf) => {
                        leaf.flush()?;
                        flushed += 1;
                    }
                    Node::Namespace(inner) => flushed += walk(inner)?,
                    Node::Value(_) => {}
                }
            }
            Ok(flushed)
        }

        let flushed = walk(&mut self.tree)?;
        info!(leaves = flushed, "flushed all leaf caches");
        Ok(flushed)
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| CacheError::StorageUnavailable {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })
}

// ── tests ────────────────────────────────────────────────────────────
