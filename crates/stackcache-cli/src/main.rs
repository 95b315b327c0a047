//! CLI entry point for stackcache.
//!
//! This binary provides the `stackcache` command with subcommands for
//! bootstrapping the cache, point reads and writes, key listing, raw store
//! scans, flushing, and seeding generated records.
//!
//! Every subcommand bootstraps the cache root from the `OS_*` environment
//! (optionally via a `.env` file) before operating, so the on-disk state is
//! always addressed through the same namespace layout the library builds.

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stackcache_store::{CacheConfig, CacheRoot, NamespaceTree, Node, naming};

use crate::cli::{Cli, Commands};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init => cmd_init(&cli.path),
        Commands::Get { namespace, key } => cmd_get(&cli.path, &namespace, &key),
        Commands::Set {
            namespace,
            key,
            value,
        } => cmd_set(&cli.path, &namespace, &key, &value),
        Commands::Del { namespace, key } => cmd_del(&cli.path, &namespace, &key),
        Commands::Keys { namespace } => cmd_keys(&cli.path, &namespace),
        Commands::Scan { namespace } => cmd_scan(&cli.path, &namespace),
        Commands::Flush { namespace } => cmd_flush(&cli.path, namespace.as_deref()),
        Commands::Seed { namespace, count } => cmd_seed(&cli.path, &namespace, count),
    }
}

/// Route `tracing` output to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Bootstrap the cache root under `path` from the environment.
fn open_root(path: &Path) -> Result<CacheRoot> {
    let config = CacheConfig::from_env().context("incomplete OS_* environment")?;
    let root = CacheRoot::bootstrap(path, &config).context("cache bootstrap failed")?;
    info!(path = %root.path().display(), "cache ready");
    Ok(root)
}

/// Split a `service/resource` namespace argument into tree path segments.
fn segments(namespace: &str) -> Vec<&str> {
    namespace.split('/').filter(|s| !s.is_empty()).collect()
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn cmd_init(path: &Path) -> Result<()> {
    let root = open_root(path)?;

    println!("cache root: {}", root.path().display());
    print_namespace(root.tree(), 0);
    Ok(())
}

fn print_namespace(ns: &NamespaceTree, depth: usize) {
    let indent = "  ".repeat(depth);
    for (name, node) in ns.iter() {
        match node {
            Node::Namespace(inner) => {
                println!("{indent}{name}/");
                print_namespace(inner, depth + 1);
            }
            Node::Leaf(leaf) => {
                println!("{indent}{name}  [leaf, {} entries]", leaf.len());
            }
            Node::Value(_) => {
                println!("{indent}{name}  [value]");
            }
        }
    }
}

fn cmd_get(path: &Path, namespace: &str, key: &str) -> Result<()> {
    let root = open_root(path)?;
    let leaf = root.tree().leaf(&segments(namespace))?;

    let value = leaf.get(key)?;
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_set(path: &Path, namespace: &str, key: &str, value: &str) -> Result<()> {
    let mut root = open_root(path)?;
    let leaf = root.tree_mut().leaf_mut(&segments(namespace))?;

    // Same leniency as the load path: valid JSON is stored structured,
    // anything else verbatim as a string.
    let value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    leaf.set(key, value)?;

    println!("{namespace}/{key} written");
    Ok(())
}

fn cmd_del(path: &Path, namespace: &str, key: &str) -> Result<()> {
    let mut root = open_root(path)?;
    let leaf = root.tree_mut().leaf_mut(&segments(namespace))?;

    leaf.delete(key)?;
    println!("{namespace}/{key} deleted");
    Ok(())
}

fn cmd_keys(path: &Path, namespace: &str) -> Result<()> {
    let root = open_root(path)?;
    let leaf = root.tree().leaf(&segments(namespace))?;

    let mut keys: Vec<&String> = leaf.keys().collect();
    keys.sort();
    for key in keys {
        println!("{key}");
    }
    Ok(())
}

fn cmd_scan(path: &Path, namespace: &str) -> Result<()> {
    let root = open_root(path)?;
    let leaf = root.tree().leaf(&segments(namespace))?;

    for (key, raw) in leaf.store().scan()? {
        println!("{key}\t{raw}");
    }
    Ok(())
}

fn cmd_flush(path: &Path, namespace: Option<&str>) -> Result<()> {
    let mut root = open_root(path)?;

    match namespace {
        Some(namespace) => {
            root.tree_mut().leaf_mut(&segments(namespace))?.flush()?;
            println!("{namespace} flushed");
        }
        None => {
            let flushed = root.flush_all()?;
            println!("{flushed} namespaces flushed");
        }
    }
    Ok(())
}

fn cmd_seed(path: &Path, namespace: &str, count: usize) -> Result<()> {
    let mut root = open_root(path)?;
    let leaf = root.tree_mut().leaf_mut(&segments(namespace))?;

    for _ in 0..count {
        let name = naming::random_name("user-", 8);
        let record = serde_json::json!({
            "username": name,
            "password": naming::random_password(),
            "email": naming::random_email(),
            "enabled": true,
        });
        leaf.set(name.clone(), record)?;
        println!("{namespace}/{name} seeded");
    }
    Ok(())
}

// ── tests ────────────────────────────────────────────────────────────
