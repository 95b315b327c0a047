//! CLI argument definitions for stackcache.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// stackcache — hierarchical resource cache for an OpenStack-style cloud.
#[derive(Parser)]
#[command(
    name = "stackcache",
    version,
    about = "stackcache — hierarchical resource cache",
    long_about = "A persistence-backed cache of cloud resources, organized as \
                  service/resource namespaces with durable key-value leaves."
)]
pub struct Cli {
    /// Directory the cache lives under.
    #[arg(long, short, global = true, default_value = "data/cache")]
    pub path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bootstrap the cache and print the namespace layout.
    Init,

    /// Read one cached value.
    Get {
        /// Namespace path, e.g. `nova/flavors` or `users`.
        namespace: String,
        /// Entry key within the namespace.
        key: String,
    },

    /// Write one value (write-through to disk).
    Set {
        /// Namespace path, e.g. `nova/flavors` or `users`.
        namespace: String,
        /// Entry key within the namespace.
        key: String,
        /// JSON value; text that is not valid JSON is stored as a string.
        value: String,
    },

    /// Delete one entry from a namespace.
    Del {
        /// Namespace path, e.g. `nova/flavors` or `users`.
        namespace: String,
        /// Entry key within the namespace.
        key: String,
    },

    /// List the keys held in a namespace.
    Keys {
        /// Namespace path, e.g. `nova/flavors` or `users`.
        namespace: String,
    },

    /// Dump the raw persisted entries of a namespace, in key order.
    Scan {
        /// Namespace path, e.g. `nova/flavors` or `users`.
        namespace: String,
    },

    /// Flush one namespace durably to disk, or every leaf when omitted.
    Flush {
        /// Namespace path; omit to flush the whole tree.
        namespace: Option<String>,
    },

    /// Insert generated credential records into a namespace.
    Seed {
        /// Namespace path, e.g. `keystone/users`.
        namespace: String,

        /// How many records to generate.
        #[arg(long, short, default_value_t = 1)]
        count: usize,
    },
}
