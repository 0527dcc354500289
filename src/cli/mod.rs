//! Command-line interface definitions for the `vmpool` binary.
//!
//! This module centralises the clap parser structures so both the main
//! binary and the build script can reuse them when generating the manual
//! page.

use clap::Parser;

/// Top-level CLI for the `vmpool` binary.
#[derive(Debug, Parser)]
#[command(
    name = "vmpool",
    about = "Manage pools of cloud VMs, their disks, snapshots, and DNS records",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// List the members of a pool.
    #[command(name = "list")]
    List {
        /// Pool to list.
        pool: String,
    },
    /// Show one pool member.
    #[command(name = "show")]
    Show {
        /// Pool the member belongs to.
        pool: String,
        /// Member VM name.
        name: String,
    },
    /// Create a pool member VM with its boot disk.
    #[command(name = "create")]
    Create {
        /// Pool to create the member in.
        pool: String,
        /// Member VM name.
        name: String,
    },
    /// Create and attach an additional blank disk to a pool member.
    #[command(name = "add-disk")]
    AddDisk {
        /// Pool the member belongs to.
        pool: String,
        /// Member VM name.
        name: String,
        /// Disk size in gigabytes.
        #[arg(long, value_name = "GB")]
        size_gb: u64,
    },
    /// Snapshot every disk attached to a pool member.
    #[command(name = "snapshot")]
    Snapshot {
        /// Pool the member belongs to.
        pool: String,
        /// Member VM name.
        name: String,
        /// Logical snapshot name shared by the whole set.
        snapshot: String,
    },
    /// Revert a pool member to a previously taken snapshot set.
    #[command(name = "revert")]
    Revert {
        /// Pool the member belongs to.
        pool: String,
        /// Member VM name.
        name: String,
        /// Logical snapshot name to revert to.
        snapshot: String,
    },
    /// Destroy a pool member and every disk and snapshot labelled for it.
    #[command(name = "destroy")]
    Destroy {
        /// Pool the member belongs to.
        pool: String,
        /// Member VM name.
        name: String,
    },
    /// Probe SSH reachability of a pool member.
    #[command(name = "ready")]
    Ready {
        /// Pool the member belongs to.
        pool: String,
        /// Member VM name.
        name: String,
    },
    /// Delete resources whose pool label matches no configured pool.
    #[command(name = "purge")]
    Purge {
        /// Allow-list entry exempting resources from deletion: a pool name,
        /// a `key=value` label token, or the empty string for unlabelled
        /// resources. Repeatable; with no entries nothing is exempt.
        #[arg(long = "allow", value_name = "ENTRY")]
        allow: Vec<String>,
    },
}
