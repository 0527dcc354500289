//! Error type for pool lifecycle operations.

use thiserror::Error;

use crate::compute::ComputeError;
use crate::config::ConfigError;
use crate::poller::WaitError;

/// Errors raised by [`PoolManager`](super::PoolManager) operations.
///
/// Remote 404s are handled per call: `get_vm` and `destroy_vm` absorb them,
/// while operations that need a live VM surface them as [`Self::VmNotFound`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PoolError {
    /// The pool or provider configuration is unusable. Never retried.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The operation requires a VM that does not exist.
    #[error("virtual machine '{name}' does not exist in pool '{pool}'")]
    VmNotFound {
        /// Pool the VM was looked up in.
        pool: String,
        /// VM name that failed to resolve.
        name: String,
    },
    /// A snapshot of that logical name already exists for the VM.
    #[error("snapshot '{snapshot}' already exists for VM '{vm}'")]
    SnapshotExists {
        /// VM the snapshot belongs to.
        vm: String,
        /// Logical snapshot name.
        snapshot: String,
    },
    /// No snapshot set of that logical name exists for the VM.
    #[error("snapshot '{snapshot}' does not exist for VM '{vm}'")]
    SnapshotMissing {
        /// VM the snapshot was looked up for.
        vm: String,
        /// Logical snapshot name.
        snapshot: String,
    },
    /// A snapshot resource lacks a label the revert sequence depends on.
    #[error("snapshot '{snapshot}' is missing required label '{key}'")]
    SnapshotLabel {
        /// Snapshot resource name.
        snapshot: String,
        /// Missing label key.
        key: &'static str,
    },
    /// A remote call failed outside an operation wait.
    #[error(transparent)]
    Compute(#[from] ComputeError),
    /// An awaited operation failed or its polling exhausted retries.
    #[error(transparent)]
    Wait(#[from] WaitError),
}
