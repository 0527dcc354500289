//! Pool-oriented lifecycle orchestration for cloud VMs.
//!
//! The crate turns a small set of high-level pool operations (create,
//! add-disk, snapshot, revert, destroy, purge, readiness-check) into ordered
//! sequences of asynchronous remote operations, each polled to completion,
//! retried on transient transport failure, and reconciled across instances,
//! disks, snapshots, and an optional DNS record. Identity is label-based;
//! there is no local persistence and no rollback.

pub mod compute;
pub mod config;
pub mod dns;
pub mod gcp;
pub mod labels;
pub mod naming;
pub mod orchestrator;
pub mod poller;
#[cfg(test)]
pub(crate) mod test_support;

pub use compute::{ComputeApi, ComputeError, ComputeFuture, Operation, OperationStatus, VmStatus};
pub use config::{ConfigError, PoolConfig, ProviderConfig};
pub use dns::{DnsApi, DnsError, DnsSynchronizer};
pub use gcp::{GcpCompute, GcpDns};
pub use labels::{FilterExpression, Labels, should_ignore};
pub use orchestrator::{PoolError, PoolManager, PurgeSummary, VirtualMachine};
pub use poller::{OperationPoller, WaitError};
