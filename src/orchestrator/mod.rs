//! Pool lifecycle orchestration over the remote compute surface.
//!
//! The orchestrator is stateless between calls: identity lives in labels,
//! status lives in the remote system, and every read is a live lookup. It is
//! the only component with cross-resource-kind knowledge; everything below it
//! handles exactly one resource kind or one operation handle.

mod create;
mod destroy;
mod error;
mod snapshot;

use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::warn;

use crate::compute::{ComputeApi, InstanceResource, LabelUpdate, VmStatus};
use crate::config::{PoolConfig, ProviderConfig};
use crate::dns::{DnsApi, DnsSynchronizer};
use crate::labels::{self, FilterExpression, Labels};
use crate::naming;
use crate::poller::OperationPoller;

pub use error::PoolError;

const SSH_PORT: u16 = 22;
const READY_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Transport retries for delete-instance waits. Delete is the step most
/// sensitive to losing track of completion, so it gets a larger budget than
/// the default poller.
const DELETE_TRANSPORT_RETRIES: u32 = 10;

/// Normalised view of one pool member.
///
/// Status, boot time, and addresses are read back from the remote system
/// after each completed operation, never computed locally. The template is
/// reported from pool configuration because the remote system does not expose
/// template provenance after creation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VirtualMachine {
    /// Instance name, unique within the project.
    pub name: String,
    /// Hostname members are reachable under.
    pub hostname: String,
    /// Boot image template of the owning pool.
    pub template: String,
    /// Owning pool name.
    pub pool: String,
    /// RFC 3339 creation timestamp, remote-owned.
    pub boot_time: String,
    /// Lifecycle status, remote-owned.
    pub status: VmStatus,
    /// Zone short name.
    pub zone: String,
    /// Machine type short name.
    pub machine_type: String,
    /// Label set.
    pub labels: Labels,
    /// Opaque concurrency token required by label-mutating calls.
    pub label_fingerprint: String,
    /// Primary internal address, when assigned and parseable.
    pub ip: Option<IpAddr>,
}

/// Counts of resources removed by a purge sweep.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PurgeSummary {
    /// Instances deleted (deletion awaited).
    pub instances: usize,
    /// Disks whose deletion was submitted.
    pub disks: usize,
    /// Snapshots whose deletion was submitted.
    pub snapshots: usize,
}

/// Composes the compute surface, operation poller, and DNS synchroniser into
/// the public pool operations.
#[derive(Clone, Debug)]
pub struct PoolManager<C, D> {
    compute: C,
    dns: Option<DnsSynchronizer<D>>,
    config: ProviderConfig,
    poller: OperationPoller,
    delete_poller: OperationPoller,
}

impl<C, D> PoolManager<C, D>
where
    C: ComputeApi,
    D: DnsApi,
{
    /// Creates a manager over the given configuration and clients.
    #[must_use]
    pub fn new(config: ProviderConfig, compute: C, dns: Option<DnsSynchronizer<D>>) -> Self {
        Self {
            compute,
            dns,
            config,
            poller: OperationPoller::default(),
            delete_poller: OperationPoller::new(DELETE_TRANSPORT_RETRIES),
        }
    }

    /// Overrides both pollers; used by tests to keep waits fast.
    #[must_use]
    pub const fn with_pollers(
        mut self,
        poller: OperationPoller,
        delete_poller: OperationPoller,
    ) -> Self {
        self.poller = poller;
        self.delete_poller = delete_poller;
        self
    }

    /// Lists the VMs whose `pool` label equals `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Config`] when the pool is unknown and
    /// [`PoolError::Compute`] when the listing fails.
    pub async fn list_pool_members(&self, pool: &str) -> Result<Vec<VirtualMachine>, PoolError> {
        let pool_cfg = self.config.pool(pool)?;
        let filter = FilterExpression::new().eq(labels::POOL, &pool_cfg.name).build();
        let instances = self.compute.list_instances(&pool_cfg.zone, Some(&filter)).await?;
        Ok(instances.into_iter().map(|instance| self.normalize(pool_cfg, instance)).collect())
    }

    /// Fetches one pool member; `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Config`] when the pool is unknown and
    /// [`PoolError::Compute`] for remote failures other than 404.
    pub async fn get_vm(&self, pool: &str, name: &str) -> Result<Option<VirtualMachine>, PoolError> {
        let pool_cfg = self.config.pool(pool)?;
        let instance = self.compute.get_instance(&pool_cfg.zone, name).await?;
        Ok(instance.map(|resource| self.normalize(pool_cfg, resource)))
    }

    /// Merges `extra` into the VM's label set.
    ///
    /// The remote set-labels call replaces the whole set and demands the
    /// fingerprint of the labels it replaces, so the VM is fetched first and
    /// the merged set written back under that fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::VmNotFound`] when the VM does not exist, plus the
    /// usual configuration, compute, and wait failures.
    pub async fn set_vm_labels(
        &self,
        pool: &str,
        name: &str,
        extra: &Labels,
    ) -> Result<(), PoolError> {
        let pool_cfg = self.config.pool(pool)?;
        let instance = self.require_vm(pool_cfg, pool, name).await?;
        let mut merged = instance.labels.clone();
        merged.merge(extra);
        let update =
            LabelUpdate { labels: merged, label_fingerprint: instance.label_fingerprint.clone() };
        let operation = self.compute.set_instance_labels(&pool_cfg.zone, name, &update).await?;
        self.poller.await_done(&self.compute, operation).await?;
        Ok(())
    }

    /// Probes whether the member accepts TCP connections on the SSH port.
    ///
    /// A liveness probe, not a capability check: `true` on connect success,
    /// `false` on any error including timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Config`] when the pool is unknown.
    pub async fn is_ready(&self, pool: &str, name: &str) -> Result<bool, PoolError> {
        self.config.pool(pool)?;
        let host = self.host_for(name);
        let connect = timeout(READY_CONNECT_TIMEOUT, TcpStream::connect((host.as_str(), SSH_PORT)))
            .await;
        Ok(matches!(connect, Ok(Ok(_))))
    }

    /// Fetches an instance that must exist for the calling operation.
    async fn require_vm(
        &self,
        pool_cfg: &PoolConfig,
        pool: &str,
        name: &str,
    ) -> Result<InstanceResource, PoolError> {
        self.compute
            .get_instance(&pool_cfg.zone, name)
            .await?
            .ok_or_else(|| PoolError::VmNotFound { pool: pool.to_owned(), name: name.to_owned() })
    }

    fn normalize(&self, pool_cfg: &PoolConfig, instance: InstanceResource) -> VirtualMachine {
        let hostname =
            instance.hostname.clone().unwrap_or_else(|| self.host_for(&instance.name));
        let zone = if instance.zone.is_empty() {
            pool_cfg.zone.clone()
        } else {
            naming::short_name(&instance.zone).to_owned()
        };
        let ip = instance
            .primary_internal_ip()
            .and_then(|address| IpAddr::from_str(address).ok());
        VirtualMachine {
            hostname,
            template: pool_cfg.template.clone(),
            pool: pool_cfg.name.clone(),
            boot_time: instance.creation_timestamp,
            status: instance.status,
            zone,
            machine_type: naming::short_name(&instance.machine_type).to_owned(),
            labels: instance.labels,
            label_fingerprint: instance.label_fingerprint,
            ip,
            name: instance.name,
        }
    }

    fn host_for(&self, name: &str) -> String {
        self.config
            .domain
            .as_ref()
            .map_or_else(|| name.to_owned(), |domain| format!("{name}.{domain}"))
    }

    /// Upserts the member's A record; best-effort.
    async fn sync_dns(&self, vm: &VirtualMachine) {
        let Some(dns) = &self.dns else { return };
        let Some(ip) = vm.ip else {
            warn!(vm = %vm.name, "skipping DNS upsert: no internal address assigned");
            return;
        };
        if let Err(err) = dns.upsert(&vm.name, ip).await {
            warn!(vm = %vm.name, error = %err, "DNS record upsert failed");
        }
    }

    /// Removes the member's A record; best-effort.
    async fn remove_dns(&self, name: &str) {
        let Some(dns) = &self.dns else { return };
        if let Err(err) = dns.remove(name).await {
            warn!(vm = %name, error = %err, "DNS record removal failed");
        }
    }
}
