//! Member VM and disk creation.

use tracing::info;

use crate::compute::{
    AttachedDiskSpec, ComputeApi, ComputeError, DiskInitializeParams, DiskSpec, InstanceSpec,
    NetworkInterfaceSpec,
};
use crate::config::PoolConfig;
use crate::dns::DnsApi;
use crate::labels::Labels;
use crate::naming;

use super::{PoolError, PoolManager, VirtualMachine};

impl<C, D> PoolManager<C, D>
where
    C: ComputeApi,
    D: DnsApi,
{
    /// Creates a pool member named `name` and returns its normalised view.
    ///
    /// The boot disk is created inline from the pool template as
    /// `{name}-disk0`; instance and disk both carry the `{vm, pool}` label
    /// set. After the creation operation completes, the instance is read back
    /// and its A record upserted when DNS is configured.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Config`] for unknown pools. A remote 404 raised
    /// by the insert itself (for example a missing template) propagates
    /// unchanged as the creation failure.
    pub async fn create_vm(&self, pool: &str, name: &str) -> Result<VirtualMachine, PoolError> {
        let pool_cfg = self.config.pool(pool)?;
        let member_labels = Labels::for_instance(name, &pool_cfg.name);
        let spec = InstanceSpec {
            name: name.to_owned(),
            machine_type: machine_type_path(pool_cfg),
            disks: vec![AttachedDiskSpec {
                boot: true,
                auto_delete: false,
                device_name: Some(naming::disk_name(name, 0)),
                initialize_params: Some(DiskInitializeParams {
                    disk_name: naming::disk_name(name, 0),
                    source_image: pool_cfg.template.clone(),
                    disk_type: Some(pool_cfg.disk_type.clone()),
                    labels: member_labels.clone(),
                }),
                source: None,
            }],
            network_interfaces: vec![NetworkInterfaceSpec {
                network: pool_cfg.network.clone(),
                subnetwork: pool_cfg.subnetwork.clone(),
            }],
            labels: member_labels,
            hostname: self.config.domain.as_ref().map(|domain| format!("{name}.{domain}")),
        };

        info!(pool, vm = name, "creating instance");
        let operation = self.compute.insert_instance(&pool_cfg.zone, &spec).await?;
        self.poller.await_done(&self.compute, operation).await?;

        let instance = self
            .compute
            .get_instance(&pool_cfg.zone, name)
            .await?
            .ok_or_else(|| PoolError::VmNotFound { pool: pool.to_owned(), name: name.to_owned() })?;
        let vm = self.normalize(pool_cfg, instance);
        self.sync_dns(&vm).await;
        Ok(vm)
    }

    /// Creates a blank disk of `size_gb` and attaches it to the member.
    ///
    /// The disk index is the member's current attached-disk count, so the
    /// first added disk is `{name}-disk1`. There is no compensation when the
    /// attach fails after the insert succeeded; the orphaned disk keeps its
    /// `vm` label and is collected by [`destroy_vm`](Self::destroy_vm)'s disk
    /// sweep.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::VmNotFound`] when the member does not exist, plus
    /// the usual configuration, compute, and wait failures.
    pub async fn create_disk(&self, pool: &str, name: &str, size_gb: u64) -> Result<(), PoolError> {
        let pool_cfg = self.config.pool(pool)?;
        let instance = self.require_vm(pool_cfg, pool, name).await?;
        let disk_name = naming::disk_name(name, instance.disks.len());
        let spec = DiskSpec {
            name: disk_name.clone(),
            size_gb: Some(size_gb.to_string()),
            source_snapshot: None,
            disk_type: Some(pool_cfg.disk_type.clone()),
            labels: Labels::for_disk(name, &pool_cfg.name),
        };

        info!(pool, vm = name, disk = %disk_name, size_gb, "creating disk");
        let operation = self.compute.insert_disk(&pool_cfg.zone, &spec).await?;
        self.poller.await_done(&self.compute, operation).await?;
        self.attach_existing_disk(pool_cfg, name, &disk_name, false).await
    }

    /// Attaches the already-created disk `disk_name` to `instance`.
    pub(super) async fn attach_existing_disk(
        &self,
        pool_cfg: &PoolConfig,
        instance: &str,
        disk_name: &str,
        boot: bool,
    ) -> Result<(), PoolError> {
        let disk = self
            .compute
            .get_disk(&pool_cfg.zone, disk_name)
            .await?
            .ok_or_else(|| ComputeError::NotFound { resource: disk_name.to_owned() })?;
        let attachment = AttachedDiskSpec {
            boot,
            auto_delete: false,
            device_name: Some(disk.name.clone()),
            initialize_params: None,
            source: Some(disk.self_link.clone()),
        };
        let operation = self.compute.attach_disk(&pool_cfg.zone, instance, &attachment).await?;
        self.poller.await_done(&self.compute, operation).await?;
        Ok(())
    }
}

fn machine_type_path(pool_cfg: &PoolConfig) -> String {
    format!("zones/{}/machineTypes/{}", pool_cfg.zone, pool_cfg.machine_type)
}
