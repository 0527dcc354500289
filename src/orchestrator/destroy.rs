//! Member destruction and the unconfigured-resource purge.

use tracing::{info, warn};

use crate::compute::ComputeApi;
use crate::dns::DnsApi;
use crate::labels::{self, FilterExpression};

use super::{PoolError, PoolManager, PurgeSummary};

impl<C, D> PoolManager<C, D>
where
    C: ComputeApi,
    D: DnsApi,
{
    /// Destroys the member and every disk and snapshot labelled for it.
    ///
    /// A member that already 404s on fetch counts as destroyed and skips the
    /// instance delete. The disk and snapshot sweeps run regardless: they
    /// collect orphans left behind by interrupted `create_disk` or
    /// `revert_snapshot` sequences. Sweep deletions fan out, then every
    /// operation is awaited; individual cleanup failures are not swallowed.
    /// Re-running the operation on a half-cleaned member only deletes what
    /// remains.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Config`] for unknown pools, plus the usual
    /// compute and wait failures.
    pub async fn destroy_vm(&self, pool: &str, name: &str) -> Result<(), PoolError> {
        let pool_cfg = self.config.pool(pool)?;
        let existed = match self.compute.get_instance(&pool_cfg.zone, name).await? {
            Some(_) => {
                info!(pool, vm = name, "deleting instance");
                let operation = self.compute.delete_instance(&pool_cfg.zone, name).await?;
                self.delete_poller.await_done(&self.compute, operation).await?;
                true
            }
            None => {
                info!(pool, vm = name, "instance already absent");
                false
            }
        };
        if existed {
            self.remove_dns(name).await;
        }

        let filter = FilterExpression::new().eq(labels::VM, name).build();

        let disks = self.compute.list_disks(&pool_cfg.zone, Some(&filter)).await?;
        let mut disk_operations = Vec::with_capacity(disks.len());
        for disk in &disks {
            disk_operations.push(self.compute.delete_disk(&pool_cfg.zone, &disk.name).await?);
        }
        for operation in disk_operations {
            self.poller.await_done(&self.compute, operation).await?;
        }

        let snapshots = self.compute.list_snapshots(Some(&filter)).await?;
        let mut snapshot_operations = Vec::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            snapshot_operations.push(self.compute.delete_snapshot(&snapshot.name).await?);
        }
        for operation in snapshot_operations {
            self.poller.await_done(&self.compute, operation).await?;
        }
        Ok(())
    }

    /// Deletes resources whose `pool` label matches no configured pool, or
    /// that carry no `pool` label at all.
    ///
    /// Resources matching `allow_list` (see [`labels::should_ignore`]) are
    /// exempt. Instance deletions are awaited so the disk sweep in the same
    /// zone sees a consistent label set; disk and snapshot deletions are
    /// fire-and-forget, since nothing downstream depends on their completion
    /// and awaiting them would multiply purge latency by the resource count.
    /// Snapshots are project-global and swept once after the zone loop.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Compute`] when a listing or deletion submission
    /// fails and [`PoolError::Wait`] when an awaited instance delete fails.
    pub async fn purge_unconfigured(
        &self,
        allow_list: Option<&[String]>,
    ) -> Result<PurgeSummary, PoolError> {
        let mut summary = PurgeSummary::default();
        let filter = self.unconfigured_filter();

        for zone in self.config.zones() {
            let instances = self.compute.list_instances(zone, Some(&filter)).await?;
            for instance in &instances {
                if labels::should_ignore(&instance.labels, allow_list) {
                    info!(zone, instance = %instance.name, "purge: instance allow-listed");
                    continue;
                }
                warn!(zone, instance = %instance.name, "purge: deleting unconfigured instance");
                let operation = self.compute.delete_instance(zone, &instance.name).await?;
                self.poller.await_done(&self.compute, operation).await?;
                summary.instances += 1;
            }

            let disks = self.compute.list_disks(zone, Some(&filter)).await?;
            for disk in &disks {
                if labels::should_ignore(&disk.labels, allow_list) {
                    continue;
                }
                warn!(zone, disk = %disk.name, "purge: deleting unconfigured disk");
                self.compute.delete_disk(zone, &disk.name).await?;
                summary.disks += 1;
            }
        }

        let snapshots = self.compute.list_snapshots(Some(&filter)).await?;
        for snapshot in &snapshots {
            if labels::should_ignore(&snapshot.labels, allow_list) {
                continue;
            }
            warn!(snapshot = %snapshot.name, "purge: deleting unconfigured snapshot");
            self.compute.delete_snapshot(&snapshot.name).await?;
            summary.snapshots += 1;
        }
        Ok(summary)
    }

    /// Builds the filter selecting resources outside every configured pool.
    fn unconfigured_filter(&self) -> String {
        let mut expression = FilterExpression::new();
        for pool in &self.config.pools {
            expression = expression.ne(labels::POOL, &pool.name);
        }
        expression.or_missing(labels::POOL).build()
    }
}
