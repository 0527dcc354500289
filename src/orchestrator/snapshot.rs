//! Logical snapshot creation and revert.
//!
//! A logical snapshot is one snapshot resource per disk attached to the VM at
//! that moment, all sharing the `snapshot_name` label. Revert replaces the
//! VM's whole disk set from such a snapshot set.

use tracing::info;

use crate::compute::{ComputeApi, DiskSpec, SnapshotResource, SnapshotSpec};
use crate::dns::DnsApi;
use crate::labels::{self, FilterExpression, Labels};
use crate::naming;

use super::{PoolError, PoolManager};

impl<C, D> PoolManager<C, D>
where
    C: ComputeApi,
    D: DnsApi,
{
    /// Snapshots every disk currently attached to the member.
    ///
    /// Creations fan out: all submissions happen before any wait, bounding
    /// wall time to one round trip per disk instead of one full poll cycle
    /// per disk in sequence.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::VmNotFound`] when the member does not exist and
    /// [`PoolError::SnapshotExists`] when a snapshot set of that name is
    /// already present, plus the usual configuration, compute, and wait
    /// failures.
    pub async fn create_snapshot(
        &self,
        pool: &str,
        name: &str,
        snapshot: &str,
    ) -> Result<(), PoolError> {
        let pool_cfg = self.config.pool(pool)?;
        let instance = self.require_vm(pool_cfg, pool, name).await?;
        if !self.snapshot_set(name, snapshot).await?.is_empty() {
            return Err(PoolError::SnapshotExists {
                vm: name.to_owned(),
                snapshot: snapshot.to_owned(),
            });
        }

        info!(pool, vm = name, snapshot, disks = instance.disks.len(), "creating snapshot set");
        let mut operations = Vec::with_capacity(instance.disks.len());
        for disk in &instance.disks {
            let disk_name = naming::disk_name_from_source(&disk.source).to_owned();
            let spec = SnapshotSpec {
                name: naming::snapshot_name(snapshot, &disk_name),
                labels: Labels::for_snapshot(snapshot, name, &pool_cfg.name, &disk_name, disk.boot),
            };
            operations.push(self.compute.create_snapshot(&pool_cfg.zone, &disk_name, &spec).await?);
        }
        for operation in operations {
            self.poller.await_done(&self.compute, operation).await?;
        }
        Ok(())
    }

    /// Reverts the member to the snapshot set named `snapshot`.
    ///
    /// Sequence: stop the VM; detach and delete every currently attached
    /// disk; recreate each disk from its snapshot under the recorded
    /// `diskname` label and re-attach it with the recorded `boot` flag; start
    /// the VM. The sequence is not atomic: a failure after the stop leaves
    /// the VM stopped with a partial disk set and no compensation runs.
    /// Re-running the operation is the recovery path.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::VmNotFound`] when the member does not exist,
    /// [`PoolError::SnapshotMissing`] when no snapshot set of that name
    /// exists, and [`PoolError::SnapshotLabel`] when a set member lacks its
    /// `diskname` label, plus the usual compute and wait failures.
    pub async fn revert_snapshot(
        &self,
        pool: &str,
        name: &str,
        snapshot: &str,
    ) -> Result<(), PoolError> {
        let pool_cfg = self.config.pool(pool)?;
        let instance = self.require_vm(pool_cfg, pool, name).await?;
        let snapshot_set = self.snapshot_set(name, snapshot).await?;
        if snapshot_set.is_empty() {
            return Err(PoolError::SnapshotMissing {
                vm: name.to_owned(),
                snapshot: snapshot.to_owned(),
            });
        }

        info!(pool, vm = name, snapshot, "reverting to snapshot set");
        let stop = self.compute.stop_instance(&pool_cfg.zone, name).await?;
        self.poller.await_done(&self.compute, stop).await?;

        for disk in &instance.disks {
            let disk_name = naming::disk_name_from_source(&disk.source).to_owned();
            let device = disk.device_name.clone().unwrap_or_else(|| disk_name.clone());
            let detach = self.compute.detach_disk(&pool_cfg.zone, name, &device).await?;
            self.poller.await_done(&self.compute, detach).await?;
            let delete = self.compute.delete_disk(&pool_cfg.zone, &disk_name).await?;
            self.poller.await_done(&self.compute, delete).await?;
        }

        for member in &snapshot_set {
            let disk_name = member
                .labels
                .diskname()
                .ok_or_else(|| PoolError::SnapshotLabel {
                    snapshot: member.name.clone(),
                    key: labels::DISKNAME,
                })?
                .to_owned();
            let spec = DiskSpec {
                name: disk_name.clone(),
                size_gb: None,
                source_snapshot: Some(member.self_link.clone()),
                disk_type: Some(pool_cfg.disk_type.clone()),
                labels: Labels::for_disk(name, &pool_cfg.name),
            };
            let create = self.compute.insert_disk(&pool_cfg.zone, &spec).await?;
            self.poller.await_done(&self.compute, create).await?;
            self.attach_existing_disk(pool_cfg, name, &disk_name, member.labels.boot_flag())
                .await?;
        }

        let start = self.compute.start_instance(&pool_cfg.zone, name).await?;
        self.poller.await_done(&self.compute, start).await?;
        Ok(())
    }

    /// Queries the snapshot set labelled `{vm, snapshot_name}`.
    pub(super) async fn snapshot_set(
        &self,
        vm: &str,
        snapshot: &str,
    ) -> Result<Vec<SnapshotResource>, PoolError> {
        let filter = FilterExpression::new()
            .eq(labels::VM, vm)
            .eq(labels::SNAPSHOT_NAME, snapshot)
            .build();
        Ok(self.compute.list_snapshots(Some(&filter)).await?)
    }
}
