//! Remote compute capability surface consumed by the orchestrator.
//!
//! The trait mirrors the remote API one call per method; implementations do
//! no orchestration of their own. The orchestrator composes these calls,
//! drives the returned [`Operation`] handles to completion, and owns all
//! cross-resource-kind knowledge.

mod error;
mod types;

use std::future::Future;
use std::pin::Pin;

pub use error::ComputeError;
pub use types::{
    AttachedDisk, AttachedDiskSpec, DiskInitializeParams, DiskResource, DiskSpec, InstanceResource,
    InstanceSpec, LabelUpdate, NetworkInterface, NetworkInterfaceSpec, Operation, OperationErrors,
    OperationStatus, OperationSubError, SnapshotResource, SnapshotSpec, VmStatus,
};

/// Future returned by compute calls.
pub type ComputeFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ComputeError>> + Send + 'a>>;

/// Remote compute capability surface.
///
/// Mutating calls return an [`Operation`] handle that is only submitted, not
/// completed; callers poll it to its terminal state. `get` calls resolve
/// remote 404s to `None`; every other call surfaces them as
/// [`ComputeError::NotFound`].
pub trait ComputeApi: Send + Sync {
    /// Submits creation of a new instance.
    fn insert_instance<'a>(
        &'a self,
        zone: &'a str,
        spec: &'a InstanceSpec,
    ) -> ComputeFuture<'a, Operation>;

    /// Fetches an instance; `None` when it does not exist.
    fn get_instance<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Option<InstanceResource>>;

    /// Submits deletion of an instance.
    fn delete_instance<'a>(&'a self, zone: &'a str, name: &'a str)
    -> ComputeFuture<'a, Operation>;

    /// Submits an instance stop.
    fn stop_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ComputeFuture<'a, Operation>;

    /// Submits an instance start.
    fn start_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ComputeFuture<'a, Operation>;

    /// Submits a full replacement of an instance's labels.
    ///
    /// The update must carry the fingerprint read from the instance; the
    /// remote system rejects stale fingerprints.
    fn set_instance_labels<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
        update: &'a LabelUpdate,
    ) -> ComputeFuture<'a, Operation>;

    /// Submits attachment of an existing disk to an instance.
    fn attach_disk<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
        attachment: &'a AttachedDiskSpec,
    ) -> ComputeFuture<'a, Operation>;

    /// Submits detachment of a disk by its device name.
    fn detach_disk<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
        device_name: &'a str,
    ) -> ComputeFuture<'a, Operation>;

    /// Lists instances in a zone, optionally restricted by a filter
    /// expression (see [`crate::labels::FilterExpression`]).
    fn list_instances<'a>(
        &'a self,
        zone: &'a str,
        filter: Option<&'a str>,
    ) -> ComputeFuture<'a, Vec<InstanceResource>>;

    /// Submits creation of a standalone disk.
    fn insert_disk<'a>(&'a self, zone: &'a str, spec: &'a DiskSpec)
    -> ComputeFuture<'a, Operation>;

    /// Fetches a disk; `None` when it does not exist.
    fn get_disk<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Option<DiskResource>>;

    /// Submits deletion of a disk.
    fn delete_disk<'a>(&'a self, zone: &'a str, name: &'a str) -> ComputeFuture<'a, Operation>;

    /// Lists disks in a zone, optionally restricted by a filter expression.
    fn list_disks<'a>(
        &'a self,
        zone: &'a str,
        filter: Option<&'a str>,
    ) -> ComputeFuture<'a, Vec<DiskResource>>;

    /// Submits creation of a snapshot of one disk.
    fn create_snapshot<'a>(
        &'a self,
        zone: &'a str,
        disk: &'a str,
        spec: &'a SnapshotSpec,
    ) -> ComputeFuture<'a, Operation>;

    /// Lists project-wide snapshots, optionally restricted by a filter
    /// expression.
    fn list_snapshots<'a>(
        &'a self,
        filter: Option<&'a str>,
    ) -> ComputeFuture<'a, Vec<SnapshotResource>>;

    /// Submits deletion of a snapshot.
    fn delete_snapshot<'a>(&'a self, name: &'a str) -> ComputeFuture<'a, Operation>;

    /// Re-fetches a zonal operation; `None` when the remote system has
    /// already garbage-collected the record.
    fn get_operation<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Option<Operation>>;
}
