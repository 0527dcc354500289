//! Disk and snapshot endpoints of the Compute Engine REST surface.
//!
//! Disks are zonal; snapshots are project-global and only ever addressed by
//! name or label filter.

use reqwest::Method;

use crate::compute::{ComputeError, DiskResource, DiskSpec, Operation, SnapshotResource, SnapshotSpec};

use super::{GcpCompute, NO_BODY};

impl GcpCompute {
    pub(in crate::gcp) async fn disk_insert(
        &self,
        zone: &str,
        spec: &DiskSpec,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, "disks");
        self.mutate(Method::POST, &url, &[], Some(spec), "disk insert").await
    }

    pub(in crate::gcp) async fn disk_get(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<Option<DiskResource>, ComputeError> {
        let url = self.zone_url(zone, &format!("disks/{name}"));
        self.fetch(&url, "disk").await
    }

    pub(in crate::gcp) async fn disk_delete(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, &format!("disks/{name}"));
        self.mutate(Method::DELETE, &url, &[], NO_BODY, "disk delete").await
    }

    pub(in crate::gcp) async fn disk_list(
        &self,
        zone: &str,
        filter: Option<&str>,
    ) -> Result<Vec<DiskResource>, ComputeError> {
        let url = self.zone_url(zone, "disks");
        self.list_all(&url, filter, "disk list").await
    }

    pub(in crate::gcp) async fn disk_create_snapshot(
        &self,
        zone: &str,
        disk: &str,
        spec: &SnapshotSpec,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, &format!("disks/{disk}/createSnapshot"));
        self.mutate(Method::POST, &url, &[], Some(spec), "snapshot create").await
    }

    pub(in crate::gcp) async fn snapshot_list(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<SnapshotResource>, ComputeError> {
        let url = self.global_url("snapshots");
        self.list_all(&url, filter, "snapshot list").await
    }

    pub(in crate::gcp) async fn snapshot_delete(
        &self,
        name: &str,
    ) -> Result<Operation, ComputeError> {
        let url = self.global_url(&format!("snapshots/{name}"));
        self.mutate(Method::DELETE, &url, &[], NO_BODY, "snapshot delete").await
    }
}
