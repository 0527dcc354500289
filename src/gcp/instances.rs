//! Instance endpoints of the Compute Engine REST surface.

use reqwest::Method;

use crate::compute::{
    AttachedDiskSpec, ComputeError, InstanceResource, InstanceSpec, LabelUpdate, Operation,
};

use super::{GcpCompute, NO_BODY};

impl GcpCompute {
    pub(in crate::gcp) async fn instance_insert(
        &self,
        zone: &str,
        spec: &InstanceSpec,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, "instances");
        self.mutate(Method::POST, &url, &[], Some(spec), "instance insert").await
    }

    pub(in crate::gcp) async fn instance_get(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<Option<InstanceResource>, ComputeError> {
        let url = self.zone_url(zone, &format!("instances/{name}"));
        self.fetch(&url, "instance").await
    }

    pub(in crate::gcp) async fn instance_delete(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, &format!("instances/{name}"));
        self.mutate(Method::DELETE, &url, &[], NO_BODY, "instance delete").await
    }

    pub(in crate::gcp) async fn instance_stop(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, &format!("instances/{name}/stop"));
        self.mutate(Method::POST, &url, &[], NO_BODY, "instance stop").await
    }

    pub(in crate::gcp) async fn instance_start(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, &format!("instances/{name}/start"));
        self.mutate(Method::POST, &url, &[], NO_BODY, "instance start").await
    }

    pub(in crate::gcp) async fn instance_set_labels(
        &self,
        zone: &str,
        name: &str,
        update: &LabelUpdate,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, &format!("instances/{name}/setLabels"));
        self.mutate(Method::POST, &url, &[], Some(update), "instance setLabels").await
    }

    pub(in crate::gcp) async fn instance_attach_disk(
        &self,
        zone: &str,
        instance: &str,
        attachment: &AttachedDiskSpec,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, &format!("instances/{instance}/attachDisk"));
        self.mutate(Method::POST, &url, &[], Some(attachment), "disk attach").await
    }

    pub(in crate::gcp) async fn instance_detach_disk(
        &self,
        zone: &str,
        instance: &str,
        device_name: &str,
    ) -> Result<Operation, ComputeError> {
        let url = self.zone_url(zone, &format!("instances/{instance}/detachDisk"));
        self.mutate(Method::POST, &url, &[("deviceName", device_name)], NO_BODY, "disk detach")
            .await
    }

    pub(in crate::gcp) async fn instance_list(
        &self,
        zone: &str,
        filter: Option<&str>,
    ) -> Result<Vec<InstanceResource>, ComputeError> {
        let url = self.zone_url(zone, "instances");
        self.list_all(&url, filter, "instance list").await
    }
}
