//! Compute Engine and Cloud DNS REST bindings.
//!
//! Thin one-call-per-endpoint bindings behind the [`ComputeApi`] and
//! [`DnsApi`](crate::dns::DnsApi) traits. Connection pooling and reconnect
//! live in the shared HTTP client; credential acquisition is external and
//! only the resulting bearer token is consumed here.

mod disks;
mod dns;
mod instances;
mod operations;

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::compute::{
    AttachedDiskSpec, ComputeApi, ComputeError, ComputeFuture, DiskResource, DiskSpec,
    InstanceResource, InstanceSpec, LabelUpdate, Operation, SnapshotResource, SnapshotSpec,
};

pub use dns::GcpDns;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const COMPUTE_API_BASE: &str = "https://compute.googleapis.com/compute/v1";
const DNS_API_BASE: &str = "https://dns.googleapis.com/dns/v1";

/// Body placeholder for mutating calls that send none.
const NO_BODY: Option<&()> = None;

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// Client for the Compute Engine v1 REST surface of one project.
#[derive(Clone, Debug)]
pub struct GcpCompute {
    project: String,
    access_token: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: serde::de::Deserialize<'de>"))]
struct ListResponse<T> {
    #[serde(default)]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl GcpCompute {
    /// Creates a client for `project` authenticating with `access_token`.
    #[must_use]
    pub fn new(project: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self { project: project.into(), access_token: access_token.into() }
    }

    fn zone_url(&self, zone: &str, tail: &str) -> String {
        format!("{COMPUTE_API_BASE}/projects/{}/zones/{zone}/{tail}", self.project)
    }

    fn global_url(&self, tail: &str) -> String {
        format!("{COMPUTE_API_BASE}/projects/{}/global/{tail}", self.project)
    }

    /// Sends a prepared request and decodes the response, resolving remote
    /// 404s to `None`.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<Option<T>, ComputeError> {
        let response = builder
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|err| ComputeError::Transport { message: err.to_string() })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| ComputeError::Transport { message: err.to_string() })?;
        if !status.is_success() {
            return Err(ComputeError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        serde_json::from_slice(&body).map(Some).map_err(|err| ComputeError::Api {
            status: status.as_u16(),
            message: format!("failed to decode {resource} response: {err}"),
        })
    }

    /// Fetches a single resource; `None` when it does not exist.
    pub(in crate::gcp) async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        resource: &str,
    ) -> Result<Option<T>, ComputeError> {
        self.dispatch(HTTP_CLIENT.get(url), resource).await
    }

    /// Submits a mutating call and returns its operation handle.
    pub(in crate::gcp) async fn mutate<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        payload: Option<&B>,
        resource: &str,
    ) -> Result<Operation, ComputeError> {
        let mut builder = HTTP_CLIENT.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = payload {
            builder = builder.json(body);
        }
        self.dispatch::<Operation>(builder, resource)
            .await?
            .ok_or_else(|| ComputeError::NotFound { resource: resource.to_owned() })
    }

    /// Lists a collection, following pagination to exhaustion.
    pub(in crate::gcp) async fn list_all<T: DeserializeOwned>(
        &self,
        url: &str,
        filter: Option<&str>,
        resource: &str,
    ) -> Result<Vec<T>, ComputeError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut builder = HTTP_CLIENT.get(url);
            if let Some(expression) = filter {
                builder = builder.query(&[("filter", expression)]);
            }
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token.as_str())]);
            }
            let page: ListResponse<T> = self
                .dispatch(builder, resource)
                .await?
                .ok_or_else(|| ComputeError::NotFound { resource: resource.to_owned() })?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => return Ok(items),
            }
        }
    }
}

impl ComputeApi for GcpCompute {
    fn insert_instance<'a>(
        &'a self,
        zone: &'a str,
        spec: &'a InstanceSpec,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(self.instance_insert(zone, spec))
    }

    fn get_instance<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Option<InstanceResource>> {
        Box::pin(self.instance_get(zone, name))
    }

    fn delete_instance<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(self.instance_delete(zone, name))
    }

    fn stop_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ComputeFuture<'a, Operation> {
        Box::pin(self.instance_stop(zone, name))
    }

    fn start_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ComputeFuture<'a, Operation> {
        Box::pin(self.instance_start(zone, name))
    }

    fn set_instance_labels<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
        update: &'a LabelUpdate,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(self.instance_set_labels(zone, name, update))
    }

    fn attach_disk<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
        attachment: &'a AttachedDiskSpec,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(self.instance_attach_disk(zone, instance, attachment))
    }

    fn detach_disk<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
        device_name: &'a str,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(self.instance_detach_disk(zone, instance, device_name))
    }

    fn list_instances<'a>(
        &'a self,
        zone: &'a str,
        filter: Option<&'a str>,
    ) -> ComputeFuture<'a, Vec<InstanceResource>> {
        Box::pin(self.instance_list(zone, filter))
    }

    fn insert_disk<'a>(
        &'a self,
        zone: &'a str,
        spec: &'a DiskSpec,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(self.disk_insert(zone, spec))
    }

    fn get_disk<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Option<DiskResource>> {
        Box::pin(self.disk_get(zone, name))
    }

    fn delete_disk<'a>(&'a self, zone: &'a str, name: &'a str) -> ComputeFuture<'a, Operation> {
        Box::pin(self.disk_delete(zone, name))
    }

    fn list_disks<'a>(
        &'a self,
        zone: &'a str,
        filter: Option<&'a str>,
    ) -> ComputeFuture<'a, Vec<DiskResource>> {
        Box::pin(self.disk_list(zone, filter))
    }

    fn create_snapshot<'a>(
        &'a self,
        zone: &'a str,
        disk: &'a str,
        spec: &'a SnapshotSpec,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(self.disk_create_snapshot(zone, disk, spec))
    }

    fn list_snapshots<'a>(
        &'a self,
        filter: Option<&'a str>,
    ) -> ComputeFuture<'a, Vec<SnapshotResource>> {
        Box::pin(self.snapshot_list(filter))
    }

    fn delete_snapshot<'a>(&'a self, name: &'a str) -> ComputeFuture<'a, Operation> {
        Box::pin(self.snapshot_delete(name))
    }

    fn get_operation<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Option<Operation>> {
        Box::pin(self.operation_get(zone, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_urls_scope_to_project_and_zone() {
        let client = GcpCompute::new("proj-7", "token");
        assert_eq!(
            client.zone_url("us-central1-a", "instances/vm17"),
            "https://compute.googleapis.com/compute/v1/projects/proj-7/zones/us-central1-a/instances/vm17"
        );
    }

    #[test]
    fn global_urls_scope_to_project() {
        let client = GcpCompute::new("proj-7", "token");
        assert_eq!(
            client.global_url("snapshots/nightly-vm17-disk0"),
            "https://compute.googleapis.com/compute/v1/projects/proj-7/global/snapshots/nightly-vm17-disk0"
        );
    }
}
