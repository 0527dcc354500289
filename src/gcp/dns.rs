//! Cloud DNS REST bindings behind the [`DnsApi`] trait.
//!
//! Record mutations go through the changes endpoint; a change carries the
//! record sets to add and remove atomically. Status mapping: 404 is
//! not-found, 409 is already-exists, 412 is precondition-failed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dns::{ARecord, DnsApi, DnsError, DnsFuture, DnsZone};

use super::{DNS_API_BASE, HTTP_CLIENT};

const RECORD_TYPE_A: &str = "A";

/// Client for the Cloud DNS v1 REST surface of one project.
#[derive(Clone, Debug)]
pub struct GcpDns {
    project: String,
    access_token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceRecordSet {
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    ttl: u32,
    rrdatas: Vec<String>,
}

impl ResourceRecordSet {
    fn from_record(record: &ARecord) -> Self {
        Self {
            name: record.name.clone(),
            record_type: String::from(RECORD_TYPE_A),
            ttl: record.ttl,
            rrdatas: vec![record.ip.to_string()],
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedZoneResource {
    name: String,
    dns_name: String,
}

#[derive(Serialize)]
struct ChangeRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    additions: Vec<ResourceRecordSet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    deletions: Vec<ResourceRecordSet>,
}

#[derive(Deserialize)]
struct RecordSetList {
    #[serde(default)]
    rrsets: Vec<ResourceRecordSet>,
}

impl GcpDns {
    /// Creates a client for `project` authenticating with `access_token`.
    #[must_use]
    pub fn new(project: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self { project: project.into(), access_token: access_token.into() }
    }

    fn zone_url(&self, managed_zone: &str, tail: &str) -> String {
        let base = format!("{DNS_API_BASE}/projects/{}/managedZones/{managed_zone}", self.project);
        if tail.is_empty() { base } else { format!("{base}/{tail}") }
    }

    /// Sends a prepared request and decodes the response, resolving remote
    /// 404s to `None`.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<Option<T>, DnsError> {
        let response = builder
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|err| DnsError::Transport { message: err.to_string() })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| DnsError::Transport { message: err.to_string() })?;
        if status == reqwest::StatusCode::CONFLICT {
            return Err(DnsError::AlreadyExists { name: resource.to_owned() });
        }
        if status == reqwest::StatusCode::PRECONDITION_FAILED {
            return Err(DnsError::Precondition {
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        if !status.is_success() {
            return Err(DnsError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        serde_json::from_slice(&body).map(Some).map_err(|err| DnsError::Api {
            status: status.as_u16(),
            message: format!("failed to decode {resource} response: {err}"),
        })
    }

    async fn submit_change(
        &self,
        managed_zone: &str,
        change: &ChangeRequest,
        resource: &str,
    ) -> Result<(), DnsError> {
        let url = self.zone_url(managed_zone, "changes");
        let builder = HTTP_CLIENT.post(&url).json(change);
        self.dispatch::<serde_json::Value>(builder, resource)
            .await?
            .map(|_| ())
            .ok_or_else(|| DnsError::ZoneNotFound { zone: managed_zone.to_owned() })
    }

    async fn find_record_set(
        &self,
        managed_zone: &str,
        name: &str,
    ) -> Result<Option<ResourceRecordSet>, DnsError> {
        let url = self.zone_url(managed_zone, "rrsets");
        let builder =
            HTTP_CLIENT.get(&url).query(&[("name", name), ("type", RECORD_TYPE_A)]);
        let listing: RecordSetList = self
            .dispatch(builder, name)
            .await?
            .ok_or_else(|| DnsError::ZoneNotFound { zone: managed_zone.to_owned() })?;
        Ok(listing.rrsets.into_iter().next())
    }

    async fn lookup_zone(&self, managed_zone: &str) -> Result<DnsZone, DnsError> {
        let url = self.zone_url(managed_zone, "");
        let builder = HTTP_CLIENT.get(&url);
        let zone: ManagedZoneResource = self
            .dispatch(builder, managed_zone)
            .await?
            .ok_or_else(|| DnsError::ZoneNotFound { zone: managed_zone.to_owned() })?;
        Ok(DnsZone { name: zone.name, dns_name: zone.dns_name })
    }

    async fn add_record(&self, managed_zone: &str, record: &ARecord) -> Result<(), DnsError> {
        let change = ChangeRequest {
            additions: vec![ResourceRecordSet::from_record(record)],
            deletions: Vec::new(),
        };
        self.submit_change(managed_zone, &change, &record.name).await
    }

    async fn replace_record(&self, managed_zone: &str, record: &ARecord) -> Result<(), DnsError> {
        let existing = self.find_record_set(managed_zone, &record.name).await?;
        let change = ChangeRequest {
            additions: vec![ResourceRecordSet::from_record(record)],
            deletions: existing.into_iter().collect(),
        };
        self.submit_change(managed_zone, &change, &record.name).await
    }

    async fn remove_record(&self, managed_zone: &str, name: &str) -> Result<(), DnsError> {
        let existing = self
            .find_record_set(managed_zone, name)
            .await?
            .ok_or_else(|| DnsError::NotFound { name: name.to_owned() })?;
        let change = ChangeRequest { additions: Vec::new(), deletions: vec![existing] };
        self.submit_change(managed_zone, &change, name).await
    }
}

impl DnsApi for GcpDns {
    fn zone<'a>(&'a self, managed_zone: &'a str) -> DnsFuture<'a, DnsZone> {
        Box::pin(self.lookup_zone(managed_zone))
    }

    fn add_a_record<'a>(
        &'a self,
        managed_zone: &'a str,
        record: &'a ARecord,
    ) -> DnsFuture<'a, ()> {
        Box::pin(self.add_record(managed_zone, record))
    }

    fn replace_a_record<'a>(
        &'a self,
        managed_zone: &'a str,
        record: &'a ARecord,
    ) -> DnsFuture<'a, ()> {
        Box::pin(self.replace_record(managed_zone, record))
    }

    fn remove_a_record<'a>(&'a self, managed_zone: &'a str, name: &'a str) -> DnsFuture<'a, ()> {
        Box::pin(self.remove_record(managed_zone, name))
    }
}
