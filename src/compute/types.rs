//! Wire-shaped resource and request types for the remote compute surface.
//!
//! Field names follow the remote API's camelCase JSON. Resources are read
//! back verbatim; the orchestrator never computes status, boot time, or
//! addresses locally.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::labels::Labels;

/// Lifecycle status reported for a virtual machine.
///
/// Owned exclusively by the remote system; never set locally.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VmStatus {
    /// Resources are being allocated.
    Provisioning,
    /// Resources acquired, instance preparing to boot.
    Staging,
    /// Instance is booting or running.
    Running,
    /// Instance is shutting down.
    Stopping,
    /// Instance is being suspended.
    Suspending,
    /// Instance is suspended.
    Suspended,
    /// Instance is undergoing host maintenance.
    Repairing,
    /// Instance is stopped.
    Terminated,
}

impl VmStatus {
    /// Returns the status in the remote system's spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Staging => "STAGING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Suspending => "SUSPENDING",
            Self::Suspended => "SUSPENDED",
            Self::Repairing => "REPAIRING",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for VmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of an asynchronous remote operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// Queued, not yet started.
    Pending,
    /// In progress.
    Running,
    /// Terminal; inspect the error list for the outcome.
    Done,
}

/// One failure attached to a terminal operation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OperationSubError {
    /// Machine-readable failure code.
    pub code: String,
    /// Human-readable failure description.
    pub message: String,
}

/// Error container of a terminal operation.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct OperationErrors {
    /// Individual failures; empty means the container was present but benign.
    #[serde(default)]
    pub errors: Vec<OperationSubError>,
}

/// Handle to an asynchronous remote mutation, polled until terminal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation name, unique within its scope.
    pub name: String,
    /// Zone scope for zonal operations; global operations carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Current progress.
    pub status: OperationStatus,
    /// Failures reported on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrors>,
    /// Reference to the resource the operation mutates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
}

impl Operation {
    /// Returns true once the operation reached its terminal state.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    /// Aggregates the operation's sub-errors into one description.
    ///
    /// Returns `None` when the operation carries no failures.
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        let errors = self.error.as_ref().map(|container| container.errors.as_slice())?;
        if errors.is_empty() {
            return None;
        }
        Some(
            errors
                .iter()
                .map(|sub| format!("{}: {}", sub.code, sub.message))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Disk attached to an instance, as reported by the remote system.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    /// Device name presented to the guest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Reference to the backing disk resource.
    pub source: String,
    /// Whether the instance boots from this disk.
    #[serde(default)]
    pub boot: bool,
}

/// Network attachment of an instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    /// Primary internal address, when assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_ip: Option<String>,
}

/// Instance resource as read back from the remote system.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceResource {
    /// Instance name, unique within the project.
    pub name: String,
    /// Remote-owned lifecycle status.
    pub status: VmStatus,
    /// RFC 3339 creation timestamp.
    #[serde(default)]
    pub creation_timestamp: String,
    /// Machine type reference.
    #[serde(default)]
    pub machine_type: String,
    /// Zone reference.
    #[serde(default)]
    pub zone: String,
    /// Custom hostname, when one was requested at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Label set.
    #[serde(default)]
    pub labels: Labels,
    /// Opaque concurrency token required by label-mutating calls.
    #[serde(default)]
    pub label_fingerprint: String,
    /// Currently attached disks.
    #[serde(default)]
    pub disks: Vec<AttachedDisk>,
    /// Network attachments.
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

impl InstanceResource {
    /// Returns the primary internal address, when assigned.
    #[must_use]
    pub fn primary_internal_ip(&self) -> Option<&str> {
        self.network_interfaces
            .first()
            .and_then(|interface| interface.network_ip.as_deref())
    }
}

/// Disk resource as read back from the remote system.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskResource {
    /// Disk name, unique within its zone.
    pub name: String,
    /// Size in gigabytes, reported as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<String>,
    /// Label set.
    #[serde(default)]
    pub labels: Labels,
    /// Fully qualified reference to this disk.
    #[serde(default)]
    pub self_link: String,
    /// Boot image the disk was created from, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    /// Snapshot the disk was created from, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_snapshot: Option<String>,
}

/// Snapshot resource as read back from the remote system.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResource {
    /// Snapshot name, unique within the project.
    pub name: String,
    /// Label set; members of one logical snapshot share `snapshot_name`.
    #[serde(default)]
    pub labels: Labels,
    /// Fully qualified reference to this snapshot.
    #[serde(default)]
    pub self_link: String,
    /// Disk the snapshot was taken from.
    #[serde(default)]
    pub source_disk: String,
}

/// Boot disk initialisation parameters for instance creation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskInitializeParams {
    /// Name for the new disk.
    pub disk_name: String,
    /// Boot image to initialise from.
    pub source_image: String,
    /// Disk type reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    /// Labels applied to the new disk.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

/// Disk entry of an instance-creation or attach request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDiskSpec {
    /// Whether the instance boots from this disk.
    pub boot: bool,
    /// Whether the disk is deleted together with the instance.
    pub auto_delete: bool,
    /// Device name presented to the guest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Parameters for creating the disk inline (instance creation only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialize_params: Option<DiskInitializeParams>,
    /// Reference to an existing disk (attach only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Network entry of an instance-creation request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceSpec {
    /// Network reference.
    pub network: String,
    /// Subnetwork reference, when the network is custom-mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
}

/// Instance-creation request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSpec {
    /// Instance name.
    pub name: String,
    /// Machine type reference.
    pub machine_type: String,
    /// Disks to create or attach with the instance; index 0 must boot.
    pub disks: Vec<AttachedDiskSpec>,
    /// Network attachments.
    pub network_interfaces: Vec<NetworkInterfaceSpec>,
    /// Labels applied to the instance.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    /// Custom hostname, when DNS is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Disk-creation request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSpec {
    /// Disk name.
    pub name: String,
    /// Size in gigabytes, as a decimal string; omitted when the size comes
    /// from a source snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<String>,
    /// Snapshot to restore from, when reverting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_snapshot: Option<String>,
    /// Disk type reference.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    /// Labels applied to the disk.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

/// Snapshot-creation request for one disk.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSpec {
    /// Snapshot name; globally unique via the `{snapshot}-{disk}` scheme.
    pub name: String,
    /// Labels applied to the snapshot.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

/// Payload for label-mutating calls; the fingerprint guards against
/// concurrent label writes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelUpdate {
    /// Full replacement label set.
    pub labels: Labels,
    /// Fingerprint read from the resource being updated.
    pub label_fingerprint: String,
}
