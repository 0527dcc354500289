//! Scripted fakes shared across unit tests.
//!
//! [`FakeCompute`] keeps an in-memory resource inventory, records every call
//! in order, and evaluates the same filter grammar the orchestrator emits.
//! Mutating calls answer with `DONE` operations by default so waits return
//! immediately; pending-operation mode plus a scripted fetch queue drives the
//! poll loop deterministically.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::compute::{
    AttachedDisk, AttachedDiskSpec, ComputeApi, ComputeError, ComputeFuture, DiskResource,
    DiskSpec, InstanceResource, InstanceSpec, LabelUpdate, NetworkInterface, Operation,
    OperationStatus, SnapshotResource, SnapshotSpec, VmStatus,
};
use crate::dns::{ARecord, DnsApi, DnsError, DnsFuture, DnsZone};
use crate::labels::Labels;

/// Builds an operation handle in the given state.
pub fn operation(name: &str, status: OperationStatus) -> Operation {
    Operation {
        name: name.to_owned(),
        zone: Some(String::from("us-central1-a")),
        status,
        error: None,
        target_link: None,
    }
}

/// Builds an instance resource with the standard test inventory shape.
///
/// `disks` pairs are `(disk_name, boot)`; sources point at the test project.
pub fn instance(name: &str, pool: &str, disks: &[(&str, bool)]) -> InstanceResource {
    InstanceResource {
        name: name.to_owned(),
        status: VmStatus::Running,
        creation_timestamp: String::from("2026-02-01T00:00:00Z"),
        machine_type: String::from("zones/us-central1-a/machineTypes/e2-medium"),
        zone: String::from("projects/test/zones/us-central1-a"),
        hostname: None,
        labels: Labels::for_instance(name, pool),
        label_fingerprint: String::from("fp-0"),
        disks: disks
            .iter()
            .map(|(disk_name, boot)| AttachedDisk {
                device_name: Some((*disk_name).to_owned()),
                source: format!("projects/test/zones/us-central1-a/disks/{disk_name}"),
                boot: *boot,
            })
            .collect(),
        network_interfaces: vec![NetworkInterface { network_ip: Some(String::from("10.0.0.5")) }],
    }
}

/// Builds a disk resource carrying the given labels.
pub fn disk(name: &str, labels: Labels) -> DiskResource {
    DiskResource {
        name: name.to_owned(),
        size_gb: Some(String::from("10")),
        labels,
        self_link: format!("projects/test/zones/us-central1-a/disks/{name}"),
        source_image: None,
        source_snapshot: None,
    }
}

/// Builds a snapshot resource carrying the given labels.
pub fn snapshot(name: &str, labels: Labels) -> SnapshotResource {
    SnapshotResource {
        name: name.to_owned(),
        labels,
        self_link: format!("projects/test/global/snapshots/{name}"),
        source_disk: String::from("projects/test/zones/us-central1-a/disks/unknown"),
    }
}

#[derive(Default)]
struct ComputeState {
    instances: BTreeMap<String, InstanceResource>,
    disks: BTreeMap<String, DiskResource>,
    snapshots: BTreeMap<String, SnapshotResource>,
    operation_fetches: VecDeque<Result<Option<Operation>, ComputeError>>,
    failures: BTreeMap<String, ComputeError>,
    calls: Vec<String>,
    instance_specs: Vec<InstanceSpec>,
    disk_specs: Vec<DiskSpec>,
    snapshot_specs: Vec<(String, SnapshotSpec)>,
    attachments: Vec<(String, AttachedDiskSpec)>,
    label_updates: Vec<(String, LabelUpdate)>,
    pending_operations: bool,
    op_counter: usize,
}

/// Scripted in-memory compute surface.
#[derive(Clone, Default)]
pub struct FakeCompute {
    state: Arc<Mutex<ComputeState>>,
}

impl FakeCompute {
    /// Creates an empty fake.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ComputeState> {
        self.state.lock().expect("fake compute state poisoned")
    }

    /// Seeds an instance into the inventory.
    pub fn seed_instance(&self, resource: InstanceResource) {
        self.lock().instances.insert(resource.name.clone(), resource);
    }

    /// Seeds a disk into the inventory.
    pub fn seed_disk(&self, resource: DiskResource) {
        self.lock().disks.insert(resource.name.clone(), resource);
    }

    /// Seeds a snapshot into the inventory.
    pub fn seed_snapshot(&self, resource: SnapshotResource) {
        self.lock().snapshots.insert(resource.name.clone(), resource);
    }

    /// Makes the next call of `method` fail with `error`.
    pub fn fail_next(&self, method: &str, error: ComputeError) {
        self.lock().failures.insert(method.to_owned(), error);
    }

    /// Makes mutating calls answer with `PENDING` operations, forcing the
    /// poller to consume the scripted fetch queue.
    pub fn use_pending_operations(&self) {
        self.lock().pending_operations = true;
    }

    /// Queues one operation re-fetch outcome.
    pub fn push_operation_fetch(&self, result: Result<Option<Operation>, ComputeError>) {
        self.lock().operation_fetches.push_back(result);
    }

    /// Returns every call recorded so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Counts recorded calls starting with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock().calls.iter().filter(|call| call.starts_with(prefix)).count()
    }

    /// Returns every submitted instance spec.
    pub fn instance_specs(&self) -> Vec<InstanceSpec> {
        self.lock().instance_specs.clone()
    }

    /// Returns every submitted disk spec.
    pub fn disk_specs(&self) -> Vec<DiskSpec> {
        self.lock().disk_specs.clone()
    }

    /// Returns every submitted snapshot spec with its source disk.
    pub fn snapshot_specs(&self) -> Vec<(String, SnapshotSpec)> {
        self.lock().snapshot_specs.clone()
    }

    /// Returns every submitted attachment with its instance.
    pub fn attachments(&self) -> Vec<(String, AttachedDiskSpec)> {
        self.lock().attachments.clone()
    }

    /// Returns every submitted label update with its instance.
    pub fn label_updates(&self) -> Vec<(String, LabelUpdate)> {
        self.lock().label_updates.clone()
    }

    fn take_failure(state: &mut ComputeState, method: &str) -> Result<(), ComputeError> {
        state.failures.remove(method).map_or(Ok(()), Err)
    }

    fn next_operation(state: &mut ComputeState, zone: Option<&str>) -> Operation {
        state.op_counter += 1;
        Operation {
            name: format!("op-{}", state.op_counter),
            zone: zone.map(str::to_owned),
            status: if state.pending_operations {
                OperationStatus::Pending
            } else {
                OperationStatus::Done
            },
            error: None,
            target_link: None,
        }
    }
}

fn instance_from_spec(zone: &str, spec: &InstanceSpec) -> InstanceResource {
    InstanceResource {
        name: spec.name.clone(),
        status: VmStatus::Running,
        creation_timestamp: String::from("2026-02-01T00:00:00Z"),
        machine_type: spec.machine_type.clone(),
        zone: format!("projects/test/zones/{zone}"),
        hostname: spec.hostname.clone(),
        labels: spec.labels.clone(),
        label_fingerprint: String::from("fp-0"),
        disks: spec
            .disks
            .iter()
            .map(|entry| AttachedDisk {
                device_name: entry.device_name.clone(),
                source: entry.initialize_params.as_ref().map_or_else(
                    || entry.source.clone().unwrap_or_default(),
                    |params| format!("projects/test/zones/{zone}/disks/{}", params.disk_name),
                ),
                boot: entry.boot,
            })
            .collect(),
        network_interfaces: vec![NetworkInterface { network_ip: Some(String::from("10.0.0.5")) }],
    }
}

fn clause_matches(labels: &Labels, clause: &str) -> bool {
    let body = clause.trim().trim_start_matches('(').trim_end_matches(')');
    if let Some((key, value)) = body.split_once(" != ") {
        let label_key = key.trim().strip_prefix("labels.").unwrap_or(key);
        labels.get(label_key) != Some(value.trim())
    } else if let Some((key, value)) = body.split_once(" = ") {
        let label_key = key.trim().strip_prefix("labels.").unwrap_or(key);
        labels.get(label_key) == Some(value.trim())
    } else {
        false
    }
}

/// Evaluates the orchestrator's filter grammar against a label set.
pub fn matches_filter(labels: &Labels, filter: Option<&str>) -> bool {
    let Some(expression) = filter else { return true };
    let (conjunction, missing_key) = match expression.split_once(" OR -labels.") {
        Some((head, tail)) => (head, tail.strip_suffix(":*")),
        None => expression
            .strip_prefix("-labels.")
            .map_or((expression, None), |bare| ("", bare.strip_suffix(":*"))),
    };
    let conjunction_holds = !conjunction.is_empty()
        && conjunction.split(" AND ").all(|clause| clause_matches(labels, clause));
    let missing_holds = missing_key.is_some_and(|key| labels.get(key).is_none());
    conjunction_holds || missing_holds
}

impl ComputeApi for FakeCompute {
    fn insert_instance<'a>(
        &'a self,
        zone: &'a str,
        spec: &'a InstanceSpec,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "insert_instance")?;
            state.calls.push(format!("insert_instance {zone} {}", spec.name));
            state.instance_specs.push(spec.clone());
            state.instances.insert(spec.name.clone(), instance_from_spec(zone, spec));
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn get_instance<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Option<InstanceResource>> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "get_instance")?;
            state.calls.push(format!("get_instance {zone} {name}"));
            Ok(state.instances.get(name).cloned())
        })
    }

    fn delete_instance<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "delete_instance")?;
            state.calls.push(format!("delete_instance {zone} {name}"));
            state.instances.remove(name);
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn stop_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "stop_instance")?;
            state.calls.push(format!("stop_instance {zone} {name}"));
            if let Some(found) = state.instances.get_mut(name) {
                found.status = VmStatus::Terminated;
            }
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn start_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "start_instance")?;
            state.calls.push(format!("start_instance {zone} {name}"));
            if let Some(found) = state.instances.get_mut(name) {
                found.status = VmStatus::Running;
            }
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn set_instance_labels<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
        update: &'a LabelUpdate,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "set_instance_labels")?;
            state.calls.push(format!("set_instance_labels {zone} {name}"));
            state.label_updates.push((name.to_owned(), update.clone()));
            if let Some(found) = state.instances.get_mut(name) {
                found.labels = update.labels.clone();
            }
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn attach_disk<'a>(
        &'a self,
        zone: &'a str,
        instance_name: &'a str,
        attachment: &'a AttachedDiskSpec,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "attach_disk")?;
            state.calls.push(format!("attach_disk {zone} {instance_name}"));
            state.attachments.push((instance_name.to_owned(), attachment.clone()));
            if let Some(found) = state.instances.get_mut(instance_name) {
                found.disks.push(AttachedDisk {
                    device_name: attachment.device_name.clone(),
                    source: attachment.source.clone().unwrap_or_default(),
                    boot: attachment.boot,
                });
            }
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn detach_disk<'a>(
        &'a self,
        zone: &'a str,
        instance_name: &'a str,
        device_name: &'a str,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "detach_disk")?;
            state.calls.push(format!("detach_disk {zone} {instance_name} {device_name}"));
            if let Some(found) = state.instances.get_mut(instance_name) {
                found.disks.retain(|entry| entry.device_name.as_deref() != Some(device_name));
            }
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn list_instances<'a>(
        &'a self,
        zone: &'a str,
        filter: Option<&'a str>,
    ) -> ComputeFuture<'a, Vec<InstanceResource>> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "list_instances")?;
            state.calls.push(format!("list_instances {zone}"));
            Ok(state
                .instances
                .values()
                .filter(|entry| matches_filter(&entry.labels, filter))
                .cloned()
                .collect())
        })
    }

    fn insert_disk<'a>(
        &'a self,
        zone: &'a str,
        spec: &'a DiskSpec,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "insert_disk")?;
            state.calls.push(format!("insert_disk {zone} {}", spec.name));
            state.disk_specs.push(spec.clone());
            state.disks.insert(
                spec.name.clone(),
                DiskResource {
                    name: spec.name.clone(),
                    size_gb: spec.size_gb.clone(),
                    labels: spec.labels.clone(),
                    self_link: format!("projects/test/zones/{zone}/disks/{}", spec.name),
                    source_image: None,
                    source_snapshot: spec.source_snapshot.clone(),
                },
            );
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn get_disk<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Option<DiskResource>> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "get_disk")?;
            state.calls.push(format!("get_disk {zone} {name}"));
            Ok(state.disks.get(name).cloned())
        })
    }

    fn delete_disk<'a>(&'a self, zone: &'a str, name: &'a str) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "delete_disk")?;
            state.calls.push(format!("delete_disk {zone} {name}"));
            state.disks.remove(name);
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn list_disks<'a>(
        &'a self,
        zone: &'a str,
        filter: Option<&'a str>,
    ) -> ComputeFuture<'a, Vec<DiskResource>> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "list_disks")?;
            state.calls.push(format!("list_disks {zone}"));
            Ok(state
                .disks
                .values()
                .filter(|entry| matches_filter(&entry.labels, filter))
                .cloned()
                .collect())
        })
    }

    fn create_snapshot<'a>(
        &'a self,
        zone: &'a str,
        disk_name: &'a str,
        spec: &'a SnapshotSpec,
    ) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "create_snapshot")?;
            state.calls.push(format!("create_snapshot {zone} {disk_name} {}", spec.name));
            state.snapshot_specs.push((disk_name.to_owned(), spec.clone()));
            state.snapshots.insert(
                spec.name.clone(),
                SnapshotResource {
                    name: spec.name.clone(),
                    labels: spec.labels.clone(),
                    self_link: format!("projects/test/global/snapshots/{}", spec.name),
                    source_disk: format!("projects/test/zones/{zone}/disks/{disk_name}"),
                },
            );
            Ok(Self::next_operation(&mut state, Some(zone)))
        })
    }

    fn list_snapshots<'a>(
        &'a self,
        filter: Option<&'a str>,
    ) -> ComputeFuture<'a, Vec<SnapshotResource>> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "list_snapshots")?;
            state.calls.push(String::from("list_snapshots"));
            Ok(state
                .snapshots
                .values()
                .filter(|entry| matches_filter(&entry.labels, filter))
                .cloned()
                .collect())
        })
    }

    fn delete_snapshot<'a>(&'a self, name: &'a str) -> ComputeFuture<'a, Operation> {
        Box::pin(async move {
            let mut state = self.lock();
            Self::take_failure(&mut state, "delete_snapshot")?;
            state.calls.push(format!("delete_snapshot {name}"));
            state.snapshots.remove(name);
            Ok(Self::next_operation(&mut state, None))
        })
    }

    fn get_operation<'a>(
        &'a self,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, Option<Operation>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(format!("get_operation {zone} {name}"));
            state.operation_fetches.pop_front().unwrap_or(Ok(None))
        })
    }
}

#[derive(Default)]
struct DnsState {
    calls: Vec<String>,
    records: BTreeMap<String, ARecord>,
    add_results: VecDeque<Result<(), DnsError>>,
    remove_results: VecDeque<Result<(), DnsError>>,
}

/// Scripted in-memory DNS surface.
#[derive(Clone)]
pub struct FakeDns {
    state: Arc<Mutex<DnsState>>,
    dns_name: String,
}

impl FakeDns {
    /// Creates a fake zone with the given DNS suffix (trailing dot).
    pub fn new(dns_name: &str) -> Self {
        Self { state: Arc::new(Mutex::new(DnsState::default())), dns_name: dns_name.to_owned() }
    }

    fn lock(&self) -> MutexGuard<'_, DnsState> {
        self.state.lock().expect("fake dns state poisoned")
    }

    /// Returns every call recorded so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Counts recorded calls starting with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock().calls.iter().filter(|call| call.starts_with(prefix)).count()
    }

    /// Returns the record stored under `name`.
    pub fn record(&self, name: &str) -> Option<ARecord> {
        self.lock().records.get(name).cloned()
    }

    /// Seeds a record, so the next default add collides.
    pub fn seed_record(&self, record: ARecord) {
        self.lock().records.insert(record.name.clone(), record);
    }

    /// Queues one add outcome, overriding the default behaviour.
    pub fn push_add_result(&self, result: Result<(), DnsError>) {
        self.lock().add_results.push_back(result);
    }

    /// Queues one remove outcome, overriding the default behaviour.
    pub fn push_remove_result(&self, result: Result<(), DnsError>) {
        self.lock().remove_results.push_back(result);
    }
}

impl DnsApi for FakeDns {
    fn zone<'a>(&'a self, managed_zone: &'a str) -> DnsFuture<'a, DnsZone> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(format!("zone {managed_zone}"));
            Ok(DnsZone { name: managed_zone.to_owned(), dns_name: self.dns_name.clone() })
        })
    }

    fn add_a_record<'a>(
        &'a self,
        _managed_zone: &'a str,
        record: &'a ARecord,
    ) -> DnsFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(format!("add {} {}", record.name, record.ip));
            if let Some(result) = state.add_results.pop_front() {
                return result;
            }
            if state.records.contains_key(&record.name) {
                return Err(DnsError::AlreadyExists { name: record.name.clone() });
            }
            state.records.insert(record.name.clone(), record.clone());
            Ok(())
        })
    }

    fn replace_a_record<'a>(
        &'a self,
        _managed_zone: &'a str,
        record: &'a ARecord,
    ) -> DnsFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(format!("replace {} {}", record.name, record.ip));
            state.records.insert(record.name.clone(), record.clone());
            Ok(())
        })
    }

    fn remove_a_record<'a>(&'a self, _managed_zone: &'a str, name: &'a str) -> DnsFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(format!("remove {name}"));
            if let Some(result) = state.remove_results.pop_front() {
                return result;
            }
            match state.records.remove(name) {
                Some(_) => Ok(()),
                None => Err(DnsError::NotFound { name: name.to_owned() }),
            }
        })
    }
}
