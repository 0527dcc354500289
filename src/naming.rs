//! Deterministic, label-qualified naming for disks and snapshots.
//!
//! Names are derived purely from the owning VM and a logical snapshot name so
//! that every remote resource can be re-identified without local state.

/// Returns the disk name for the given VM and disk index.
///
/// Index 0 is reserved for the boot disk; additional disks continue the
/// sequence in attachment order.
#[must_use]
pub fn disk_name(vm: &str, index: usize) -> String {
    format!("{vm}-disk{index}")
}

/// Returns the globally unique snapshot name for one disk of a logical
/// snapshot.
#[must_use]
pub fn snapshot_name(logical: &str, disk: &str) -> String {
    format!("{logical}-{disk}")
}

/// Extracts a disk name from its source reference.
///
/// Source references are URLs or partial resource paths; the resource name is
/// always the last path segment. A bare name passes through unchanged.
#[must_use]
pub fn disk_name_from_source(source: &str) -> &str {
    short_name(source)
}

/// Returns the last path segment of a resource reference.
///
/// The remote system reports zones, machine types, and disk sources as fully
/// qualified URLs; the short name is all the orchestrator ever persists in
/// labels or derived names.
#[must_use]
pub fn short_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("vm17", 0, "vm17-disk0")]
    #[case("vm17", 1, "vm17-disk1")]
    #[case("build-host", 12, "build-host-disk12")]
    fn disk_name_appends_index(#[case] vm: &str, #[case] index: usize, #[case] expected: &str) {
        assert_eq!(disk_name(vm, index), expected);
    }

    #[rstest]
    fn snapshot_name_joins_logical_and_disk() {
        assert_eq!(snapshot_name("nightly", "vm17-disk0"), "nightly-vm17-disk0");
    }

    #[rstest]
    #[case(
        "https://compute.googleapis.com/compute/v1/projects/p/zones/z/disks/vm17-disk0",
        "vm17-disk0"
    )]
    #[case("projects/p/zones/z/disks/vm17-disk1", "vm17-disk1")]
    #[case("vm17-disk0", "vm17-disk0")]
    fn disk_name_from_source_takes_last_segment(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(disk_name_from_source(source), expected);
    }

    #[rstest]
    fn short_name_handles_machine_types() {
        assert_eq!(short_name("zones/us-central1-a/machineTypes/e2-medium"), "e2-medium");
    }
}
