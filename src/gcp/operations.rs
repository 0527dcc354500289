//! Zone operation endpoints of the Compute Engine REST surface.

use crate::compute::{ComputeError, Operation};

use super::GcpCompute;

impl GcpCompute {
    pub(in crate::gcp) async fn operation_get(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<Option<Operation>, ComputeError> {
        let url = self.zone_url(zone, &format!("operations/{name}"));
        self.fetch(&url, "operation").await
    }
}
