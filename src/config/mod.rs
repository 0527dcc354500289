//! Configuration loading via `ortho-config`.
//!
//! Values merge defaults, configuration files, and environment variables.
//! Pool definitions live in the configuration file; everything a pool needs
//! to create a member VM is captured here and immutable for the duration of
//! one lifecycle operation.

use std::collections::BTreeSet;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_disk_type() -> String {
    String::from("pd-ssd")
}

/// A named class of interchangeable VMs sharing a template and machine type.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PoolConfig {
    /// Pool name; doubles as the `pool` label value on every managed
    /// resource.
    pub name: String,
    /// Boot image reference used for member boot disks (for example
    /// `projects/debian-cloud/global/images/family/debian-9`).
    pub template: String,
    /// Zone members are created in.
    pub zone: String,
    /// Machine type short name (for example `e2-medium`).
    pub machine_type: String,
    /// Network reference for member instances.
    pub network: String,
    /// Subnetwork reference, when the network is custom-mode.
    #[serde(default)]
    pub subnetwork: Option<String>,
    /// Disk type short name for member disks. Defaults to `pd-ssd`.
    #[serde(default = "default_disk_type")]
    pub disk_type: String,
}

impl PoolConfig {
    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("name", &self.name),
            ("template", &self.template),
            ("zone", &self.zone),
            ("machine_type", &self.machine_type),
            ("network", &self.network),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "pool '{}': {field} must not be empty",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Provider-level configuration derived from environment variables and
/// configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "VMPOOL")]
pub struct ProviderConfig {
    /// Project that owns every managed resource.
    pub project: String,
    /// Bearer token used to authenticate REST calls. Token acquisition is
    /// external; only presence is validated here.
    pub access_token: String,
    /// Managed DNS zone identifier. Unset disables record synchronisation.
    pub dns_zone: Option<String>,
    /// Domain appended to VM names for hostnames and readiness probes.
    pub domain: Option<String>,
    /// Pool definitions.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub pools: Vec<PoolConfig>,
}

impl ProviderConfig {
    /// Loads configuration without parsing CLI arguments. Values still merge
    /// defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("vmpool")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages state
    /// how to supply missing values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.trim().is_empty() {
            return Err(ConfigError::MissingField(String::from(
                "missing project: set VMPOOL_PROJECT or add project to vmpool.yaml",
            )));
        }
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingField(String::from(
                "missing access token: set VMPOOL_ACCESS_TOKEN or add access_token to vmpool.yaml",
            )));
        }
        for pool in &self.pools {
            pool.validate()?;
        }
        Ok(())
    }

    /// Resolves a pool definition by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPool`] when no pool of that name is
    /// configured.
    pub fn pool(&self, name: &str) -> Result<&PoolConfig, ConfigError> {
        self.pools
            .iter()
            .find(|pool| pool.name == name)
            .ok_or_else(|| ConfigError::UnknownPool { name: name.to_owned() })
    }

    /// Returns every zone used by at least one configured pool.
    #[must_use]
    pub fn zones(&self) -> BTreeSet<&str> {
        self.pools.iter().map(|pool| pool.zone.as_str()).collect()
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// A required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// The configuration loader failed to merge its sources.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// The requested pool is not configured.
    #[error("unknown pool '{name}'")]
    UnknownPool {
        /// Pool name that failed to resolve.
        name: String,
    },
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
