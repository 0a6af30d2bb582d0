//! # Configuration Settings
//!
//! Defines the configuration structure consumed by the harness. Grouped the
//! way the target services are grouped: identity, compute, volume, plus
//! availability flags that gate whole test classes.

use crate::errors::{Error, Result};
use crate::poll::WaitConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Wire encoding the client facade negotiates with the target service.
///
/// A single test suite runs once per configured format; there is no
/// per-format duplication of test bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Json,
}

impl WireFormat {
    /// MIME type sent in Accept/Content-Type headers
    pub fn mime(&self) -> &'static str {
        match self {
            WireFormat::Json => "application/json",
        }
    }
}

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct TestConfig {
    /// Identity service and credential configuration
    #[validate(nested)]
    pub identity: IdentityConfig,

    /// Compute service configuration
    #[validate(nested)]
    pub compute: ComputeConfig,

    /// Volume service configuration
    #[validate(nested)]
    pub volume: VolumeConfig,

    /// Per-service availability flags
    pub service_available: ServiceAvailability,

    /// Wire encoding used by all client facades
    pub interface: WireFormat,
}

impl TestConfig {
    /// Load configuration from an optional TOML file (path in
    /// `STRATUS_CONFIG_FILE`) merged with `STRATUS_*` environment variables,
    /// then validate it.
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var("STRATUS_CONFIG_FILE") {
            builder = builder.add_source(config::File::with_name(&path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("STRATUS")
                .separator("__")
                .try_parsing(true),
        );

        let settings: TestConfig = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        if self.compute.build_timeout_seconds < self.compute.build_interval_seconds {
            return Err(Error::config(
                "Compute build timeout must not be shorter than the build interval",
            ));
        }
        if self.volume.build_timeout_seconds < self.volume.build_interval_seconds {
            return Err(Error::config(
                "Volume build timeout must not be shorter than the build interval",
            ));
        }
        Ok(())
    }
}

/// Identity service and credential configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IdentityConfig {
    /// Identity service endpoint, e.g. `http://identity.local/v2.0/`
    #[validate(length(min = 1, message = "Auth URL cannot be empty"))]
    pub auth_url: String,

    /// Statically configured primary (non-admin) credentials
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,
    pub password: String,
    #[validate(length(min = 1, message = "Tenant name cannot be empty"))]
    pub tenant_name: String,

    /// Statically configured admin credentials; absent when the deployment
    /// exposes no admin account to the suite
    pub admin: Option<AdminCredentials>,

    /// Mint a fresh tenant and user per harness instead of sharing the
    /// static credentials above
    pub allow_tenant_isolation: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            auth_url: "http://127.0.0.1:5000/v2.0/".to_string(),
            username: "stratus".to_string(),
            password: "secret".to_string(),
            tenant_name: "stratus-project".to_string(),
            admin: None,
            allow_tenant_isolation: false,
        }
    }
}

impl IdentityConfig {
    /// Whether an admin credential group is configured
    pub fn has_admin(&self) -> bool {
        self.admin.is_some()
    }
}

/// Admin credential group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
    pub tenant_name: String,
}

/// Compute service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ComputeConfig {
    /// Compute service endpoint
    #[validate(length(min = 1, message = "Compute endpoint cannot be empty"))]
    pub endpoint: String,

    /// Seconds between status polls
    #[validate(range(min = 1, max = 300, message = "Interval must be between 1 and 300 seconds"))]
    pub build_interval_seconds: u64,

    /// Seconds before a status wait gives up
    #[validate(range(min = 1, max = 3600, message = "Timeout must be between 1 and 3600 seconds"))]
    pub build_timeout_seconds: u64,

    /// Image reference used for test servers
    pub image_ref: String,

    /// Flavor reference used for test servers
    pub flavor_ref: String,

    /// Name of the network test servers should attach to, when one is
    /// configured. Lookup failures fall back to no explicit network.
    pub fixed_network_name: Option<String>,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8774/v2/".to_string(),
            build_interval_seconds: 10,
            build_timeout_seconds: 300,
            image_ref: "cirros-default".to_string(),
            flavor_ref: "m1.tiny".to_string(),
            fixed_network_name: None,
        }
    }
}

impl ComputeConfig {
    /// Get the poll interval as Duration
    pub fn build_interval(&self) -> Duration {
        Duration::from_secs(self.build_interval_seconds)
    }

    /// Get the poll timeout as Duration
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_seconds)
    }

    /// Wait configuration for compute status transitions
    pub fn wait_config(&self, description: impl Into<String>) -> WaitConfig {
        WaitConfig::new(self.build_interval(), self.build_timeout(), description)
    }
}

/// Volume service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct VolumeConfig {
    /// Volume service endpoint
    #[validate(length(min = 1, message = "Volume endpoint cannot be empty"))]
    pub endpoint: String,

    /// Seconds between status polls
    #[validate(range(min = 1, max = 300, message = "Interval must be between 1 and 300 seconds"))]
    pub build_interval_seconds: u64,

    /// Seconds before a status wait gives up
    #[validate(range(min = 1, max = 3600, message = "Timeout must be between 1 and 3600 seconds"))]
    pub build_timeout_seconds: u64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8776/v1/".to_string(),
            build_interval_seconds: 1,
            build_timeout_seconds: 300,
        }
    }
}

impl VolumeConfig {
    /// Get the poll interval as Duration
    pub fn build_interval(&self) -> Duration {
        Duration::from_secs(self.build_interval_seconds)
    }

    /// Get the poll timeout as Duration
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_seconds)
    }

    /// Wait configuration for volume status transitions
    pub fn wait_config(&self, description: impl Into<String>) -> WaitConfig {
        WaitConfig::new(self.build_interval(), self.build_timeout(), description)
    }
}

/// Per-service availability flags. A disabled service skips every test
/// class that requires it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAvailability {
    pub compute: bool,
    pub volume: bool,
}

impl Default for ServiceAvailability {
    fn default() -> Self {
        Self { compute: true, volume: true }
    }
}
