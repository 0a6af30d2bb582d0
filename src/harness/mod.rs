//! # Harness
//!
//! Composes credentials, service clients, resource tracking and polling into
//! the setup/teardown lifecycle test cases consume:
//!
//! ```text
//! Unconfigured → (set_up) → ClassReady → test bodies → (tear_down) → ClassTornDown
//! ```
//!
//! `set_up` fails fast with a skip when a required backing service is marked
//! unavailable or when admin credentials are required but absent. Teardown
//! is best-effort and exhaustive: it deletes every tracked resource in a
//! fixed order and revokes credentials, and never returns an error.

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::client::{ClientSet, CreateServerRequest, CreateSnapshotRequest, CreateVolumeRequest};
use crate::config::TestConfig;
use crate::creds::{CredentialBroker, Role};
use crate::errors::{Error, Result};
use crate::resources::{NetworkRef, Server, Snapshot, Volume};
use crate::tracker::{create_and_wait, ResourceKind, ResourceTracker};
use crate::utils::rand_name;

/// Why a harness could not be brought up.
#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    /// The whole test class should be skipped, with a reason string
    #[error("skipped: {0}")]
    Skip(String),
    /// Setup genuinely failed; the class aborts
    #[error(transparent)]
    Failed(#[from] Error),
}

/// What a harness needs before any of its tests can run.
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    name: String,
    needs_compute: bool,
    needs_volume: bool,
    require_admin: bool,
}

impl HarnessOptions {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            needs_compute: false,
            needs_volume: false,
            require_admin: false,
        }
    }

    pub fn with_compute(mut self) -> Self {
        self.needs_compute = true;
        self
    }

    pub fn with_volume(mut self) -> Self {
        self.needs_volume = true;
        self
    }

    pub fn with_admin(mut self) -> Self {
        self.require_admin = true;
        self
    }
}

/// A ready test-class environment. Owns its credential broker and resource
/// tracker exclusively; nothing here is shared across harnesses.
pub struct Harness {
    pub config: TestConfig,
    pub clients: ClientSet,
    admin: Option<ClientSet>,
    name: String,
    broker: CredentialBroker,
    tracker: ResourceTracker,
}

impl Harness {
    /// Bring up the class environment: check availability flags, acquire
    /// credentials, authenticate client sets.
    pub async fn set_up(config: TestConfig, options: HarnessOptions) -> std::result::Result<Self, SetupError> {
        config.validate()?;

        if options.needs_compute && !config.service_available.compute {
            return Err(SetupError::Skip(format!(
                "{} skipped as the compute service is not available",
                options.name
            )));
        }
        if options.needs_volume && !config.service_available.volume {
            return Err(SetupError::Skip(format!(
                "{} skipped as the volume service is not available",
                options.name
            )));
        }
        if options.require_admin && !config.identity.has_admin() {
            return Err(SetupError::Skip(format!(
                "{} skipped: missing admin credentials in configuration",
                options.name
            )));
        }

        let mut broker = CredentialBroker::new(&options.name, &config.identity, config.interface);

        match Self::build_clients(&config, &options, &mut broker).await {
            Ok((clients, admin)) => {
                info!(
                    harness = %options.name,
                    isolated = config.identity.allow_tenant_isolation,
                    admin = admin.is_some(),
                    "Harness ready"
                );
                Ok(Self {
                    config,
                    clients,
                    admin,
                    name: options.name,
                    broker,
                    tracker: ResourceTracker::new(),
                })
            }
            Err(error) => {
                // Credentials may have been partially minted; revoke them
                // before reporting the setup failure.
                broker.release_all().await;
                Err(SetupError::Failed(error))
            }
        }
    }

    async fn build_clients(
        config: &TestConfig,
        options: &HarnessOptions,
        broker: &mut CredentialBroker,
    ) -> Result<(ClientSet, Option<ClientSet>)> {
        let primary = broker.acquire(Role::Primary).await?;
        let clients = ClientSet::authenticate(config, &primary).await?;

        let admin = if options.require_admin {
            let creds = broker.acquire(Role::Admin).await?;
            Some(ClientSet::authenticate(config, &creds).await?)
        } else {
            None
        };

        Ok((clients, admin))
    }

    /// Admin-scoped clients. Only available when the harness was set up with
    /// `with_admin()`.
    pub fn admin(&self) -> &ClientSet {
        self.admin
            .as_ref()
            .expect("harness was set up without admin credentials")
    }

    /// Number of currently tracked resources of `kind`
    pub fn tracked(&self, kind: ResourceKind) -> usize {
        self.tracker.count(kind)
    }

    /// Create a volume, track it, and wait until it is `available`.
    pub async fn create_volume(&mut self, request: CreateVolumeRequest) -> Result<Volume> {
        let volumes = &self.clients.volumes;
        create_and_wait(
            &mut self.tracker,
            ResourceKind::Volume,
            StatusCode::OK,
            move || async move { volumes.create_volume(&request).await },
            move |id| async move {
                volumes.wait_for_volume_status(&id, "available").await.map(|_| ())
            },
        )
        .await
    }

    /// Snapshot a volume, track the snapshot, and wait until it is `available`.
    pub async fn create_snapshot(
        &mut self,
        volume_id: &str,
        display_name: Option<String>,
    ) -> Result<Snapshot> {
        let snapshots = &self.clients.snapshots;
        let request = CreateSnapshotRequest { volume_id: volume_id.to_string(), display_name };
        create_and_wait(
            &mut self.tracker,
            ResourceKind::Snapshot,
            StatusCode::OK,
            move || async move { snapshots.create_snapshot(&request).await },
            move |id| async move {
                snapshots.wait_for_snapshot_status(&id, "available").await.map(|_| ())
            },
        )
        .await
    }

    /// Boot a server with the configured image/flavor, track it, and wait
    /// until it is `ACTIVE`. A generated name is used when none is given.
    pub async fn create_server(&mut self, name: Option<String>) -> Result<Server> {
        let name = name.unwrap_or_else(|| rand_name(&format!("{}-instance", self.name)));
        let networks = self.default_networks().await?;
        let request = CreateServerRequest {
            name,
            image_ref: self.config.compute.image_ref.clone(),
            flavor_ref: self.config.compute.flavor_ref.clone(),
            networks,
        };

        let servers = &self.clients.servers;
        create_and_wait(
            &mut self.tracker,
            ResourceKind::Server,
            StatusCode::ACCEPTED,
            move || async move { servers.create_server(&request).await },
            move |id| async move {
                servers.wait_for_server_status(&id, "ACTIVE").await.map(|_| ())
            },
        )
        .await
    }

    /// Resolve the configured fixed network into an attachment reference.
    ///
    /// Under tenant isolation the configured network may legitimately be
    /// invisible to the minted tenant; that and a missing network endpoint
    /// fall back to no explicit network rather than failing the test.
    pub async fn default_networks(&self) -> Result<Option<Vec<NetworkRef>>> {
        let Some(fixed) = &self.config.compute.fixed_network_name else {
            return Ok(None);
        };

        match self.clients.networks.list_networks().await {
            Ok((_, networks)) => {
                if let Some(network) = networks.iter().find(|n| &n.name == fixed) {
                    Ok(Some(vec![NetworkRef { uuid: network.id.clone() }]))
                } else {
                    info!(network = %fixed,
                        "Unable to find configured network, starting instance without one");
                    Ok(None)
                }
            }
            Err(e) if e.is_not_found() => {
                info!(network = %fixed,
                    "Network lookup unavailable, starting instance without one");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Tear the class environment down: delete all tracked resources in a
    /// fixed order (snapshots, volumes, servers), then revoke credentials.
    /// Individual cleanup failures are logged and swallowed.
    pub async fn tear_down(mut self) {
        let snapshots = &self.clients.snapshots;
        let failures = self
            .tracker
            .clear_all(
                ResourceKind::Snapshot,
                move |id| async move { snapshots.delete_snapshot(&id).await.map(|_| ()) },
                move |id| async move { snapshots.wait_for_deletion(&id).await },
            )
            .await;
        if !failures.is_empty() {
            warn!(harness = %self.name, count = failures.len(), "Snapshot cleanup had failures");
        }

        let volumes = &self.clients.volumes;
        let failures = self
            .tracker
            .clear_all(
                ResourceKind::Volume,
                move |id| async move { volumes.delete_volume(&id).await.map(|_| ()) },
                move |id| async move { volumes.wait_for_deletion(&id).await },
            )
            .await;
        if !failures.is_empty() {
            warn!(harness = %self.name, count = failures.len(), "Volume cleanup had failures");
        }

        let servers = &self.clients.servers;
        let failures = self
            .tracker
            .clear_all(
                ResourceKind::Server,
                move |id| async move { servers.delete_server(&id).await.map(|_| ()) },
                move |id| async move { servers.wait_for_termination(&id).await },
            )
            .await;
        if !failures.is_empty() {
            warn!(harness = %self.name, count = failures.len(), "Server cleanup had failures");
        }

        self.broker.release_all().await;
        info!(harness = %self.name, "Harness torn down");
    }
}
