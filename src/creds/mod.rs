//! # Credential Broker
//!
//! Provisions the credential sets a harness runs with. With tenant isolation
//! enabled it mints a fresh tenant and user per harness through the identity
//! admin API, so concurrently running harnesses cannot collide on names or
//! quotas; an isolated set is never reused across harnesses. With isolation
//! disabled it hands out the statically configured credentials.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::IdentityClient;
use crate::config::{IdentityConfig, WireFormat};
use crate::errors::{Error, Result};
use crate::utils::rand_name;

/// Privilege level of a credential set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Admin,
}

impl Role {
    /// Role name granted on the minted tenant
    fn grant_name(&self) -> &'static str {
        match self {
            Role::Primary => "member",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// A complete set of credentials for one role
#[derive(Debug, Clone)]
pub struct CredentialSet {
    pub username: String,
    pub password: String,
    pub tenant_name: String,
    pub role: Role,
}

/// Identity records created by this broker, kept for revocation
#[derive(Debug)]
struct Minted {
    tenant_id: String,
    user_id: Option<String>,
}

/// Per-harness credential provisioner.
#[derive(Debug)]
pub struct CredentialBroker {
    name: String,
    config: IdentityConfig,
    wire_format: WireFormat,
    cached: HashMap<Role, CredentialSet>,
    minted: Vec<Minted>,
    admin_identity: Option<IdentityClient>,
}

impl CredentialBroker {
    pub fn new(name: &str, config: &IdentityConfig, wire_format: WireFormat) -> Self {
        Self {
            name: name.to_string(),
            config: config.clone(),
            wire_format,
            cached: HashMap::new(),
            minted: Vec::new(),
            admin_identity: None,
        }
    }

    /// Obtain credentials for `role`. Repeated calls for the same role within
    /// one broker return the same set.
    pub async fn acquire(&mut self, role: Role) -> Result<CredentialSet> {
        if let Some(set) = self.cached.get(&role) {
            return Ok(set.clone());
        }

        let set = if self.config.allow_tenant_isolation {
            self.mint(role).await?
        } else {
            self.static_credentials(role)?
        };

        debug!(harness = %self.name, %role, tenant = %set.tenant_name, "Credentials acquired");
        self.cached.insert(role, set.clone());
        Ok(set)
    }

    /// Revoke every minted credential set. Idempotent and best-effort:
    /// individual revocation failures are logged and skipped so teardown
    /// always completes, even after a partially failed acquisition.
    pub async fn release_all(&mut self) {
        if self.minted.is_empty() {
            self.cached.clear();
            return;
        }

        // The admin identity client exists whenever anything was minted.
        if let Some(identity) = &self.admin_identity {
            for record in self.minted.drain(..) {
                if let Some(user_id) = &record.user_id {
                    if let Err(error) = identity.delete_user(user_id).await {
                        warn!(harness = %self.name, user_id = %user_id, %error,
                            "Failed to revoke isolated user");
                    }
                }
                if let Err(error) = identity.delete_tenant(&record.tenant_id).await {
                    warn!(harness = %self.name, tenant_id = %record.tenant_id, %error,
                        "Failed to revoke isolated tenant");
                }
            }
        }
        self.cached.clear();
    }

    fn static_credentials(&self, role: Role) -> Result<CredentialSet> {
        match role {
            Role::Primary => Ok(CredentialSet {
                username: self.config.username.clone(),
                password: self.config.password.clone(),
                tenant_name: self.config.tenant_name.clone(),
                role,
            }),
            Role::Admin => {
                let admin = self.config.admin.as_ref().ok_or_else(|| {
                    Error::config("admin credentials requested but not configured")
                })?;
                Ok(CredentialSet {
                    username: admin.username.clone(),
                    password: admin.password.clone(),
                    tenant_name: admin.tenant_name.clone(),
                    role,
                })
            }
        }
    }

    async fn ensure_admin_identity(&mut self) -> Result<IdentityClient> {
        if self.admin_identity.is_none() {
            let admin = self.config.admin.as_ref().ok_or_else(|| {
                Error::config("tenant isolation requires admin credentials to mint accounts")
            })?;
            let client = IdentityClient::new(&self.config.auth_url, self.wire_format)?;
            let token = client
                .issue_token(&admin.username, &admin.password, &admin.tenant_name)
                .await
                .map_err(|e| {
                    Error::config_with_source(
                        "could not authenticate as admin to mint isolated credentials",
                        Box::new(e),
                    )
                })?;
            self.admin_identity = Some(client.with_token(&token.id));
        }
        Ok(self.admin_identity.clone().expect("admin identity just initialized"))
    }

    async fn mint(&mut self, role: Role) -> Result<CredentialSet> {
        let identity = self.ensure_admin_identity().await?;

        let tenant_name = rand_name(&format!("{}-{}", self.name, role));
        let username = rand_name(&format!("{}-user", self.name));
        let password = Uuid::new_v4().to_string();

        let tenant = identity.create_tenant(&tenant_name).await.map_err(|e| {
            Error::config_with_source(
                format!("failed to provision isolated tenant for role {role}"),
                Box::new(e),
            )
        })?;
        // Track the tenant immediately: release_all must find it even when
        // user creation below fails.
        self.minted.push(Minted { tenant_id: tenant.id.clone(), user_id: None });

        let user = identity
            .create_user(&username, &password, &tenant.id)
            .await
            .map_err(|e| {
                Error::config_with_source(
                    format!("failed to provision isolated user for role {role}"),
                    Box::new(e),
                )
            })?;
        if let Some(record) = self.minted.last_mut() {
            record.user_id = Some(user.id.clone());
        }

        identity
            .assign_role(&tenant.id, &user.id, role.grant_name())
            .await
            .map_err(|e| {
                Error::config_with_source(
                    format!("failed to grant role {role} on isolated tenant"),
                    Box::new(e),
                )
            })?;

        info!(harness = %self.name, %role, tenant = %tenant.name, user = %user.name,
            "Minted isolated credentials");

        Ok(CredentialSet { username, password, tenant_name: tenant.name, role })
    }
}
