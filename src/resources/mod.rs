//! Serde models for the resource descriptors the target services return.
//! Host descriptors are read-only; the suite never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Anything with a service-assigned identifier
pub trait HasId {
    fn id(&self) -> &str;
}

/// One entry from the compute admin host index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSummary {
    pub host_name: String,
    pub service: String,
    pub zone: String,
}

/// Wrapper entry returned by the host detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostDetailEntry {
    pub resource: HostResource,
}

/// Capacity descriptor for a single host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostResource {
    pub host: String,
    pub project: String,
    pub cpu: i64,
    pub disk_gb: i64,
    pub memory_mb: i64,
}

/// A block storage volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub status: String,
    pub size: i64,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl HasId for Volume {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A point-in-time snapshot of a volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    pub status: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl HasId for Snapshot {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A compute instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub status: String,
}

impl HasId for Server {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A network visible to the current tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
}

/// Network attachment reference passed when creating a server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRef {
    pub uuid: String,
}

/// An authentication token issued by the identity service
#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub id: String,
    pub tenant: TenantRef,
}

/// Tenant the token is scoped to
#[derive(Debug, Clone, Deserialize)]
pub struct TenantRef {
    pub id: String,
    pub name: String,
}

/// A tenant/project managed through the identity admin API
#[derive(Debug, Clone, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
}

/// A user managed through the identity admin API
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}
