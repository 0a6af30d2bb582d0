//! Compute admin hosts API.

use reqwest::StatusCode;
use serde::Deserialize;

use super::RestClient;
use crate::errors::Result;
use crate::resources::{HostDetailEntry, HostSummary};

/// Client for the compute admin host inventory. Requires an admin-scoped
/// token; non-admin callers get `Unauthorized`.
#[derive(Debug, Clone)]
pub struct HostsClient {
    rest: RestClient,
}

#[derive(Debug, Deserialize)]
struct HostIndex {
    hosts: Vec<HostSummary>,
}

#[derive(Debug, Deserialize)]
struct HostShow {
    host: Vec<HostDetailEntry>,
}

impl HostsClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    /// List hosts, optionally filtered by availability zone. An unknown zone
    /// yields an empty list, not an error; a blank zone is no filter at all.
    pub async fn list_hosts(&self, zone: Option<&str>) -> Result<(StatusCode, Vec<HostSummary>)> {
        let query: Vec<(&str, &str)> = match zone {
            Some(zone) => vec![("zone", zone)],
            None => Vec::new(),
        };
        let (status, index): (_, HostIndex) = self.rest.get("os-hosts", &query).await?;
        Ok((status, index.hosts))
    }

    /// Show the per-project resource breakdown for one host.
    pub async fn show_host_detail(
        &self,
        host_name: &str,
    ) -> Result<(StatusCode, Vec<HostDetailEntry>)> {
        let (status, show): (_, HostShow) = self
            .rest
            .get(&format!("os-hosts/{host_name}"), &[])
            .await
            .map_err(|e| e.locate("host", host_name))?;
        Ok((status, show.host))
    }
}
