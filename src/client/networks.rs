//! Network listing, used only to resolve the configured fixed network when
//! creating servers.

use reqwest::StatusCode;
use serde::Deserialize;

use super::RestClient;
use crate::errors::Result;
use crate::resources::Network;

#[derive(Debug, Clone)]
pub struct NetworksClient {
    rest: RestClient,
}

#[derive(Debug, Deserialize)]
struct NetworkIndex {
    networks: Vec<Network>,
}

impl NetworksClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub async fn list_networks(&self) -> Result<(StatusCode, Vec<Network>)> {
        let (status, index): (_, NetworkIndex) = self.rest.get("networks", &[]).await?;
        Ok((status, index.networks))
    }
}
