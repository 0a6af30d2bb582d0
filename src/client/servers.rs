//! Compute server API.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::RestClient;
use crate::errors::{Error, Result};
use crate::poll::{wait_until, WaitConfig};
use crate::resources::{NetworkRef, Server};

#[derive(Debug, Clone)]
pub struct ServersClient {
    rest: RestClient,
    wait: WaitConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub name: String,
    #[serde(rename = "imageRef")]
    pub image_ref: String,
    #[serde(rename = "flavorRef")]
    pub flavor_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<Vec<NetworkRef>>,
}

#[derive(Debug, Deserialize)]
struct ServerEnvelope {
    server: Server,
}

impl ServersClient {
    pub fn new(rest: RestClient, wait: WaitConfig) -> Self {
        Self { rest, wait }
    }

    pub async fn create_server(
        &self,
        request: &CreateServerRequest,
    ) -> Result<(StatusCode, Server)> {
        let (status, envelope): (_, ServerEnvelope) =
            self.rest.post("servers", &json!({"server": request})).await?;
        Ok((status, envelope.server))
    }

    pub async fn show_server(&self, server_id: &str) -> Result<(StatusCode, Server)> {
        let (status, envelope): (_, ServerEnvelope) = self
            .rest
            .get(&format!("servers/{server_id}"), &[])
            .await
            .map_err(|e| e.locate("server", server_id))?;
        Ok((status, envelope.server))
    }

    pub async fn delete_server(&self, server_id: &str) -> Result<StatusCode> {
        self.rest
            .delete(&format!("servers/{server_id}"))
            .await
            .map_err(|e| e.locate("server", server_id))
    }

    /// Poll until the server reaches `status` (e.g. `ACTIVE`).
    pub async fn wait_for_server_status(&self, server_id: &str, status: &str) -> Result<Server> {
        let wait = self
            .wait
            .clone()
            .named(format!("server {server_id} to reach status {status}"));
        let client = self;
        wait_until(&wait, move || async move {
            let (_, server) = client.show_server(server_id).await?;
            if server.status == status {
                Ok(server)
            } else {
                Err(Error::state("server", server_id, &server.status, status))
            }
        })
        .await
    }

    /// Poll until the server is fully gone.
    pub async fn wait_for_termination(&self, server_id: &str) -> Result<()> {
        let wait = self.wait.clone().named(format!("server {server_id} to terminate"));
        let client = self;
        wait_until(&wait, move || async move {
            match client.show_server(server_id).await {
                Err(e) if e.is_not_found() => Ok(()),
                Ok((_, server)) => {
                    Err(Error::state("server", server_id, &server.status, "terminated"))
                }
                Err(e) => Err(e),
            }
        })
        .await
    }
}
