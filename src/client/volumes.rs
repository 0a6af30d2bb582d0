//! Volume service API.

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::RestClient;
use crate::errors::{Error, Result};
use crate::poll::{wait_until, WaitConfig};
use crate::resources::Volume;

#[derive(Debug, Clone)]
pub struct VolumesClient {
    rest: RestClient,
    wait: WaitConfig,
}

/// Creation parameters for a volume. The service rejects non-positive sizes
/// with a 400.
#[derive(Debug, Clone, Serialize, Default)]
pub struct CreateVolumeRequest {
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct VolumeEnvelope {
    volume: Volume,
}

impl VolumesClient {
    pub fn new(rest: RestClient, wait: WaitConfig) -> Self {
        Self { rest, wait }
    }

    pub async fn create_volume(
        &self,
        request: &CreateVolumeRequest,
    ) -> Result<(StatusCode, Volume)> {
        let (status, envelope): (_, VolumeEnvelope) =
            self.rest.post("volumes", &json!({"volume": request})).await?;
        Ok((status, envelope.volume))
    }

    pub async fn show_volume(&self, volume_id: &str) -> Result<(StatusCode, Volume)> {
        let (status, envelope): (_, VolumeEnvelope) = self
            .rest
            .get(&format!("volumes/{volume_id}"), &[])
            .await
            .map_err(|e| e.locate("volume", volume_id))?;
        Ok((status, envelope.volume))
    }

    pub async fn update_volume(
        &self,
        volume_id: &str,
        display_name: &str,
    ) -> Result<(StatusCode, Volume)> {
        let body = json!({"volume": {"display_name": display_name}});
        let (status, envelope): (_, VolumeEnvelope) = self
            .rest
            .put(&format!("volumes/{volume_id}"), &body)
            .await
            .map_err(|e| e.locate("volume", volume_id))?;
        Ok((status, envelope.volume))
    }

    pub async fn delete_volume(&self, volume_id: &str) -> Result<StatusCode> {
        self.rest
            .delete(&format!("volumes/{volume_id}"))
            .await
            .map_err(|e| e.locate("volume", volume_id))
    }

    pub async fn attach_volume(
        &self,
        volume_id: &str,
        server_id: &str,
        mountpoint: &str,
    ) -> Result<StatusCode> {
        let body = json!({
            "os-attach": {"instance_uuid": server_id, "mountpoint": mountpoint}
        });
        self.rest
            .post_action(&format!("volumes/{volume_id}/action"), &body)
            .await
            .map_err(|e| e.locate("volume", volume_id))
    }

    pub async fn detach_volume(&self, volume_id: &str) -> Result<StatusCode> {
        self.rest
            .post_action(&format!("volumes/{volume_id}/action"), &json!({"os-detach": {}}))
            .await
            .map_err(|e| e.locate("volume", volume_id))
    }

    /// Poll until the volume reaches `status`, returning its descriptor.
    pub async fn wait_for_volume_status(&self, volume_id: &str, status: &str) -> Result<Volume> {
        let wait = self
            .wait
            .clone()
            .named(format!("volume {volume_id} to reach status {status}"));
        let client = self;
        wait_until(&wait, move || async move {
            let (_, volume) = client.show_volume(volume_id).await?;
            if volume.status == status {
                Ok(volume)
            } else {
                Err(Error::state("volume", volume_id, &volume.status, status))
            }
        })
        .await
    }

    /// Poll until the volume is gone. `NotFound` is the success signal here.
    pub async fn wait_for_deletion(&self, volume_id: &str) -> Result<()> {
        let wait = self.wait.clone().named(format!("volume {volume_id} to be deleted"));
        let client = self;
        wait_until(&wait, move || async move {
            match client.show_volume(volume_id).await {
                Err(e) if e.is_not_found() => Ok(()),
                Ok((_, volume)) => {
                    Err(Error::state("volume", volume_id, &volume.status, "deleted"))
                }
                Err(e) => Err(e),
            }
        })
        .await
    }
}
