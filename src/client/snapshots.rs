//! Volume snapshot API.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::RestClient;
use crate::errors::{Error, Result};
use crate::poll::{wait_until, WaitConfig};
use crate::resources::Snapshot;

#[derive(Debug, Clone)]
pub struct SnapshotsClient {
    rest: RestClient,
    wait: WaitConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSnapshotRequest {
    pub volume_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotEnvelope {
    snapshot: Snapshot,
}

impl SnapshotsClient {
    pub fn new(rest: RestClient, wait: WaitConfig) -> Self {
        Self { rest, wait }
    }

    pub async fn create_snapshot(
        &self,
        request: &CreateSnapshotRequest,
    ) -> Result<(StatusCode, Snapshot)> {
        let (status, envelope): (_, SnapshotEnvelope) =
            self.rest.post("snapshots", &json!({"snapshot": request})).await?;
        Ok((status, envelope.snapshot))
    }

    pub async fn show_snapshot(&self, snapshot_id: &str) -> Result<(StatusCode, Snapshot)> {
        let (status, envelope): (_, SnapshotEnvelope) = self
            .rest
            .get(&format!("snapshots/{snapshot_id}"), &[])
            .await
            .map_err(|e| e.locate("snapshot", snapshot_id))?;
        Ok((status, envelope.snapshot))
    }

    pub async fn delete_snapshot(&self, snapshot_id: &str) -> Result<StatusCode> {
        self.rest
            .delete(&format!("snapshots/{snapshot_id}"))
            .await
            .map_err(|e| e.locate("snapshot", snapshot_id))
    }

    pub async fn wait_for_snapshot_status(
        &self,
        snapshot_id: &str,
        status: &str,
    ) -> Result<Snapshot> {
        let wait = self
            .wait
            .clone()
            .named(format!("snapshot {snapshot_id} to reach status {status}"));
        let client = self;
        wait_until(&wait, move || async move {
            let (_, snapshot) = client.show_snapshot(snapshot_id).await?;
            if snapshot.status == status {
                Ok(snapshot)
            } else {
                Err(Error::state("snapshot", snapshot_id, &snapshot.status, status))
            }
        })
        .await
    }

    pub async fn wait_for_deletion(&self, snapshot_id: &str) -> Result<()> {
        let wait = self.wait.clone().named(format!("snapshot {snapshot_id} to be deleted"));
        let client = self;
        wait_until(&wait, move || async move {
            match client.show_snapshot(snapshot_id).await {
                Err(e) if e.is_not_found() => Ok(()),
                Ok((_, snapshot)) => {
                    Err(Error::state("snapshot", snapshot_id, &snapshot.status, "deleted"))
                }
                Err(e) => Err(e),
            }
        })
        .await
    }
}
