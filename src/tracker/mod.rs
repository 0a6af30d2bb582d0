//! # Resource Tracker
//!
//! Records every ephemeral resource a harness creates so teardown can delete
//! all of them regardless of how individual tests ended. Cleanup is
//! best-effort and exhaustive: per-resource failures are collected, never
//! propagated.

use std::fmt;
use std::future::Future;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::errors::{Error, Result};
use crate::resources::HasId;

/// Kind of ephemeral resource under tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Volume,
    Snapshot,
    Server,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Volume => write!(f, "volume"),
            ResourceKind::Snapshot => write!(f, "snapshot"),
            ResourceKind::Server => write!(f, "server"),
        }
    }
}

/// Handle to one tracked resource
#[derive(Debug, Clone)]
pub struct TrackedResource {
    pub kind: ResourceKind,
    pub id: String,
}

/// Cleanup phase in which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPhase {
    Delete,
    Confirm,
}

/// One swallowed cleanup failure, surfaced to the caller as a value
#[derive(Debug)]
pub struct CleanupFailure {
    pub id: String,
    pub phase: CleanupPhase,
    pub error: Error,
}

/// Per-harness list of created resources. Owned exclusively by one harness;
/// never shared across test classes.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    resources: Vec<TrackedResource>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resource after its creation call succeeded
    pub fn track(&mut self, kind: ResourceKind, id: impl Into<String>) {
        let id = id.into();
        debug!(%kind, resource_id = %id, "Tracking resource");
        self.resources.push(TrackedResource { kind, id });
    }

    /// Number of tracked resources of the given kind
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.resources.iter().filter(|r| r.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Delete every tracked resource of `kind` and await confirmed deletion.
    ///
    /// Two passes: first attempt deletion of each resource, then wait for
    /// each deletion to be confirmed, so the remote service works on all
    /// deletions concurrently instead of serializing delete+wait per
    /// resource. Per-resource failures are collected into the returned list;
    /// the tracker's entries for `kind` are drained unconditionally.
    pub async fn clear_all<D, DFut, C, CFut>(
        &mut self,
        kind: ResourceKind,
        mut delete: D,
        mut confirm: C,
    ) -> Vec<CleanupFailure>
    where
        D: FnMut(String) -> DFut,
        DFut: Future<Output = Result<()>>,
        C: FnMut(String) -> CFut,
        CFut: Future<Output = Result<()>>,
    {
        let mut targets = Vec::new();
        self.resources.retain(|r| {
            if r.kind == kind {
                targets.push(r.id.clone());
                false
            } else {
                true
            }
        });

        let mut failures = Vec::new();

        for id in &targets {
            if let Err(error) = delete(id.clone()).await {
                warn!(%kind, resource_id = %id, %error, "Failed to delete resource during cleanup");
                failures.push(CleanupFailure { id: id.clone(), phase: CleanupPhase::Delete, error });
            }
        }

        for id in &targets {
            if let Err(error) = confirm(id.clone()).await {
                warn!(%kind, resource_id = %id, %error, "Deletion not confirmed during cleanup");
                failures.push(CleanupFailure {
                    id: id.clone(),
                    phase: CleanupPhase::Confirm,
                    error,
                });
            }
        }

        failures
    }
}

/// Canonical create-track-wait pattern.
///
/// Runs the creation operation, asserts the expected success status, tracks
/// the new resource id, then blocks until the resource reaches its terminal
/// status. Tracking happens before the wait begins, so the resource is
/// cleaned up at teardown even when the wait phase fails.
pub async fn create_and_wait<R, C, CFut, W, WFut>(
    tracker: &mut ResourceTracker,
    kind: ResourceKind,
    expected_status: StatusCode,
    create: C,
    wait: W,
) -> Result<R>
where
    R: HasId,
    C: FnOnce() -> CFut,
    CFut: Future<Output = Result<(StatusCode, R)>>,
    W: FnOnce(String) -> WFut,
    WFut: Future<Output = Result<()>>,
{
    let (status, resource) = create().await?;
    if status != expected_status {
        return Err(Error::unexpected_status(
            expected_status.as_u16(),
            status.as_u16(),
            format!("creating {kind}"),
        ));
    }

    tracker.track(kind, resource.id());
    wait(resource.id().to_string()).await?;
    Ok(resource)
}
