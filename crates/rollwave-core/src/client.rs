//! The cluster control-plane capability consumed by the engine.
//!
//! The engine never talks to a cluster directly; everything goes through
//! [`ClusterClient`]. Production code plugs in the REST implementation from
//! `rollwave-client`, tests plug in an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a [`ClusterClient`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("update conflict on {0}")]
    Conflict(String),

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected api response: {0}")]
    Api(String),
}

/// A rollout trigger configured on a deployment target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RolloutTrigger {
    /// Redeploys automatically when the referenced image tag moves.
    /// `automatic: false` means the trigger is configured but paused.
    ImageChange { automatic: bool },
    /// Redeploys on any spec change, including an image rewrite.
    ConfigChange,
}

/// Remote representation of one deployment target, as fetched.
///
/// Carries the optimistic-concurrency token (`resource_version`) and the full
/// object payload (`raw`) so an update can write the complete mutated spec
/// back. `raw` is opaque to the engine; fakes may leave it null.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentTarget {
    pub namespace: String,
    pub name: String,
    /// Image of the first container in the pod template.
    pub image: String,
    pub triggers: Vec<RolloutTrigger>,
    pub resource_version: String,
    /// Rollout generation counter, bumped by the remote on each accepted
    /// spec change.
    pub generation: i64,
    pub raw: serde_json::Value,
}

/// Point-in-time rollout status of a deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetStatus {
    pub generation: i64,
    pub ready_replicas: u32,
}

/// Read/write surface of the cluster control plane.
///
/// All methods are single round trips with no client-side retry; retry
/// policy lives in the engine.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List all project (namespace) names visible to the caller.
    async fn list_projects(&self) -> Result<Vec<String>, ClientError>;

    /// Fetch a deployment target, or `None` if the namespace has no
    /// deployment by that name.
    async fn get_target(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DeploymentTarget>, ClientError>;

    /// Resolve an image tag (`name:tag` within `namespace`) to the canonical
    /// digest reference recorded in the image stream.
    async fn resolve_image_tag(
        &self,
        namespace: &str,
        tag: &str,
    ) -> Result<String, ClientError>;

    /// Write a mutated target back, conditioned on its `resource_version`.
    /// Returns [`ClientError::Conflict`] when the remote version has moved.
    async fn update_target(&self, target: &DeploymentTarget) -> Result<(), ClientError>;

    /// Force a new rollout generation for a target.
    async fn instantiate_rollout(&self, namespace: &str, name: &str)
    -> Result<(), ClientError>;

    /// Fetch the current rollout status of a target.
    async fn target_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<TargetStatus, ClientError>;
}

impl DeploymentTarget {
    /// `namespace/name`, used in log fields and error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Whether an automatic (non-paused) image-change trigger is configured.
    pub fn has_automatic_image_trigger(&self) -> bool {
        self.triggers
            .iter()
            .any(|t| matches!(t, RolloutTrigger::ImageChange { automatic: true }))
    }

    /// Whether a config-change trigger is configured, in which case a spec
    /// write is enough to start a new rollout.
    pub fn has_config_change_trigger(&self) -> bool {
        self.triggers
            .iter()
            .any(|t| matches!(t, RolloutTrigger::ConfigChange))
    }
}
