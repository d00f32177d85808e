//! Wire payloads for the OpenShift-style control-plane API.
//!
//! Only the slices of each object the engine reads are typed; the full
//! fetched object rides along untyped in `DeploymentTarget::raw` so updates
//! can write the complete spec back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rollwave_core::{ClientError, DeploymentTarget, RolloutTrigger, TargetStatus};

#[derive(Debug, Deserialize)]
pub struct KubeList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct Project {
    pub metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "resourceVersion")]
    pub resource_version: String,
}

#[derive(Debug, Deserialize)]
pub struct DeploymentConfig {
    pub metadata: Metadata,
    pub spec: DeploymentConfigSpec,
    #[serde(default)]
    pub status: DeploymentConfigStatus,
}

#[derive(Debug, Deserialize)]
pub struct DeploymentConfigSpec {
    #[serde(default = "Vec::new")]
    pub triggers: Vec<Trigger>,
    pub template: PodTemplate,
}

#[derive(Debug, Deserialize)]
pub struct PodTemplate {
    pub spec: PodSpec,
}

#[derive(Debug, Deserialize)]
pub struct PodSpec {
    #[serde(default = "Vec::new")]
    pub containers: Vec<Container>,
}

#[derive(Debug, Deserialize)]
pub struct Container {
    pub image: String,
}

#[derive(Debug, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: String,
    #[serde(default, rename = "imageChangeParams")]
    pub image_change_params: Option<ImageChangeParams>,
}

#[derive(Debug, Deserialize)]
pub struct ImageChangeParams {
    /// OpenShift defaults a present image-change trigger to automatic.
    #[serde(default = "default_true")]
    pub automatic: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfigStatus {
    #[serde(default)]
    pub latest_version: i64,
    #[serde(default)]
    pub ready_replicas: u32,
}

#[derive(Debug, Deserialize)]
pub struct ImageStreamTag {
    pub image: ImageStreamImage,
}

#[derive(Debug, Deserialize)]
pub struct ImageStreamImage {
    #[serde(rename = "dockerImageReference")]
    pub docker_image_reference: String,
}

/// Body of the forced-instantiate call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    pub kind: &'static str,
    pub api_version: &'static str,
    pub name: String,
    pub latest: bool,
    pub force: bool,
}

impl DeploymentRequest {
    pub fn forced(name: &str) -> Self {
        Self {
            kind: "DeploymentRequest",
            api_version: "apps.openshift.io/v1",
            name: name.to_string(),
            latest: true,
            force: true,
        }
    }
}

/// Convert a fetched deploymentconfig object into the engine's remote
/// representation, keeping the full object for write-back.
pub fn target_from_value(
    namespace: &str,
    name: &str,
    value: Value,
) -> Result<DeploymentTarget, ClientError> {
    let parsed: DeploymentConfig = serde_json::from_value(value.clone())
        .map_err(|e| ClientError::Api(format!("malformed deploymentconfig: {e}")))?;

    let image = parsed
        .spec
        .template
        .spec
        .containers
        .first()
        .map(|c| c.image.clone())
        .ok_or_else(|| {
            ClientError::Api(format!("{namespace}/{name}: pod template has no containers"))
        })?;

    let triggers = parsed
        .spec
        .triggers
        .iter()
        .filter_map(|t| match t.trigger_type.as_str() {
            "ImageChange" => Some(RolloutTrigger::ImageChange {
                automatic: t
                    .image_change_params
                    .as_ref()
                    .map(|p| p.automatic)
                    .unwrap_or(true),
            }),
            "ConfigChange" => Some(RolloutTrigger::ConfigChange),
            _ => None,
        })
        .collect();

    Ok(DeploymentTarget {
        namespace: namespace.to_string(),
        name: name.to_string(),
        image,
        triggers,
        resource_version: parsed.metadata.resource_version,
        generation: parsed.status.latest_version,
        raw: value,
    })
}

pub fn status_from_value(value: &Value) -> Result<TargetStatus, ClientError> {
    let status: DeploymentConfigStatus = value
        .get("status")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| ClientError::Api(format!("malformed status: {e}")))?
        .unwrap_or_default();
    Ok(TargetStatus {
        generation: status.latest_version,
        ready_replicas: status.ready_replicas,
    })
}

/// Rewrite the first container's image in the full object before PUT.
pub fn write_image(raw: &mut Value, image: &str) -> Result<(), ClientError> {
    let slot = raw
        .pointer_mut("/spec/template/spec/containers/0/image")
        .ok_or_else(|| ClientError::Api("object has no container image field".to_string()))?;
    *slot = Value::String(image.to_string());
    Ok(())
}
