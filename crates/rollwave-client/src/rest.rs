//! REST implementation of [`ClusterClient`].
//!
//! Talks to an OpenShift-style control plane with bearer-token auth. Each
//! method is one round trip; conflict handling and retries live in the
//! engine.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use rollwave_core::{ClientError, ClusterClient, DeploymentTarget, TargetStatus};

use crate::wire;

/// Connection parameters for a cluster.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API server base URL, e.g. `https://api.cluster.example:6443`.
    pub server: String,
    /// Bearer token presented on every request.
    pub token: String,
    /// Skip TLS certificate verification (self-signed lab clusters).
    pub insecure_skip_tls_verify: bool,
}

pub struct OpenShiftClient {
    http: reqwest::Client,
    server: String,
    token: String,
}

fn projects_path() -> String {
    "/apis/project.openshift.io/v1/projects".to_string()
}

fn deploymentconfig_path(namespace: &str, name: &str) -> String {
    format!("/apis/apps.openshift.io/v1/namespaces/{namespace}/deploymentconfigs/{name}")
}

fn instantiate_path(namespace: &str, name: &str) -> String {
    format!("{}/instantiate", deploymentconfig_path(namespace, name))
}

fn imagestreamtag_path(namespace: &str, tag: &str) -> String {
    format!("/apis/image.openshift.io/v1/namespaces/{namespace}/imagestreamtags/{tag}")
}

fn status_to_error(status: StatusCode, resource: &str) -> ClientError {
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(resource.to_string()),
        StatusCode::CONFLICT => ClientError::Conflict(resource.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ClientError::Forbidden(resource.to_string())
        }
        other => ClientError::Api(format!("{resource}: http {other}")),
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Transport(e.to_string())
}

impl OpenShiftClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            server: config.server.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    async fn get_value(&self, path: &str, resource: &str) -> Result<Value, ClientError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_to_error(status, resource));
        }
        response.json().await.map_err(transport)
    }
}

#[async_trait]
impl ClusterClient for OpenShiftClient {
    async fn list_projects(&self) -> Result<Vec<String>, ClientError> {
        let value = self.get_value(&projects_path(), "projects").await?;
        let list: wire::KubeList<wire::Project> = serde_json::from_value(value)
            .map_err(|e| ClientError::Api(format!("malformed project list: {e}")))?;
        Ok(list.items.into_iter().map(|p| p.metadata.name).collect())
    }

    async fn get_target(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DeploymentTarget>, ClientError> {
        let resource = format!("deploymentconfig {namespace}/{name}");
        match self
            .get_value(&deploymentconfig_path(namespace, name), &resource)
            .await
        {
            Ok(value) => Ok(Some(wire::target_from_value(namespace, name, value)?)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn resolve_image_tag(
        &self,
        namespace: &str,
        tag: &str,
    ) -> Result<String, ClientError> {
        let resource = format!("imagestreamtag {namespace}/{tag}");
        let value = self
            .get_value(&imagestreamtag_path(namespace, tag), &resource)
            .await?;
        let ist: wire::ImageStreamTag = serde_json::from_value(value)
            .map_err(|e| ClientError::Api(format!("malformed imagestreamtag: {e}")))?;
        Ok(ist.image.docker_image_reference)
    }

    async fn update_target(&self, target: &DeploymentTarget) -> Result<(), ClientError> {
        let resource = format!("deploymentconfig {}", target.qualified_name());
        let mut body = target.raw.clone();
        wire::write_image(&mut body, &target.image)?;

        let response = self
            .http
            .put(self.url(&deploymentconfig_path(&target.namespace, &target.name)))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_to_error(status, &resource));
        }
        debug!(target = %target.qualified_name(), "deploymentconfig updated");
        Ok(())
    }

    async fn instantiate_rollout(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let resource = format!("deploymentconfig {namespace}/{name}");
        let response = self
            .http
            .post(self.url(&instantiate_path(namespace, name)))
            .bearer_auth(&self.token)
            .json(&wire::DeploymentRequest::forced(name))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_to_error(status, &resource));
        }
        debug!(%namespace, %name, "rollout instantiated");
        Ok(())
    }

    async fn target_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<TargetStatus, ClientError> {
        let resource = format!("deploymentconfig {namespace}/{name}");
        let value = self
            .get_value(&deploymentconfig_path(namespace, name), &resource)
            .await?;
        wire::status_from_value(&value)
    }
}
