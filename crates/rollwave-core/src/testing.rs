//! In-memory cluster fake for unit tests.
//!
//! `FakeCluster` implements [`ClusterClient`] over a mutex-guarded map and
//! lets tests script the failure modes the engine must tolerate: update
//! conflicts, canned status sequences, and a failing project listing.
//!
//! Semantics mirror the real control plane: an accepted spec write bumps the
//! resource version; the rollout generation bumps on a spec write only when
//! a config-change trigger is present, and always on an explicit
//! instantiate.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{
    ClientError, ClusterClient, DeploymentTarget, RolloutTrigger, TargetStatus,
};
use crate::progress::{Confirmation, ProgressSink, RolloutEvent};

pub fn make_target(
    namespace: &str,
    name: &str,
    image: &str,
    triggers: Vec<RolloutTrigger>,
) -> DeploymentTarget {
    DeploymentTarget {
        namespace: namespace.to_string(),
        name: name.to_string(),
        image: image.to_string(),
        triggers,
        resource_version: "1".to_string(),
        generation: 1,
        raw: serde_json::Value::Null,
    }
}

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct FakeState {
    projects: Vec<String>,
    fail_projects: bool,
    targets: HashMap<Key, DeploymentTarget>,
    image_tags: HashMap<Key, String>,
    /// Pending forced conflicts per target; each one simulates an external
    /// actor moving the resource version between our read and write.
    conflicts: HashMap<Key, u32>,
    update_counts: HashMap<Key, u32>,
    instantiated: Vec<String>,
    /// Canned status responses, consumed in order.
    scripted_status: HashMap<Key, VecDeque<Result<TargetStatus, ClientError>>>,
    /// Status returned forever once scripts run out.
    held_status: HashMap<Key, TargetStatus>,
}

pub struct FakeCluster {
    state: Mutex<FakeState>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_project(self, name: &str) -> Self {
        self.state.lock().unwrap().projects.push(name.to_string());
        self
    }

    pub fn with_target(self, target: DeploymentTarget) -> Self {
        self.state
            .lock()
            .unwrap()
            .targets
            .insert(key(&target.namespace, &target.name), target);
        self
    }

    pub fn with_image_tag(self, namespace: &str, tag: &str, digest: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .image_tags
            .insert(key(namespace, tag), digest.to_string());
        self
    }

    pub fn with_failing_projects(self) -> Self {
        self.state.lock().unwrap().fail_projects = true;
        self
    }

    /// Make the next `count` updates of the target fail with a conflict.
    pub fn conflict_times(&self, namespace: &str, name: &str, count: u32) {
        self.state
            .lock()
            .unwrap()
            .conflicts
            .insert(key(namespace, name), count);
    }

    /// Queue one canned status response.
    pub fn script_status(
        &self,
        namespace: &str,
        name: &str,
        status: Result<TargetStatus, ClientError>,
    ) {
        self.state
            .lock()
            .unwrap()
            .scripted_status
            .entry(key(namespace, name))
            .or_default()
            .push_back(status);
    }

    /// Pin the status returned once scripted responses are exhausted.
    pub fn hold_status(&self, namespace: &str, name: &str, status: TargetStatus) {
        self.state
            .lock()
            .unwrap()
            .held_status
            .insert(key(namespace, name), status);
    }

    pub fn scripted_statuses_remaining(&self, namespace: &str, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .scripted_status
            .get(&key(namespace, name))
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    pub fn image_of(&self, namespace: &str, name: &str) -> String {
        self.state.lock().unwrap().targets[&key(namespace, name)]
            .image
            .clone()
    }

    pub fn update_count(&self, namespace: &str, name: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .update_counts
            .get(&key(namespace, name))
            .copied()
            .unwrap_or(0)
    }

    /// Qualified names of targets that received a forced instantiate,
    /// in call order.
    pub fn instantiated(&self) -> Vec<String> {
        self.state.lock().unwrap().instantiated.clone()
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_projects(&self) -> Result<Vec<String>, ClientError> {
        let state = self.state.lock().unwrap();
        if state.fail_projects {
            return Err(ClientError::Transport("project listing failed".to_string()));
        }
        Ok(state.projects.clone())
    }

    async fn get_target(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DeploymentTarget>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state.targets.get(&key(namespace, name)).cloned())
    }

    async fn resolve_image_tag(
        &self,
        namespace: &str,
        tag: &str,
    ) -> Result<String, ClientError> {
        let state = self.state.lock().unwrap();
        state
            .image_tags
            .get(&key(namespace, tag))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("imagestreamtag {namespace}/{tag}")))
    }

    async fn update_target(&self, target: &DeploymentTarget) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        let k = key(&target.namespace, &target.name);
        *state.update_counts.entry(k.clone()).or_insert(0) += 1;

        if !state.targets.contains_key(&k) {
            return Err(ClientError::NotFound(format!(
                "{}/{}",
                target.namespace, target.name
            )));
        }

        // Forced conflicts simulate an external writer moving the resource
        // version between our read and write.
        let force_conflict = match state.conflicts.get_mut(&k) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };

        let stored = state
            .targets
            .get_mut(&k)
            .expect("presence checked above");

        if force_conflict {
            let bumped: u64 = stored.resource_version.parse::<u64>().unwrap_or(0) + 1;
            stored.resource_version = bumped.to_string();
            return Err(ClientError::Conflict(format!(
                "{}/{}",
                target.namespace, target.name
            )));
        }

        // Genuine optimistic-concurrency check.
        if target.resource_version != stored.resource_version {
            return Err(ClientError::Conflict(format!(
                "{}/{}",
                target.namespace, target.name
            )));
        }

        stored.image = target.image.clone();
        stored.triggers = target.triggers.clone();
        let bumped: u64 = stored.resource_version.parse::<u64>().unwrap_or(0) + 1;
        stored.resource_version = bumped.to_string();
        if stored.has_config_change_trigger() {
            stored.generation += 1;
        }
        Ok(())
    }

    async fn instantiate_rollout(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        let k = key(namespace, name);
        let Some(stored) = state.targets.get_mut(&k) else {
            return Err(ClientError::NotFound(format!("{namespace}/{name}")));
        };
        stored.generation += 1;
        state.instantiated.push(format!("{namespace}/{name}"));
        Ok(())
    }

    async fn target_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<TargetStatus, ClientError> {
        let mut state = self.state.lock().unwrap();
        let k = key(namespace, name);

        if let Some(queue) = state.scripted_status.get_mut(&k) {
            if let Some(next) = queue.pop_front() {
                return next;
            }
        }
        if let Some(held) = state.held_status.get(&k) {
            return Ok(*held);
        }

        let Some(stored) = state.targets.get(&k) else {
            return Err(ClientError::NotFound(format!("{namespace}/{name}")));
        };
        // Unscripted default: the current generation is fully ready.
        Ok(TargetStatus {
            generation: stored.generation,
            ready_replicas: 1,
        })
    }
}

/// Records every published event for later assertions.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<RolloutEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RolloutEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for CollectingSink {
    fn publish(&self, event: RolloutEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Always declines the confirmation prompt.
pub struct Decline;

impl Confirmation for Decline {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
