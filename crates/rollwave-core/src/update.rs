//! The per-target update protocol.
//!
//! One logical unit per target, retried as a whole on optimistic-concurrency
//! conflict: fetch the live object, short-circuit if another actor already
//! updated it, inspect triggers, write the new image, and force a rollout
//! when the write alone does not start one. Failure here is terminal for the
//! target and invisible to its siblings.

use tracing::{debug, info, warn};

use crate::client::{ClientError, ClusterClient};
use crate::error::TargetError;
use crate::retry::RetryPolicy;
use crate::select::Target;

/// Result of a successful update unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateApplied {
    /// Generation recorded before the write; the readiness wait looks for
    /// anything strictly greater.
    pub previous_generation: i64,
    /// False when the live image already matched and nothing was written.
    pub mutated: bool,
}

/// Apply the desired image to one target.
///
/// Retries the whole fetch-mutate-write unit on [`ClientError::Conflict`]
/// under `policy`. An automatic image-change trigger fails fast with
/// [`TargetError::UnsupportedTrigger`]: such triggers race with manual image
/// rewrites and are not silently overridden. A config-change trigger means
/// the spec write itself starts a rollout; otherwise a forced instantiate
/// follows the write.
pub async fn apply_update(
    client: &dyn ClusterClient,
    target: &Target,
    policy: &RetryPolicy,
) -> Result<UpdateApplied, TargetError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;

        let mut remote = client
            .get_target(&target.namespace, &target.name)
            .await?
            .ok_or_else(|| {
                TargetError::Remote(ClientError::NotFound(format!(
                    "{}/{}",
                    target.namespace, target.name
                )))
            })?;
        let previous_generation = remote.generation;

        if remote.image == target.desired_image.as_str() {
            debug!(
                namespace = %target.namespace,
                name = %target.name,
                "already at desired image, skipping write"
            );
            return Ok(UpdateApplied {
                previous_generation,
                mutated: false,
            });
        }

        if remote.has_automatic_image_trigger() {
            warn!(
                namespace = %target.namespace,
                name = %target.name,
                "automatic image-change trigger configured, refusing to update"
            );
            return Err(TargetError::UnsupportedTrigger);
        }
        let needs_instantiate = !remote.has_config_change_trigger();

        remote.image = target.desired_image.as_str().to_string();
        match client.update_target(&remote).await {
            Ok(()) => {
                if needs_instantiate {
                    client
                        .instantiate_rollout(&target.namespace, &target.name)
                        .await?;
                }
                info!(
                    namespace = %target.namespace,
                    name = %target.name,
                    image = %target.desired_image,
                    attempt,
                    "image updated"
                );
                return Ok(UpdateApplied {
                    previous_generation,
                    mutated: true,
                });
            }
            Err(ClientError::Conflict(resource)) => {
                if attempt >= policy.max_attempts {
                    return Err(TargetError::RetriesExhausted { attempts: attempt });
                }
                debug!(%resource, attempt, "update conflict, retrying");
                tokio::time::sleep(policy.backoff(attempt)).await;
            }
            Err(e) => return Err(TargetError::Remote(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RolloutTrigger;
    use crate::image::ImageLocator;
    use crate::testing::{FakeCluster, make_target};

    const NEW: &str = "registry/base/app@sha256:new";
    const OLD: &str = "registry/base/app@sha256:old";

    fn work_item() -> Target {
        Target {
            namespace: "shop".to_string(),
            name: "api".to_string(),
            current_image: ImageLocator::new(OLD),
            desired_image: ImageLocator::new(NEW),
        }
    }

    #[tokio::test]
    async fn writes_image_and_instantiates_without_triggers() {
        let cluster = FakeCluster::new().with_target(make_target("shop", "api", OLD, vec![]));

        let applied = apply_update(&cluster, &work_item(), &RetryPolicy::immediate(3))
            .await
            .unwrap();

        assert!(applied.mutated);
        assert_eq!(applied.previous_generation, 1);
        assert_eq!(cluster.image_of("shop", "api"), NEW);
        assert_eq!(cluster.instantiated(), vec!["shop/api".to_string()]);
    }

    #[tokio::test]
    async fn config_change_trigger_skips_instantiate() {
        let cluster = FakeCluster::new().with_target(make_target(
            "shop",
            "api",
            OLD,
            vec![RolloutTrigger::ConfigChange],
        ));

        let applied = apply_update(&cluster, &work_item(), &RetryPolicy::immediate(3))
            .await
            .unwrap();

        assert!(applied.mutated);
        assert_eq!(cluster.image_of("shop", "api"), NEW);
        assert!(cluster.instantiated().is_empty());
    }

    #[tokio::test]
    async fn automatic_image_trigger_fails_fast() {
        let cluster = FakeCluster::new().with_target(make_target(
            "shop",
            "api",
            OLD,
            vec![RolloutTrigger::ImageChange { automatic: true }],
        ));

        let err = apply_update(&cluster, &work_item(), &RetryPolicy::immediate(3))
            .await
            .unwrap_err();

        assert_eq!(err, TargetError::UnsupportedTrigger);
        // Nothing was written.
        assert_eq!(cluster.image_of("shop", "api"), OLD);
        assert_eq!(cluster.update_count("shop", "api"), 0);
    }

    #[tokio::test]
    async fn disabled_image_trigger_is_updatable() {
        let cluster = FakeCluster::new().with_target(make_target(
            "shop",
            "api",
            OLD,
            vec![RolloutTrigger::ImageChange { automatic: false }],
        ));

        let applied = apply_update(&cluster, &work_item(), &RetryPolicy::immediate(3))
            .await
            .unwrap();
        assert!(applied.mutated);
        assert_eq!(cluster.image_of("shop", "api"), NEW);
    }

    #[tokio::test]
    async fn short_circuits_when_another_actor_updated() {
        let cluster = FakeCluster::new().with_target(make_target("shop", "api", NEW, vec![]));

        let applied = apply_update(&cluster, &work_item(), &RetryPolicy::immediate(3))
            .await
            .unwrap();

        assert!(!applied.mutated);
        assert_eq!(cluster.update_count("shop", "api"), 0);
        assert!(cluster.instantiated().is_empty());
    }

    #[tokio::test]
    async fn conflicts_are_retried_until_success() {
        let cluster = FakeCluster::new().with_target(make_target("shop", "api", OLD, vec![]));
        cluster.conflict_times("shop", "api", 2);

        let applied = apply_update(&cluster, &work_item(), &RetryPolicy::immediate(5))
            .await
            .unwrap();

        assert!(applied.mutated);
        assert_eq!(cluster.image_of("shop", "api"), NEW);
        // Two conflicted attempts plus the one that landed.
        assert_eq!(cluster.update_count("shop", "api"), 3);
    }

    #[tokio::test]
    async fn conflicts_beyond_budget_exhaust_retries() {
        let cluster = FakeCluster::new().with_target(make_target("shop", "api", OLD, vec![]));
        cluster.conflict_times("shop", "api", 10);

        let err = apply_update(&cluster, &work_item(), &RetryPolicy::immediate(3))
            .await
            .unwrap_err();

        assert_eq!(err, TargetError::RetriesExhausted { attempts: 3 });
        assert_eq!(cluster.image_of("shop", "api"), OLD);
    }

    #[tokio::test]
    async fn missing_target_is_remote_not_found() {
        let cluster = FakeCluster::new();
        let err = apply_update(&cluster, &work_item(), &RetryPolicy::immediate(3))
            .await
            .unwrap_err();
        assert!(matches!(err, TargetError::Remote(ClientError::NotFound(_))));
    }
}
