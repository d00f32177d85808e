//! Readiness wait.
//!
//! The platform offers no push notification for rollout completion, so this
//! is a deliberate polling loop: every interval, fetch the target's status
//! and finish when a strictly newer generation reports at least one ready
//! replica. A status fetch error or the wall-clock deadline ends the wait.
//! Runs on `tokio::time`, so tests drive it with a paused clock.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::client::{ClusterClient, TargetStatus};
use crate::error::TargetError;
use crate::progress::{ProgressSink, RolloutEvent};

/// Poll interval and overall deadline for one readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// A rollout is ready once a newer generation has at least one ready
/// replica. Both conditions; a bumped generation with zero ready replicas is
/// still rolling, and ready replicas on the old generation are stale.
fn is_ready(previous_generation: i64, status: &TargetStatus) -> bool {
    status.generation > previous_generation && status.ready_replicas > 0
}

/// Block until the target's rollout is ready, the deadline passes, or a
/// status fetch fails.
pub async fn wait_for_rollout(
    client: &dyn ClusterClient,
    namespace: &str,
    name: &str,
    previous_generation: i64,
    config: &WaitConfig,
    progress: &dyn ProgressSink,
) -> Result<(), TargetError> {
    let deadline = Instant::now() + config.timeout;
    debug!(%namespace, %name, previous_generation, "waiting for rollout");

    loop {
        tokio::time::sleep(config.poll_interval).await;

        let status = client.target_status(namespace, name).await?;
        if is_ready(previous_generation, &status) {
            info!(
                %namespace,
                %name,
                generation = status.generation,
                ready = status.ready_replicas,
                "rollout ready"
            );
            return Ok(());
        }
        progress.publish(RolloutEvent::WaitPoll {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });

        if Instant::now() >= deadline {
            return Err(TargetError::TimedOut {
                timeout: config.timeout,
            });
        }
    }
}
