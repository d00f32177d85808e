//! Top-level rollout driver.
//!
//! Resolve images → scan for targets → confirm → plan batches → fan out one
//! task per target with a join barrier between batches → summarize. Targets
//! within a batch run concurrently and independently; batch *i+1* starts
//! only after every target in batch *i* has a terminal outcome.

use std::sync::Arc;

use regex::Regex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::client::ClusterClient;
use crate::error::RolloutError;
use crate::image::{ImageLocator, resolve_image};
use crate::outcome::{RolloutOutcome, RolloutSummary, TargetReport};
use crate::plan::plan_batches;
use crate::progress::{AutoConfirm, Confirmation, NullSink, ProgressSink, RolloutEvent};
use crate::retry::RetryPolicy;
use crate::select::{ScanCounters, Target, select_targets};
use crate::update::{UpdateApplied, apply_update};
use crate::wait::{WaitConfig, wait_for_rollout};

/// What to roll out and where.
#[derive(Debug, Clone)]
pub struct RolloutRequest {
    /// Regex over project (namespace) names.
    pub project_pattern: String,
    /// Deployment name looked up in every matching project.
    pub deployment: String,
    /// Optional filter: only update targets currently running this image.
    pub current_image: Option<String>,
    /// Image to roll out; tag reference or digest reference.
    pub new_image: String,
    /// Upper bound on concurrently updated targets.
    pub batch_concurrency: usize,
}

/// Tunable engine behavior.
#[derive(Debug, Clone, Default)]
pub struct RolloutConfig {
    pub retry: RetryPolicy,
    pub wait: WaitConfig,
}

/// Drives a whole rollout run.
pub struct Orchestrator {
    client: Arc<dyn ClusterClient>,
    confirmation: Arc<dyn Confirmation>,
    progress: Arc<dyn ProgressSink>,
    config: RolloutConfig,
}

impl Orchestrator {
    /// An orchestrator that confirms automatically and discards progress.
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self {
            client,
            confirmation: Arc::new(AutoConfirm),
            progress: Arc::new(NullSink),
            config: RolloutConfig::default(),
        }
    }

    pub fn with_confirmation(mut self, confirmation: Arc<dyn Confirmation>) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_config(mut self, config: RolloutConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one rollout.
    ///
    /// Errors here are pre-flight: nothing has been mutated. Once the first
    /// batch starts, failures are per-target and land in the summary.
    pub async fn run(&self, request: &RolloutRequest) -> Result<RolloutSummary, RolloutError> {
        let pattern =
            Regex::new(&request.project_pattern).map_err(|source| RolloutError::InvalidPattern {
                pattern: request.project_pattern.clone(),
                source,
            })?;

        let new_image = self.resolve(&request.new_image).await?;
        let current_image = match &request.current_image {
            Some(reference) => Some(self.resolve(reference).await?),
            None => None,
        };

        let selection = select_targets(
            self.client.as_ref(),
            &pattern,
            &request.deployment,
            current_image.as_ref(),
            &new_image,
            self.progress.as_ref(),
        )
        .await?;
        let worklist = selection.worklist;
        let counters = selection.counters;
        let mut reports = selection.reports;

        if worklist.is_empty() {
            info!("no targets to update");
            return Ok(summarize(false, counters, reports));
        }

        let prompt = format!(
            "Update {} deployment(s) named {:?} to {}?",
            worklist.len(),
            request.deployment,
            new_image
        );
        if !self.confirmation.confirm(&prompt) {
            info!("rollout aborted before any mutation");
            return Ok(summarize(true, counters, reports));
        }

        let batches = plan_batches(worklist, request.batch_concurrency);
        let batch_total = batches.len();
        for (index, batch) in batches.into_iter().enumerate() {
            self.progress.publish(RolloutEvent::BatchStarted {
                index: index + 1,
                total: batch_total,
                size: batch.len(),
            });
            info!(
                batch = index + 1,
                of = batch_total,
                size = batch.len(),
                "starting batch"
            );

            let mut tasks = JoinSet::new();
            for target in batch {
                let client = Arc::clone(&self.client);
                let progress = Arc::clone(&self.progress);
                let retry = self.config.retry.clone();
                let wait = self.config.wait;
                tasks.spawn(async move {
                    run_target(client, target, retry, wait, progress).await
                });
            }
            // Join barrier: the batch ends only when every sibling has a
            // terminal outcome.
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(report) => reports.push(report),
                    Err(e) => error!(error = %e, "rollout task panicked"),
                }
            }
        }

        let summary = summarize(false, counters, reports);
        info!(
            updated = summary.updated,
            failed = summary.failed,
            "rollout complete"
        );
        Ok(summary)
    }

    async fn resolve(&self, reference: &str) -> Result<ImageLocator, RolloutError> {
        let locator = resolve_image(self.client.as_ref(), reference).await?;
        self.progress.publish(RolloutEvent::ImageResolved {
            reference: reference.to_string(),
            locator: locator.as_str().to_string(),
        });
        Ok(locator)
    }
}

/// Update one target and wait for its rollout. Owns the target; every exit
/// path produces exactly one report.
async fn run_target(
    client: Arc<dyn ClusterClient>,
    target: Target,
    retry: RetryPolicy,
    wait: WaitConfig,
    progress: Arc<dyn ProgressSink>,
) -> TargetReport {
    let namespace = target.namespace.clone();
    let name = target.name.clone();

    let outcome = match apply_update(client.as_ref(), &target, &retry).await {
        Err(e) => {
            warn!(%namespace, %name, error = %e, "target update failed");
            progress.publish(RolloutEvent::TargetFailed {
                namespace: namespace.clone(),
                name: name.clone(),
                error: e.to_string(),
            });
            RolloutOutcome::Failed(e)
        }
        Ok(UpdateApplied { mutated: false, .. }) => {
            progress.publish(RolloutEvent::TargetAlreadyCurrent {
                namespace: namespace.clone(),
                name: name.clone(),
            });
            RolloutOutcome::AlreadyCurrent
        }
        Ok(UpdateApplied {
            previous_generation,
            mutated: true,
        }) => {
            progress.publish(RolloutEvent::TargetUpdated {
                namespace: namespace.clone(),
                name: name.clone(),
            });
            match wait_for_rollout(
                client.as_ref(),
                &namespace,
                &name,
                previous_generation,
                &wait,
                progress.as_ref(),
            )
            .await
            {
                Ok(()) => {
                    progress.publish(RolloutEvent::TargetReady {
                        namespace: namespace.clone(),
                        name: name.clone(),
                    });
                    RolloutOutcome::Updated
                }
                Err(e) => {
                    warn!(%namespace, %name, error = %e, "rollout wait failed");
                    progress.publish(RolloutEvent::TargetFailed {
                        namespace: namespace.clone(),
                        name: name.clone(),
                        error: e.to_string(),
                    });
                    RolloutOutcome::Failed(e)
                }
            }
        }
    };

    TargetReport {
        namespace,
        name,
        outcome,
    }
}

fn summarize(
    aborted: bool,
    counters: ScanCounters,
    reports: Vec<TargetReport>,
) -> RolloutSummary {
    let updated = reports
        .iter()
        .filter(|r| r.outcome == RolloutOutcome::Updated)
        .count();
    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, RolloutOutcome::Failed(_)))
        .count();
    RolloutSummary {
        aborted,
        counters,
        updated,
        failed,
        reports,
    }
}
