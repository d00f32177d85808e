//! Target selection.
//!
//! Scans every project matching the pattern for the named deployment and
//! builds the update worklist. The scan is a read-only snapshot: targets are
//! read once here and not rescanned after planning; updates operate on
//! whatever remote state is current at execution time.

use regex::Regex;
use tracing::{debug, info};

use crate::client::ClusterClient;
use crate::error::RolloutError;
use crate::image::ImageLocator;
use crate::outcome::{RolloutOutcome, TargetReport};
use crate::progress::{ProgressSink, RolloutEvent};

/// One deployment candidate queued for update. Owned by exactly one update
/// worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub namespace: String,
    pub name: String,
    pub current_image: ImageLocator,
    pub desired_image: ImageLocator,
}

/// Informational scan tallies. Reported in the summary; not control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCounters {
    /// Projects visible in the cluster.
    pub projects_total: usize,
    /// Projects whose name matched the pattern.
    pub projects_matched: usize,
    /// Projects discarded by the name pattern.
    pub namespace_mismatch: usize,
    /// Candidates discarded by the current-image filter.
    pub image_mismatch: usize,
    /// Candidates already running the desired image.
    pub already_current: usize,
    /// Matching projects without the named deployment.
    pub not_found: usize,
}

/// Scan result: the worklist plus everything worth reporting about
/// candidates that did not make it in.
#[derive(Debug)]
pub struct Selection {
    pub worklist: Vec<Target>,
    pub counters: ScanCounters,
    pub reports: Vec<TargetReport>,
}

/// Build the update worklist.
///
/// A candidate enters the worklist iff its namespace matches `projects`,
/// its running image equals `current_image` (when that filter is given),
/// and its running image differs from `new_image`. A remote error during
/// the scan aborts the run; a missing deployment in one project does not.
pub async fn select_targets(
    client: &dyn ClusterClient,
    projects: &Regex,
    deployment: &str,
    current_image: Option<&ImageLocator>,
    new_image: &ImageLocator,
    progress: &dyn ProgressSink,
) -> Result<Selection, RolloutError> {
    let all_projects = client.list_projects().await?;

    let mut counters = ScanCounters {
        projects_total: all_projects.len(),
        ..ScanCounters::default()
    };
    let mut worklist = Vec::new();
    let mut reports = Vec::new();

    let matched: Vec<String> = all_projects
        .into_iter()
        .filter(|p| {
            let ok = projects.is_match(p);
            if !ok {
                counters.namespace_mismatch += 1;
            }
            ok
        })
        .collect();
    counters.projects_matched = matched.len();
    progress.publish(RolloutEvent::ProjectsMatched {
        matched: matched.len(),
        total: counters.projects_total,
    });
    info!(
        matched = counters.projects_matched,
        total = counters.projects_total,
        pattern = %projects,
        "scanned projects"
    );

    for namespace in matched {
        let Some(candidate) = client.get_target(&namespace, deployment).await? else {
            debug!(%namespace, %deployment, "deployment not found");
            counters.not_found += 1;
            progress.publish(RolloutEvent::CandidateNotFound {
                namespace: namespace.clone(),
            });
            reports.push(TargetReport::new(
                namespace,
                deployment,
                RolloutOutcome::Skipped("deployment not found".to_string()),
            ));
            continue;
        };

        if let Some(current) = current_image {
            if candidate.image != current.as_str() {
                debug!(%namespace, image = %candidate.image, "current image does not match filter");
                counters.image_mismatch += 1;
                progress.publish(RolloutEvent::CandidateImageMismatch { namespace });
                continue;
            }
        }

        if candidate.image == new_image.as_str() {
            debug!(%namespace, "already at new image");
            counters.already_current += 1;
            progress.publish(RolloutEvent::CandidateAlreadyCurrent {
                namespace: namespace.clone(),
            });
            reports.push(TargetReport::new(
                namespace,
                deployment,
                RolloutOutcome::AlreadyCurrent,
            ));
            continue;
        }

        progress.publish(RolloutEvent::TargetQueued {
            namespace: namespace.clone(),
            name: candidate.name.clone(),
        });
        worklist.push(Target {
            namespace,
            name: candidate.name,
            current_image: ImageLocator::new(candidate.image),
            desired_image: new_image.clone(),
        });
    }

    info!(targets = worklist.len(), "scan complete");
    Ok(Selection {
        worklist,
        counters,
        reports,
    })
}
