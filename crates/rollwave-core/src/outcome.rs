//! Per-target outcomes and the run summary.

use crate::error::TargetError;
use crate::select::ScanCounters;

/// Terminal outcome for one candidate, produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutOutcome {
    /// Image written and the rollout reported ready.
    Updated,
    /// Already at the desired image; nothing was mutated.
    AlreadyCurrent,
    /// Discarded during the scan, with a reason.
    Skipped(String),
    /// Terminal per-target failure. Never aborts sibling targets.
    Failed(TargetError),
}

/// Outcome record for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub namespace: String,
    pub name: String,
    pub outcome: RolloutOutcome,
}

impl TargetReport {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, outcome: RolloutOutcome) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            outcome,
        }
    }
}

/// Aggregate result of a run. Always produced, even on partial failure;
/// only pre-flight errors prevent a summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutSummary {
    /// The user declined the confirmation prompt; nothing was mutated.
    pub aborted: bool,
    pub counters: ScanCounters,
    pub updated: usize,
    pub failed: usize,
    pub reports: Vec<TargetReport>,
}

impl RolloutSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
