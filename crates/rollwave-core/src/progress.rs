//! Injected user-interaction seams.
//!
//! The engine never reads or writes a console. Progress is published as an
//! append-only event stream through [`ProgressSink`], and the single go/no-go
//! decision before the first mutation goes through [`Confirmation`].

/// One step of rollout progress, in the order events occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutEvent {
    ImageResolved {
        reference: String,
        locator: String,
    },
    ProjectsMatched {
        matched: usize,
        total: usize,
    },
    CandidateNotFound {
        namespace: String,
    },
    CandidateImageMismatch {
        namespace: String,
    },
    CandidateAlreadyCurrent {
        namespace: String,
    },
    TargetQueued {
        namespace: String,
        name: String,
    },
    BatchStarted {
        /// 1-based batch index.
        index: usize,
        total: usize,
        size: usize,
    },
    /// The image write landed; readiness wait begins.
    TargetUpdated {
        namespace: String,
        name: String,
    },
    /// Another actor updated the target mid-run; nothing was mutated.
    TargetAlreadyCurrent {
        namespace: String,
        name: String,
    },
    /// One readiness poll completed without reaching readiness.
    WaitPoll {
        namespace: String,
        name: String,
    },
    TargetReady {
        namespace: String,
        name: String,
    },
    TargetFailed {
        namespace: String,
        name: String,
        error: String,
    },
}

/// Append-only consumer of rollout progress.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, event: RolloutEvent);
}

/// Discards all events.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _event: RolloutEvent) {}
}

/// Single yes/no gate between planning and the first mutation.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Always proceeds. Used for `--yes` runs and tests.
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
