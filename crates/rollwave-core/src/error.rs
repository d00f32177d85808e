//! Engine error types.
//!
//! Two tiers: [`RolloutError`] aborts a run before any mutation (bad input,
//! unresolvable images, a failed scan), [`TargetError`] is terminal for one
//! target and never propagates to its siblings.

use std::time::Duration;

use thiserror::Error;

use crate::client::ClientError;

/// Run-level errors. All of these occur pre-flight: nothing has been
/// mutated, so the whole invocation is safe to retry.
#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("invalid image reference {reference:?}: expected namespace/name:tag")]
    InvalidReferenceFormat { reference: String },

    #[error("failed to resolve image {reference:?}: {source}")]
    Resolution {
        reference: String,
        source: ClientError,
    },

    #[error("invalid project pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("project scan failed: {0}")]
    Selection(#[from] ClientError),
}

/// Per-target terminal errors recorded in the rollout summary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetError {
    /// The target has an automatic image-change trigger that would race
    /// with a manual image rewrite. Non-retryable.
    #[error("automatic image-change trigger configured; refusing to update")]
    UnsupportedTrigger,

    /// The optimistic-concurrency conflict persisted through every retry.
    #[error("update conflict persisted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("remote call failed: {0}")]
    Remote(#[from] ClientError),

    /// The rollout never reported a newer generation with ready replicas.
    /// The image write has already landed; this is observational.
    #[error("rollout not ready within {timeout:?}")]
    TimedOut { timeout: Duration },
}
