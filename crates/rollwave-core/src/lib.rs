//! Rollwave engine — controlled, concurrent image rollouts.
//!
//! The engine selects deployment targets across namespaces matching a
//! pattern, rewrites their container image under optimistic-concurrency
//! protection, triggers redeploys, and waits for each target to report
//! healthy replicas. Concurrency is bounded by sequential batches: every
//! target in batch *i* reaches a terminal outcome before batch *i+1* starts.
//!
//! The engine is a pure in-process library. All cluster access goes through
//! the [`ClusterClient`] trait; confirmation prompts and progress output are
//! injected via [`Confirmation`] and [`ProgressSink`].

pub mod client;
pub mod error;
pub mod image;
pub mod orchestrate;
pub mod outcome;
pub mod plan;
pub mod progress;
pub mod retry;
pub mod select;
pub mod update;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientError, ClusterClient, DeploymentTarget, RolloutTrigger, TargetStatus};
pub use error::{RolloutError, TargetError};
pub use image::{ImageLocator, resolve_image};
pub use orchestrate::{Orchestrator, RolloutConfig, RolloutRequest};
pub use outcome::{RolloutOutcome, RolloutSummary, TargetReport};
pub use plan::plan_batches;
pub use progress::{AutoConfirm, Confirmation, NullSink, ProgressSink, RolloutEvent};
pub use retry::RetryPolicy;
pub use select::{ScanCounters, Selection, Target, select_targets};
pub use update::{UpdateApplied, apply_update};
pub use wait::{WaitConfig, wait_for_rollout};
