//! Console rendering of rollout progress events.

use std::io::{self, Write};

use rollwave_core::{ProgressSink, RolloutEvent};

/// Prints one human-readable line (or mark) per event.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn publish(&self, event: RolloutEvent) {
        match event {
            RolloutEvent::ImageResolved { reference, locator } => {
                println!("Resolved image \"{reference}\" to:\n  {locator}");
            }
            RolloutEvent::ProjectsMatched { matched, total } => {
                println!("Found {matched} of {total} projects matching the pattern.\n");
            }
            RolloutEvent::CandidateNotFound { namespace } => {
                println!("  {namespace}: not found.");
            }
            RolloutEvent::CandidateImageMismatch { namespace } => {
                println!("  {namespace}: not matching current image.");
            }
            RolloutEvent::CandidateAlreadyCurrent { namespace } => {
                println!("  {namespace}: already at new image.");
            }
            RolloutEvent::TargetQueued { namespace, name } => {
                println!("  {namespace}: found {name}.");
            }
            RolloutEvent::BatchStarted { index, total, size } => {
                println!("\nUpdating batch {index}/{total} ({size} deployments) ...");
            }
            RolloutEvent::TargetUpdated { .. } => {}
            RolloutEvent::TargetAlreadyCurrent { namespace, name } => {
                println!("{namespace}/{name}: already updated by someone else.");
            }
            RolloutEvent::WaitPoll { .. } => {
                print!(".");
                let _ = io::stdout().flush();
            }
            RolloutEvent::TargetReady { namespace, name } => {
                println!("\u{2714} {namespace}/{name}");
            }
            RolloutEvent::TargetFailed {
                namespace,
                name,
                error,
            } => {
                println!("\u{2717} {namespace}/{name}: {error}");
            }
        }
    }
}
