use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use rollwave_client::{ClientConfig, OpenShiftClient};
use rollwave_core::{
    AutoConfirm, Confirmation, Orchestrator, RetryPolicy, RolloutConfig, RolloutOutcome,
    RolloutRequest, RolloutSummary, WaitConfig,
};

mod confirm;
mod progress;

#[derive(Parser)]
#[command(
    name = "rollwave",
    about = "Rollwave — batched image rollouts across cluster projects",
    version,
)]
struct Cli {
    /// Cluster API server URL
    #[arg(long, env = "ROLLWAVE_SERVER")]
    server: String,
    /// Bearer token for the API server
    #[arg(long, env = "ROLLWAVE_TOKEN", hide_env_values = true)]
    token: String,
    /// Regex filter for project names
    #[arg(long)]
    projects: String,
    /// Name of the deployment config to update in each matching project
    #[arg(long)]
    deployment: String,
    /// Only update targets currently running this image
    /// (namespace/name:tag or digest reference)
    #[arg(long)]
    current_image: Option<String>,
    /// Image to roll out (namespace/name:tag or digest reference)
    #[arg(long)]
    new_image: String,
    /// Number of simultaneous rollouts
    #[arg(long, default_value_t = 10)]
    batch_size: usize,
    /// Seconds between readiness polls
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,
    /// Seconds before a target's readiness wait times out
    #[arg(long, default_value_t = 300)]
    rollout_timeout: u64,
    /// Skip TLS certificate verification
    #[arg(long)]
    insecure_skip_tls_verify: bool,
    /// Proceed without the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rollwave_core=warn".parse()?)
                .add_directive("rollwave_client=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let image_filter = match &cli.current_image {
        Some(image) => format!("having image \"{image}\""),
        None => "having any image".to_string(),
    };
    println!(
        "Rolling out image \"{}\" to all deployments named \"{}\" ({}) in projects matching \"{}\".\n",
        cli.new_image, cli.deployment, image_filter, cli.projects,
    );

    let client = OpenShiftClient::new(ClientConfig {
        server: cli.server,
        token: cli.token,
        insecure_skip_tls_verify: cli.insecure_skip_tls_verify,
    })?;

    let confirmation: Arc<dyn Confirmation> = if cli.yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(confirm::StdinConfirmation)
    };

    let orchestrator = Orchestrator::new(Arc::new(client))
        .with_confirmation(confirmation)
        .with_progress(Arc::new(progress::ConsoleProgress))
        .with_config(RolloutConfig {
            retry: RetryPolicy::default(),
            wait: WaitConfig {
                poll_interval: Duration::from_secs(cli.poll_interval),
                timeout: Duration::from_secs(cli.rollout_timeout),
            },
        });

    let request = RolloutRequest {
        project_pattern: cli.projects,
        deployment: cli.deployment,
        current_image: cli.current_image,
        new_image: cli.new_image,
        batch_concurrency: cli.batch_size,
    };

    let summary = orchestrator.run(&request).await?;
    print_summary(&summary);
    info!(
        updated = summary.updated,
        failed = summary.failed,
        aborted = summary.aborted,
        "rollout finished"
    );

    if summary.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(summary: &RolloutSummary) {
    if summary.aborted {
        println!("\nAborted; nothing was changed.");
        return;
    }

    let c = &summary.counters;
    println!("\nDone.");
    println!(
        "  projects: {} matched of {} ({} filtered by pattern)",
        c.projects_matched, c.projects_total, c.namespace_mismatch
    );
    println!(
        "  skipped: {} not found, {} image mismatch, {} already current",
        c.not_found, c.image_mismatch, c.already_current
    );
    println!("  updated: {}, failed: {}", summary.updated, summary.failed);

    for report in &summary.reports {
        if let RolloutOutcome::Failed(error) = &report.outcome {
            println!("  failed: {}/{}: {error}", report.namespace, report.name);
        }
    }
}
