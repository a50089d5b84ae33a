//! Job command handlers
//!
//! Toggles deployment jobs and reports the outcome of each.

use anyhow::{Context, Result};
use cfops_client::{
    HttpEventPollerFactory, HttpRestRunner, HttpToggleAction, JobToggler, ToggleActionPolicy,
    ToggleSettings,
};
use cfops_core::domain::toggle::{JobState, JobToggleRequest};
use cfops_core::dto::rest::BodyFormat;
use clap::Subcommand;
use colored::*;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Start or stop jobs and wait for the director to finish
    ///
    /// Each job's director task is polled every second and a task in the
    /// `error` state fails that job, unless CFOPS_POLL_INTERVAL_MS or
    /// CFOPS_FAILURE_STATES say otherwise.
    Toggle {
        /// Deployment the jobs belong to
        #[arg(long)]
        deployment: String,

        /// Target state (started or stopped)
        #[arg(long)]
        state: JobState,

        /// Jobs toggled at once (defaults to CFOPS_MAX_PARALLEL_JOBS)
        #[arg(long)]
        parallel: Option<usize>,

        /// Skip polling when the toggle request itself fails
        #[arg(long)]
        abort_on_toggle_error: bool,

        /// Job names, in order
        #[arg(required = true)]
        jobs: Vec<String>,
    },
}

/// Handle job commands
///
/// # Arguments
/// * `command` - The job command to execute
/// * `config` - The CLI configuration
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    match command {
        JobCommands::Toggle {
            deployment,
            state,
            parallel,
            abort_on_toggle_error,
            jobs,
        } => {
            let policy = if abort_on_toggle_error {
                ToggleActionPolicy::Abort
            } else {
                ToggleActionPolicy::Proceed
            };
            let parallel = parallel.unwrap_or(config.poller.max_parallel_jobs);
            toggle_jobs(config, deployment, state, policy, parallel, jobs).await
        }
    }
}

async fn toggle_jobs(
    config: &Config,
    deployment: String,
    state: JobState,
    policy: ToggleActionPolicy,
    parallel: usize,
    jobs: Vec<String>,
) -> Result<()> {
    let director = config.director()?;

    let settings = ToggleSettings {
        server_url: director.url.clone(),
        deployment,
        username: director.username.clone(),
        password: director.password.clone(),
        state,
        body_format: BodyFormat::Json,
    };

    let runner = Arc::new(
        HttpRestRunner::build(director.skip_tls_verify).context("Failed to build HTTP client")?,
    );
    let toggle_action = HttpToggleAction::new(director.skip_tls_verify)
        .context("Failed to build toggle client")?;
    let toggler = Arc::new(
        JobToggler::new(
            settings,
            Arc::new(toggle_action),
            Arc::new(HttpEventPollerFactory::new(runner, config.director_poller())),
        )
        .with_policy(policy),
    );

    let request = JobToggleRequest::new(jobs);
    info!(
        "Toggling {} job(s) of {} with up to {} at once",
        request.len(),
        toggler.settings().deployment,
        parallel
    );
    println!(
        "{}",
        format!("Setting {} job(s) to {}...", request.len(), state).bold()
    );

    let outcome = if parallel > 1 {
        Arc::clone(&toggler)
            .toggle_jobs_concurrent(&request, parallel)
            .await
    } else {
        toggler.toggle_jobs(&request).await
    };

    match outcome {
        Ok(done) => {
            for job in &done {
                println!("  {} {}", "✓".green(), job);
            }
            Ok(())
        }
        Err(e) => {
            for job in &e.succeeded {
                println!("  {} {}", "✓".green(), job);
            }
            for failure in &e.failures {
                println!("  {} {}", "✗".red(), failure.to_string().red());
            }
            Err(e.into())
        }
    }
}
