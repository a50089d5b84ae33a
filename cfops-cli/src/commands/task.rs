//! Task command handlers
//!
//! Starts director tasks and reads them, once or until they finish.

use anyhow::{Context, Result};
use cfops_client::DirectorClient;
use cfops_core::domain::task::{RemoteTask, TaskState};
use cfops_core::dto::rest::{BodyFormat, HttpMethod};
use clap::Subcommand;
use colored::*;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;

/// Task subcommands
#[derive(Subcommand)]
pub enum TaskCommands {
    /// Send a task-initiating request and print the new task id
    Submit {
        /// Path relative to the director URL (e.g., "deployments")
        path: String,

        /// HTTP method (GET, POST, PUT or DELETE)
        #[arg(long, default_value = "POST")]
        method: HttpMethod,

        /// File sent as the request body
        #[arg(long)]
        body: Option<PathBuf>,

        /// Body format (json or yaml)
        #[arg(long, default_value = "yaml")]
        format: BodyFormat,

        /// Wait for the task to finish
        #[arg(long)]
        wait: bool,
    },
    /// Show the current state of a task
    Status {
        /// Director task id
        id: u64,
    },
    /// Wait until a task is done or errored
    Wait {
        /// Director task id
        id: u64,
    },
}

/// Handle task commands
///
/// # Arguments
/// * `command` - The task command to execute
/// * `config` - The CLI configuration
pub async fn handle_task_command(command: TaskCommands, config: &Config) -> Result<()> {
    let director = DirectorClient::new(config.director()?.clone())
        .context("Failed to build director client")?;

    match command {
        TaskCommands::Submit {
            path,
            method,
            body,
            format,
            wait,
        } => {
            let body = match body {
                Some(file) => Some((
                    fs::read(&file)
                        .with_context(|| format!("Failed to read {}", file.display()))?,
                    format,
                )),
                None => None,
            };

            let id = director
                .submit(method, &path, body)
                .await
                .with_context(|| format!("Failed to submit {} {}", method, path))?;
            println!("{} Task {} started", "✓".green(), id.to_string().cyan());

            if wait {
                info!("Waiting for task {}", id);
                let task = director
                    .wait_for_task(id, &config.director_poller())
                    .await
                    .with_context(|| format!("Task {} did not finish successfully", id))?;
                print_task(&task);
            }
        }
        TaskCommands::Status { id } => {
            let task = director
                .task_status(id)
                .await
                .with_context(|| format!("Failed to fetch task {}", id))?;
            print_task(&task);
        }
        TaskCommands::Wait { id } => {
            println!("{}", format!("Waiting for task {}...", id).dimmed());
            let task = director
                .wait_for_task(id, &config.director_poller())
                .await
                .with_context(|| format!("Task {} did not finish successfully", id))?;
            print_task(&task);
        }
    }

    Ok(())
}

/// Print a task snapshot
fn print_task(task: &RemoteTask) {
    println!("{}", "Task Details:".bold());
    println!("  ID:          {}", task.id.to_string().cyan());
    println!("  State:       {}", colorize_state(&task.state));
    println!("  Description: {}", task.description);
    if !task.result.is_empty() {
        println!("  Result:      {}", task.result);
    }
}

/// Colorize task state for display
fn colorize_state(state: &str) -> ColoredString {
    match state.parse::<TaskState>() {
        Ok(TaskState::Done) => state.green(),
        Ok(TaskState::Processing) => state.cyan(),
        Ok(TaskState::Error) => state.red(),
        Err(_) => state.yellow(),
    }
}
