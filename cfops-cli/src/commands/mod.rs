//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod jobs;
mod system;
mod task;

pub use jobs::JobCommands;
pub use system::SystemCommands;
pub use task::TaskCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Director task tracking
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Deployment job toggling
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Data store records
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Task { command } => task::handle_task_command(command, config).await,
        Commands::Jobs { command } => jobs::handle_job_command(command, config).await,
        Commands::System { command } => system::handle_system_command(command),
    }
}
