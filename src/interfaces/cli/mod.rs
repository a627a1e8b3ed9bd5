//! CLI interface module
//!
//! This module provides command-line interface functionality for localdrop.

pub mod commands;

use std::fmt;
use std::sync::Arc;

use crate::cli::{Commands, ConfigCommands};
use crate::config::StaticConfig;
use crate::errors::LocalDropError;
use commands::{
    config_generate, config_show, discover, list_log, list_peers, rename, send, serve, whoami,
};

#[derive(Debug)]
pub enum CliError {
    /// Error raised by the node or its components
    NodeError(LocalDropError),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::NodeError(err) => err.format_simple(),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::NodeError(err) => err.format_colored(),
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<LocalDropError> for CliError {
    fn from(err: LocalDropError) -> Self {
        CliError::NodeError(err)
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands, config: Arc<StaticConfig>) -> Result<(), CliError> {
    match cmd {
        Commands::Serve {
            accept,
            port,
            download_dir,
        } => {
            let mut config = (*config).clone();
            if let Some(accept) = accept {
                config.transfer.accept_policy = accept;
            }
            if let Some(port) = port {
                config.transfer.port = port;
            }
            if let Some(dir) = download_dir {
                config.transfer.download_dir = dir;
            }
            serve(Arc::new(config)).await
        }

        Commands::Discover { timeout_ms } => {
            let mut config = (*config).clone();
            if let Some(timeout_ms) = timeout_ms {
                if timeout_ms == 0 {
                    return Err(CliError::ParseError("--timeout-ms must be > 0".to_string()));
                }
                config.discovery.timeout_ms = timeout_ms;
            }
            discover(Arc::new(config)).await
        }

        Commands::Send { target, paths } => send(config, target, paths).await,

        Commands::Peers => list_peers(config).await,

        Commands::Log { json } => list_log(config, json),

        Commands::Whoami => whoami(config),

        Commands::Rename { name } => rename(name),

        Commands::Config { action } => match action {
            ConfigCommands::Generate { output_path, force } => config_generate(output_path, force),
            ConfigCommands::Show { json } => config_show(config, json),
        },
    }
}
