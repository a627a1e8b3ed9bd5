//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for localdrop using clap's derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::AcceptPolicy;

/// LocalDrop - Share files with peers on the local network
#[derive(Parser)]
#[command(name = "localdrop")]
#[command(version)]
#[command(about = "Share files with peers on the local network", long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/LocalDrop/config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a node: receive files and answer discovery until Ctrl+C
    Serve {
        /// How incoming requests are answered (ask, always, never)
        #[arg(long)]
        accept: Option<AcceptPolicy>,

        /// TCP port for incoming transfers (0 picks a free port)
        #[arg(long)]
        port: Option<u16>,

        /// Directory received files are stored under
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },

    /// Find peers on the local network
    Discover {
        /// How long to wait for answers, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Send files and directories to a peer
    ///
    /// Usage: send <TARGET> <PATH>...
    /// - TARGET is `ip:port` or the name of a peer on the network
    Send {
        /// `ip:port` or peer name
        target: String,

        /// Files and directories to send
        #[arg(required = true, num_args = 1..)]
        paths: Vec<PathBuf>,
    },

    /// List peers as a table
    Peers,

    /// Show the transfer log
    Log {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the local peer
    Whoami,

    /// Change the local display name and save it to the config file
    Rename {
        /// New name (letters, digits and spaces)
        name: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Serve runs until interrupted, everything else is a one-shot command
    pub fn is_long_running(&self) -> bool {
        matches!(self, Commands::Serve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::parse_from(["localdrop", "send", "Desk", "a.txt", "photos"]);
        match cli.command {
            Commands::Send { target, paths } => {
                assert_eq!(target, "Desk");
                assert_eq!(paths, vec![PathBuf::from("a.txt"), PathBuf::from("photos")]);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_parse_serve_policy() {
        let cli = Cli::parse_from(["localdrop", "-c", "x.toml", "serve", "--accept", "always"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Commands::Serve { accept, port, .. } => {
                assert_eq!(accept, Some(AcceptPolicy::Always));
                assert_eq!(port, None);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_send_requires_paths() {
        assert!(Cli::try_parse_from(["localdrop", "send", "Desk"]).is_err());
    }
}
