//! Whoami and rename commands

use colored::Colorize;
use std::sync::Arc;

use crate::config::{self, StaticConfig};
use crate::core::Peer;
use crate::interfaces::cli::CliError;
use crate::node::local_identity;

pub fn whoami(config: Arc<StaticConfig>) -> Result<(), CliError> {
    let peer = local_identity(&config)?;
    println!("  {}: {}", "Name".cyan(), peer.name);
    println!("  {}:   {}", "IP".cyan(), peer.ip);
    let port = if peer.file_transfer_port == 0 {
        "auto".dimmed().to_string()
    } else {
        peer.file_transfer_port.to_string()
    };
    println!("  {}: {}", "Port".cyan(), port);
    Ok(())
}

/// Persist a new display name to the config file
pub fn rename(name: String) -> Result<(), CliError> {
    Peer::validate_name(&name)?;
    let name = name.trim().to_string();
    config::update_config(|c| c.peer.name = Some(name.clone()))?;
    println!(
        "{} Renamed to {} ({})",
        "✓".bold().green(),
        name.cyan(),
        config::config_path().display().to_string().dimmed()
    );
    Ok(())
}
