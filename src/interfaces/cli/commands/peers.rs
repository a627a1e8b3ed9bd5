//! Discover and peers commands

use colored::Colorize;
use std::sync::Arc;

use crate::config::StaticConfig;
use crate::core::Peer;
use crate::interfaces::cli::CliError;
use crate::node::Node;

async fn find_peers(config: Arc<StaticConfig>) -> Result<Vec<Peer>, CliError> {
    let timeout_ms = config.discovery.timeout_ms;
    let node = Node::new(config)?;
    println!(
        "{} Searching the network for {} ms...",
        "ℹ".bold().blue(),
        timeout_ms
    );
    Ok(node.discover_peers().await?)
}

pub async fn discover(config: Arc<StaticConfig>) -> Result<(), CliError> {
    let peers = find_peers(config).await?;

    if peers.is_empty() {
        println!("{} No peers found", "ℹ".bold().blue());
        return Ok(());
    }
    for peer in &peers {
        println!("  {}", peer.to_string().cyan());
    }
    println!();
    println!(
        "{} Total {} peers",
        "ℹ".bold().blue(),
        peers.len().to_string().green()
    );
    Ok(())
}

pub async fn list_peers(config: Arc<StaticConfig>) -> Result<(), CliError> {
    let peers = find_peers(config).await?;

    if peers.is_empty() {
        println!("{} No peers found", "ℹ".bold().blue());
        return Ok(());
    }

    let name_width = peers.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);
    // pad before coloring, escape codes would count towards the width
    println!(
        "{}  {}  {}",
        format!("{:<width$}", "NAME", width = name_width).bold(),
        format!("{:<15}", "IP").bold(),
        "PORT".bold()
    );
    for peer in &peers {
        println!(
            "{}  {:<15}  {}",
            format!("{:<width$}", peer.name, width = name_width).cyan(),
            peer.ip,
            peer.file_transfer_port
        );
    }
    Ok(())
}
