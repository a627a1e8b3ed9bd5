//! Send and log commands

use chrono::Local;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::StaticConfig;
use crate::core::AcceptPolicy;
use crate::errors::LocalDropError;
use crate::interfaces::cli::CliError;
use crate::node::Node;
use crate::transfer::{Direction, TransferLog};
use crate::utils::bytes_to_readable_string;

use super::ConsoleHandler;

pub async fn send(
    config: Arc<StaticConfig>,
    target: String,
    paths: Vec<PathBuf>,
) -> Result<(), CliError> {
    if let Some(missing) = paths.iter().find(|p| !p.exists()) {
        return Err(CliError::ParseError(format!(
            "Path does not exist: {}",
            missing.display()
        )));
    }

    let node = Node::new(config)?;
    let receiver = node.resolve_peer(&target).await?;
    println!(
        "{} Asking {} to accept {} item(s)...",
        "ℹ".bold().blue(),
        receiver.to_string().cyan(),
        paths.len()
    );

    // the policy only matters for receiving
    let handler = ConsoleHandler::new(
        AcceptPolicy::Never,
        node.config().transfer.response_timeout(),
    );
    match node.send_files(&receiver, paths, &handler).await {
        Ok(files) if files.iter().all(|f| f.transmission_success == Some(true)) => Ok(()),
        Ok(files) => {
            let failed = files
                .iter()
                .filter(|f| f.transmission_success != Some(true))
                .count();
            Err(CliError::CommandError(format!(
                "{} file(s) were not stored by the receiver",
                failed
            )))
        }
        // already reported by the handler
        Err(LocalDropError::TransferDenied(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub fn list_log(config: Arc<StaticConfig>, json: bool) -> Result<(), CliError> {
    let Some(path) = &config.transfer.log_path else {
        println!("{} Transfer log is disabled (transfer.log_path)", "ℹ".bold().blue());
        return Ok(());
    };
    let log = TransferLog::load_from_file(path)?;
    let entries = log.entries();

    if json {
        let out = serde_json::to_string_pretty(&entries).map_err(LocalDropError::from)?;
        println!("{}", out);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{} No transfers recorded", "ℹ".bold().blue());
        return Ok(());
    }

    for entry in &entries {
        let arrow = match entry.direction {
            Direction::Sent => "→".blue(),
            Direction::Received => "←".magenta(),
        };
        let status = if entry.success { "✓".green() } else { "✗".red() };
        println!(
            "{} {} {} {} {} {}",
            entry
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed(),
            status,
            arrow,
            entry.peer.name.cyan(),
            entry.path.display(),
            bytes_to_readable_string(entry.size).dimmed()
        );
    }
    println!();
    println!(
        "{} {} sent, {} received",
        "ℹ".bold().blue(),
        log.sent().len().to_string().green(),
        log.received().len().to_string().green()
    );
    Ok(())
}
