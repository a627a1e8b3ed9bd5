//! Serve command - run a node until Ctrl+C

use colored::Colorize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::config::StaticConfig;
use crate::discovery::PeerEvent;
use crate::interfaces::cli::CliError;
use crate::node::Node;
use crate::system::listen_for_shutdown;

use super::ConsoleHandler;

pub async fn serve(config: Arc<StaticConfig>) -> Result<(), CliError> {
    let mut node = Node::new(config.clone())?;
    let handler = Arc::new(ConsoleHandler::new(
        config.transfer.accept_policy,
        config.transfer.response_timeout(),
    ));
    let mut events = node.subscribe();

    node.start(handler).await?;

    let local = node.local_peer();
    println!("{}", "LocalDrop is running".bold().green());
    println!("  {}:     {}", "Peer".cyan(), local);
    println!(
        "  {}: {}",
        "Downloads".cyan(),
        config.transfer.download_dir.display()
    );
    println!("  {}:   {}", "Accept".cyan(), config.transfer.accept_policy);
    println!("{}", "Press Ctrl+C to stop".dimmed());

    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PeerEvent::Joined(peer)) => {
                    println!("{} {}", "+".bold().green(), peer.to_string().cyan());
                }
                Ok(PeerEvent::Left(peer)) => {
                    println!("{} {}", "-".bold().red(), peer.to_string().dimmed());
                }
                Err(RecvError::Lagged(n)) => debug!("Missed {} peer events", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    listen_for_shutdown(&mut node).await;
    printer.abort();
    Ok(())
}
