use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};

use super::{MAX_DATAGRAM, bind_broadcast_socket, broadcast_target};
use crate::config::DiscoveryConfig;
use crate::core::Peer;
use crate::core::peer::{DISCOVERY_REQUEST, DISCOVERY_RESPONSE};
use crate::errors::Result;

/// Broadcast a discovery request and collect the answers
///
/// Waits `config.timeout_ms` for responses. Malformed replies, duplicates and
/// the local peer itself are dropped. A later reply from the same endpoint
/// replaces the earlier one.
pub async fn discover_peers(local: &Peer, config: &DiscoveryConfig) -> Result<Vec<Peer>> {
    let socket = bind_broadcast_socket(0).await?;
    let target = broadcast_target(&config.broadcast_address, config.discovery_port)?;

    socket.send_to(DISCOVERY_REQUEST.as_bytes(), target).await?;
    debug!("Discovery request sent to {}", target);

    let deadline = Instant::now() + config.timeout();
    let mut peers: Vec<Peer> = Vec::new();
    let mut buf = [0u8; MAX_DATAGRAM];

    loop {
        let (len, from) = match timeout_at(deadline, socket.recv_from(&mut buf)).await {
            Ok(Ok(received)) => received,
            Ok(Err(e)) => {
                debug!("Discovery receive error: {}", e);
                continue;
            }
            Err(_) => break,
        };

        let message = String::from_utf8_lossy(&buf[..len]);
        if !message.starts_with(DISCOVERY_RESPONSE) {
            continue;
        }
        let Some(peer) = Peer::from_discovery_response(&message) else {
            debug!("Malformed discovery response from {}: {}", from, message);
            continue;
        };
        if peer.same_endpoint(local) {
            continue;
        }

        match peers.iter_mut().find(|p| p.same_endpoint(&peer)) {
            Some(existing) => *existing = peer,
            None => peers.push(peer),
        }
    }

    info!("Discovered {} peers", peers.len());
    Ok(peers)
}
