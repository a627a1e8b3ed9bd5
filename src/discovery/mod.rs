//! Peer discovery over UDP
//!
//! Two mechanisms run side by side:
//!
//! - **On demand** (`broadcaster` + `listener`): a node broadcasts
//!   `DISCOVERY_REQUEST` on the discovery port and every listener answers with
//!   `DISCOVERY_RESPONSE|name|ip|port`.
//! - **Announcements** (`hello`): nodes broadcast `HELLO|…` when they start and
//!   `BYE|…` when they stop, keeping every [`PeerRegistry`] up to date.

pub mod broadcaster;
pub mod hello;
pub mod listener;
pub mod registry;

use parking_lot::RwLock;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::warn;

use crate::core::Peer;
use crate::errors::{LocalDropError, Result};

pub use broadcaster::discover_peers;
pub use hello::HelloListener;
pub use listener::DiscoveryListener;
pub use registry::{PeerEvent, PeerRegistry};

/// Largest datagram we expect; peer messages are far below this
pub(crate) const MAX_DATAGRAM: usize = 1024;

/// The local peer, shared so a rename reaches every listener at once
pub type SharedPeer = Arc<RwLock<Peer>>;

/// Bind a UDP socket on all interfaces with broadcast enabled
pub(crate) async fn bind_broadcast_socket(port: u16) -> Result<UdpSocket> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        .await
        .map_err(|e| LocalDropError::discovery(format!("Cannot bind UDP port {}: {}", port, e)))?;
    socket.set_broadcast(true)?;
    Ok(socket)
}

/// Resolve `address:port` as a UDP target
pub(crate) fn broadcast_target(address: &str, port: u16) -> Result<SocketAddr> {
    let ip: Ipv4Addr = address.parse().map_err(|e| {
        LocalDropError::config(format!("Invalid broadcast address '{}': {}", address, e))
    })?;
    Ok(SocketAddr::from((ip, port)))
}

/// Send a single broadcast datagram from an ephemeral socket
///
/// Failures are logged and swallowed: a lost announcement is not fatal.
pub async fn send_udp_broadcast(message: &str, address: &str, port: u16) {
    let result = async {
        let target = broadcast_target(address, port)?;
        let socket = bind_broadcast_socket(0).await?;
        socket.send_to(message.as_bytes(), target).await?;
        Ok::<_, LocalDropError>(())
    }
    .await;

    if let Err(e) = result {
        warn!("Failed to send broadcast to {}:{}: {}", address, port, e);
    }
}
