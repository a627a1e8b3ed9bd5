use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{MAX_DATAGRAM, SharedPeer, bind_broadcast_socket};
use crate::config::DiscoveryConfig;
use crate::core::peer::DISCOVERY_REQUEST;
use crate::errors::Result;

/// Answers discovery requests with the local peer's description
pub struct DiscoveryListener {
    socket: UdpSocket,
    peer: SharedPeer,
}

impl DiscoveryListener {
    pub async fn bind(config: &DiscoveryConfig, peer: SharedPeer) -> Result<Self> {
        let socket = bind_broadcast_socket(config.discovery_port).await?;
        Ok(Self { socket, peer })
    }

    pub fn local_port(&self) -> Result<u16> {
        Ok(self.socket.local_addr()?.port())
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if let Ok(addr) = self.socket.local_addr() {
            info!("Discovery listener on {}", addr);
        }
        let mut buf = [0u8; MAX_DATAGRAM];

        while !*shutdown.borrow() {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => {
                    let (len, from) = match received {
                        Ok(r) => r,
                        Err(e) => {
                            debug!("Discovery listener receive error: {}", e);
                            continue;
                        }
                    };

                    if &buf[..len] != DISCOVERY_REQUEST.as_bytes() {
                        continue;
                    }

                    let response = self.peer.read().to_discovery_response();
                    if let Err(e) = self.socket.send_to(response.as_bytes(), from).await {
                        warn!("Failed to answer discovery request from {}: {}", from, e);
                    } else {
                        debug!("Answered discovery request from {}", from);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Discovery listener stopped");
    }
}
