use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::registry::PeerRegistry;
use super::{MAX_DATAGRAM, SharedPeer, bind_broadcast_socket, broadcast_target};
use crate::config::DiscoveryConfig;
use crate::core::Peer;
use crate::core::peer::{BYE, HELLO};
use crate::errors::Result;

/// Announces the local peer and tracks announcements of others
///
/// On start a `HELLO` broadcast goes out; afterwards hello/bye messages from
/// other peers update the registry. On shutdown a `BYE` broadcast is sent
/// before the task returns.
pub struct HelloListener {
    socket: UdpSocket,
    broadcast_address: String,
    peer: SharedPeer,
    registry: Arc<PeerRegistry>,
}

impl HelloListener {
    pub async fn bind(
        config: &DiscoveryConfig,
        peer: SharedPeer,
        registry: Arc<PeerRegistry>,
    ) -> Result<Self> {
        let socket = bind_broadcast_socket(config.hello_port).await?;
        Ok(Self {
            socket,
            broadcast_address: config.broadcast_address.clone(),
            peer,
            registry,
        })
    }

    pub fn local_port(&self) -> Result<u16> {
        Ok(self.socket.local_addr()?.port())
    }

    /// Broadcast a message to every hello listener on the network
    ///
    /// All peers share the hello port, so the target is our own bound port.
    pub async fn announce(&self, message: &str) {
        let result = async {
            let target = broadcast_target(&self.broadcast_address, self.local_port()?)?;
            self.socket.send_to(message.as_bytes(), target).await?;
            Ok::<_, crate::errors::LocalDropError>(())
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to announce '{}': {}", message, e);
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let hello = self.peer.read().to_hello_message();
        self.announce(&hello).await;
        info!("Hello listener started, announced {}", self.peer.read());

        let mut buf = [0u8; MAX_DATAGRAM];
        while !*shutdown.borrow() {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, from)) => {
                        let message = String::from_utf8_lossy(&buf[..len]).into_owned();
                        debug!("Hello listener got '{}' from {}", message, from);
                        self.handle_message(&message);
                    }
                    Err(e) => debug!("Hello listener receive error: {}", e),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        let bye = self.peer.read().to_bye_message();
        self.announce(&bye).await;
        info!("Hello listener stopped, sent bye");
    }

    fn handle_message(&self, message: &str) {
        let local = self.peer.read().clone();
        if message.starts_with(HELLO) {
            if let Some(peer) = Peer::from_hello_message(message)
                && !peer.same_endpoint(&local)
            {
                self.registry.insert(peer);
            }
        } else if message.starts_with(BYE)
            && let Some(peer) = Peer::from_bye_message(message)
            && !peer.same_endpoint(&local)
        {
            self.registry.remove(&peer);
        }
    }
}
