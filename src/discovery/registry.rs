use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::core::Peer;
use crate::errors::{LocalDropError, Result};

/// Capacity of the peer event channel; slow subscribers lose the oldest events
const EVENT_CAPACITY: usize = 64;

/// Change in the set of known peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Joined(Peer),
    Left(Peer),
}

/// Live set of known peers, keyed by endpoint
#[derive(Debug)]
pub struct PeerRegistry {
    peers: DashMap<(String, u16), Peer>,
    events: broadcast::Sender<PeerEvent>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            peers: DashMap::new(),
            events,
        }
    }

    fn key(peer: &Peer) -> (String, u16) {
        (peer.ip.clone(), peer.file_transfer_port)
    }

    /// Insert or refresh a peer
    ///
    /// Emits `Joined` unless the exact same peer was already known, so a
    /// rename on the same endpoint is announced again.
    pub fn insert(&self, peer: Peer) -> bool {
        let previous = self.peers.insert(Self::key(&peer), peer.clone());
        let changed = previous.as_ref() != Some(&peer);
        if changed {
            debug!("Peer joined: {}", peer);
            let _ = self.events.send(PeerEvent::Joined(peer));
        }
        changed
    }

    /// Remove the peer on this endpoint; returns the stored entry
    pub fn remove(&self, peer: &Peer) -> Option<Peer> {
        let removed = self.peers.remove(&Self::key(peer)).map(|(_, p)| p);
        if let Some(p) = &removed {
            debug!("Peer left: {}", p);
            let _ = self.events.send(PeerEvent::Left(p.clone()));
        }
        removed
    }

    /// Add a peer that was entered by hand rather than discovered
    pub fn add_manual(&self, name: &str, ip: &str, port: u16) -> Result<Peer> {
        Peer::validate_name(name)?;
        ip.parse::<std::net::IpAddr>().map_err(|e| {
            LocalDropError::validation(format!("Invalid IP '{}': {}", ip, e))
        })?;
        if port == 0 {
            return Err(LocalDropError::validation("Port must not be 0"));
        }
        let peer = Peer::new(name, ip, port);
        self.insert(peer.clone());
        Ok(peer)
    }

    pub fn contains(&self, peer: &Peer) -> bool {
        self.peers.contains_key(&Self::key(peer))
    }

    /// Snapshot sorted by name, then endpoint
    pub fn peers(&self) -> Vec<Peer> {
        let mut peers: Vec<Peer> = self.peers.iter().map(|e| e.value().clone()).collect();
        peers.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.ip.cmp(&b.ip))
                .then_with(|| a.file_transfer_port.cmp(&b.file_transfer_port))
        });
        peers
    }

    /// Find a peer by exact name
    pub fn find_by_name(&self, name: &str) -> Option<Peer> {
        self.peers
            .iter()
            .find(|e| e.value().name == name)
            .map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PeerEvent> {
        self.events.subscribe()
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_remove_events() {
        let registry = PeerRegistry::new();
        let mut events = registry.subscribe();
        let bob = Peer::new("bob", "10.0.0.2", 5000);

        assert!(registry.insert(bob.clone()));
        assert!(!registry.insert(bob.clone()));
        assert_eq!(events.recv().await.unwrap(), PeerEvent::Joined(bob.clone()));

        let renamed = Peer::new("robert", "10.0.0.2", 5000);
        assert!(registry.insert(renamed.clone()));
        assert_eq!(registry.len(), 1);
        assert_eq!(events.recv().await.unwrap(), PeerEvent::Joined(renamed.clone()));

        assert_eq!(registry.remove(&bob), Some(renamed.clone()));
        assert_eq!(events.recv().await.unwrap(), PeerEvent::Left(renamed));
        assert!(registry.is_empty());
        assert!(registry.remove(&bob).is_none());
    }

    #[test]
    fn test_sorted_snapshot_and_lookup() {
        let registry = PeerRegistry::new();
        registry.insert(Peer::new("zed", "10.0.0.9", 1));
        registry.insert(Peer::new("amy", "10.0.0.3", 2));

        let names: Vec<String> = registry.peers().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["amy", "zed"]);
        assert_eq!(registry.find_by_name("zed").unwrap().ip, "10.0.0.9");
        assert!(registry.find_by_name("nobody").is_none());
    }

    #[test]
    fn test_add_manual_validates() {
        let registry = PeerRegistry::new();
        assert!(registry.add_manual("desk", "192.168.0.5", 4000).is_ok());
        assert!(registry.add_manual("desk", "not-an-ip", 4000).is_err());
        assert!(registry.add_manual("desk", "192.168.0.5", 0).is_err());
        assert!(registry.add_manual("", "192.168.0.5", 4000).is_err());
        assert_eq!(registry.len(), 1);
    }
}
