use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;

use localdrop::config::DiscoveryConfig;
use localdrop::core::Peer;
use localdrop::discovery::{
    DiscoveryListener, HelloListener, PeerEvent, PeerRegistry, SharedPeer, discover_peers,
};

/// Loopback "broadcast" on ephemeral ports so tests never touch the real LAN
fn loopback_config() -> DiscoveryConfig {
    DiscoveryConfig {
        discovery_port: 0,
        hello_port: 0,
        broadcast_address: "127.0.0.1".to_string(),
        timeout_ms: 300,
    }
}

fn shared(peer: Peer) -> SharedPeer {
    Arc::new(RwLock::new(peer))
}

async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<PeerEvent>) -> PeerEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no peer event")
        .unwrap()
}

#[tokio::test]
async fn test_discover_responding_peer() {
    let remote = shared(Peer::new("Laptop", "127.0.0.1", 40001));
    let listener = DiscoveryListener::bind(&loopback_config(), remote.clone())
        .await
        .unwrap();
    let port = listener.local_port().unwrap();
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::spawn(listener.run(rx));

    let config = DiscoveryConfig {
        discovery_port: port,
        ..loopback_config()
    };
    let local = Peer::new("Desk", "127.0.0.1", 40002);
    let peers = discover_peers(&local, &config).await.unwrap();
    assert_eq!(peers, vec![Peer::new("Laptop", "127.0.0.1", 40001)]);

    // a rename is visible to the next request without restarting
    remote.write().name = "Renamed".to_string();
    let peers = discover_peers(&local, &config).await.unwrap();
    assert_eq!(peers[0].name, "Renamed");

    shutdown.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_discover_skips_self() {
    let me = Peer::new("Desk", "127.0.0.1", 40003);
    let listener = DiscoveryListener::bind(&loopback_config(), shared(me.clone()))
        .await
        .unwrap();
    let port = listener.local_port().unwrap();
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::spawn(listener.run(rx));

    let config = DiscoveryConfig {
        discovery_port: port,
        ..loopback_config()
    };
    let peers = discover_peers(&me, &config).await.unwrap();
    assert!(peers.is_empty());

    shutdown.send(true).unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_discover_ignores_malformed_replies() {
    // a fake responder answering with garbage first, then a valid response
    let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = responder.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        let (_, from) = responder.recv_from(&mut buf).await.unwrap();
        for reply in [
            "DISCOVERY_RESPONSE|broken",
            "HELLO|Other|127.0.0.1|1",
            "DISCOVERY_RESPONSE|Tablet|127.0.0.1|not-a-port",
            "DISCOVERY_RESPONSE|Tablet|127.0.0.1|40004",
            "DISCOVERY_RESPONSE|Tablet|127.0.0.1|40004",
        ] {
            responder.send_to(reply.as_bytes(), from).await.unwrap();
        }
    });

    let config = DiscoveryConfig {
        discovery_port: port,
        ..loopback_config()
    };
    let peers = discover_peers(&Peer::new("Desk", "127.0.0.1", 1), &config)
        .await
        .unwrap();
    assert_eq!(peers, vec![Peer::new("Tablet", "127.0.0.1", 40004)]);
}

#[tokio::test]
async fn test_discover_without_answers_times_out_empty() {
    // nobody listens on this port
    let port = {
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap().port()
    };
    let config = DiscoveryConfig {
        discovery_port: port,
        timeout_ms: 100,
        ..loopback_config()
    };

    let started = std::time::Instant::now();
    let peers = discover_peers(&Peer::new("Desk", "127.0.0.1", 1), &config)
        .await
        .unwrap();
    assert!(peers.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_hello_and_bye_update_registry() {
    let me = Peer::new("Desk", "127.0.0.1", 40010);
    let registry = Arc::new(PeerRegistry::new());
    let mut events = registry.subscribe();

    let listener = HelloListener::bind(&loopback_config(), shared(me.clone()), registry.clone())
        .await
        .unwrap();
    let port = listener.local_port().unwrap();
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::spawn(listener.run(rx));

    let other = Peer::new("Laptop", "127.0.0.1", 40011);
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    // our own echo is ignored, the first event is the other peer
    socket
        .send_to(other.to_hello_message().as_bytes(), ("127.0.0.1", port))
        .await
        .unwrap();
    assert_eq!(next_event(&mut events).await, PeerEvent::Joined(other.clone()));
    assert!(registry.contains(&other));
    assert!(!registry.contains(&me));

    socket
        .send_to(b"HELLO|broken", ("127.0.0.1", port))
        .await
        .unwrap();
    socket
        .send_to(other.to_bye_message().as_bytes(), ("127.0.0.1", port))
        .await
        .unwrap();
    assert_eq!(next_event(&mut events).await, PeerEvent::Left(other.clone()));
    assert!(registry.is_empty());

    shutdown.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("hello listener did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_hello_listener_ignores_own_bye() {
    let me = Peer::new("Desk", "127.0.0.1", 40020);
    let registry = Arc::new(PeerRegistry::new());
    registry.insert(me.clone());

    let listener = HelloListener::bind(&loopback_config(), shared(me.clone()), registry.clone())
        .await
        .unwrap();
    let port = listener.local_port().unwrap();
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::spawn(listener.run(rx));

    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket
        .send_to(me.to_bye_message().as_bytes(), ("127.0.0.1", port))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(registry.contains(&me));

    shutdown.send(true).unwrap();
    task.await.unwrap();
}
