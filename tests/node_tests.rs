use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use localdrop::config::StaticConfig;
use localdrop::core::{AcceptPolicy, PolicyHandler};
use localdrop::errors::LocalDropError;
use localdrop::node::Node;
use localdrop::transfer::Direction;

fn node_config(name: &str, dir: &TempDir) -> StaticConfig {
    let mut config = StaticConfig::default();
    config.peer.name = Some(name.to_string());
    config.peer.advertise_ip = Some("127.0.0.1".to_string());
    config.transfer.port = 0;
    config.transfer.download_dir = dir.path().join("downloads");
    config.transfer.log_path = Some(dir.path().join("transfers.json"));
    config.discovery.discovery_port = 0;
    config.discovery.hello_port = 0;
    config.discovery.broadcast_address = "127.0.0.1".to_string();
    config.discovery.timeout_ms = 200;
    config
}

/// Wait until the receiving side has logged `count` entries
async fn wait_for_received(node: &Node, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while node.transfer_log().received().len() < count {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("receiver did not log the transfer");
}

#[tokio::test]
async fn test_send_between_nodes() {
    let receiver_dir = TempDir::new().unwrap();
    let sender_dir = TempDir::new().unwrap();

    let mut receiver = Node::new(Arc::new(node_config("Receiver", &receiver_dir))).unwrap();
    receiver
        .start(Arc::new(PolicyHandler::new(AcceptPolicy::Always)))
        .await
        .unwrap();
    assert!(receiver.is_running());
    let port = receiver.local_peer().file_transfer_port;
    assert_ne!(port, 0);

    let sender = Node::new(Arc::new(node_config("Sender", &sender_dir))).unwrap();
    let source = sender_dir.path().join("hello.txt");
    std::fs::write(&source, b"hello over the lan").unwrap();

    let target = sender
        .resolve_peer(&format!("127.0.0.1:{}", port))
        .await
        .unwrap();
    let files = sender
        .send_files(&target, vec![source.clone()], &PolicyHandler::default())
        .await
        .unwrap();
    assert_eq!(files[0].transmission_success, Some(true));

    wait_for_received(&receiver, 1).await;
    let stored = receiver_dir.path().join("downloads/hello.txt");
    assert_eq!(std::fs::read(&stored).unwrap(), b"hello over the lan");

    let sent = sender.transfer_log().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].direction, Direction::Sent);
    assert_eq!(sent[0].path, source);
    assert!(sent[0].success);

    let received = receiver.transfer_log().received();
    assert_eq!(received[0].peer.name, "Sender");
    assert_eq!(received[0].path, stored);

    // both logs were persisted
    assert!(sender_dir.path().join("transfers.json").exists());
    assert!(receiver_dir.path().join("transfers.json").exists());

    receiver.stop().await;
    assert!(!receiver.is_running());
}

#[tokio::test]
async fn test_denied_send_is_logged_as_failed() {
    let receiver_dir = TempDir::new().unwrap();
    let sender_dir = TempDir::new().unwrap();

    let mut receiver = Node::new(Arc::new(node_config("Receiver", &receiver_dir))).unwrap();
    receiver
        .start(Arc::new(PolicyHandler::new(AcceptPolicy::Never)))
        .await
        .unwrap();
    let target = receiver.local_peer();

    let sender = Node::new(Arc::new(node_config("Sender", &sender_dir))).unwrap();
    let source = sender_dir.path().join("a.txt");
    std::fs::write(&source, b"abc").unwrap();

    let result = sender
        .send_files(&target, vec![source.clone()], &PolicyHandler::default())
        .await;
    assert!(matches!(result, Err(LocalDropError::TransferDenied(_))));

    let sent = sender.transfer_log().sent();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].success);
    assert_eq!(sent[0].size, 3);

    receiver.stop().await;
}

#[tokio::test]
async fn test_start_twice_fails() {
    let dir = TempDir::new().unwrap();
    let mut node = Node::new(Arc::new(node_config("Twice", &dir))).unwrap();
    let handler = Arc::new(PolicyHandler::default());

    node.start(handler.clone()).await.unwrap();
    assert!(matches!(
        node.start(handler).await,
        Err(LocalDropError::Validation(_))
    ));

    node.stop().await;
    // stopping again is a no-op
    node.stop().await;
}

#[tokio::test]
async fn test_log_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(node_config("Keeper", &dir));

    let receiver_dir = TempDir::new().unwrap();
    let mut receiver = Node::new(Arc::new(node_config("Receiver", &receiver_dir))).unwrap();
    receiver
        .start(Arc::new(PolicyHandler::new(AcceptPolicy::Always)))
        .await
        .unwrap();

    {
        let node = Node::new(config.clone()).unwrap();
        let source = dir.path().join("keep.txt");
        std::fs::write(&source, b"keep").unwrap();
        node.send_files(
            &receiver.local_peer(),
            vec![source],
            &PolicyHandler::default(),
        )
        .await
        .unwrap();
    }

    let reopened = Node::new(config).unwrap();
    assert_eq!(reopened.transfer_log().sent().len(), 1);

    receiver.stop().await;
}

#[tokio::test]
async fn test_unknown_peer_name() {
    let dir = TempDir::new().unwrap();
    let mut config = node_config("Lonely", &dir);
    // a port nobody answers on
    config.discovery.discovery_port = {
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap().port()
    };
    let node = Node::new(Arc::new(config)).unwrap();

    let result = node.resolve_peer("Nobody Here").await;
    assert!(matches!(result, Err(LocalDropError::NotFound(_))));
}
