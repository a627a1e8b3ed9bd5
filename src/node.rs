//! Running LocalDrop node
//!
//! Ties the building blocks together: local identity, file receiver,
//! discovery responder, hello listener, peer registry and transfer log.

use parking_lot::RwLock;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StaticConfig;
use crate::core::{FileReceivingEventHandler, FileSendingEventHandler, FileWithMetadata, Peer};
use crate::discovery::{
    self, DiscoveryListener, HelloListener, PeerEvent, PeerRegistry, SharedPeer,
};
use crate::errors::{LocalDropError, Result};
use crate::transfer::{FileReceiver, FileSender, TransferLog, TransferOptions};
use crate::utils::{parse_endpoint, resolve_advertise_ip};

/// Upper bound for background tasks to wind down in [`Node::stop`]
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Name used when neither the config nor the environment provide one
const FALLBACK_NAME: &str = "localdrop";

/// Display name from the OS user, reduced to characters a peer name may hold
pub fn local_user_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .map(|n| {
            n.chars()
                .filter(|c| c.is_alphanumeric() || *c == ' ')
                .collect::<String>()
        })
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

/// Resolve the local peer from configuration
///
/// The port is `transfer.port`; a started node replaces it with the port the
/// receiver actually bound.
pub fn local_identity(config: &StaticConfig) -> Result<Peer> {
    let name = config
        .peer
        .name
        .clone()
        .unwrap_or_else(local_user_name);
    Peer::validate_name(&name)?;

    let ip = resolve_advertise_ip(config.peer.advertise_ip.as_deref())?;
    Ok(Peer::new(name.trim(), ip.to_string(), config.transfer.port))
}

pub struct Node {
    config: Arc<StaticConfig>,
    local: SharedPeer,
    registry: Arc<PeerRegistry>,
    log: Arc<TransferLog>,
    options: TransferOptions,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Node {
    pub fn new(config: Arc<StaticConfig>) -> Result<Self> {
        let local = local_identity(&config)?;

        let log = match &config.transfer.log_path {
            Some(path) => TransferLog::open(path)?,
            None => TransferLog::new(),
        };

        let (shutdown, _) = watch::channel(false);
        let options = TransferOptions::from(&config.transfer);

        info!("Local peer: {}", local);
        Ok(Self {
            config,
            local: Arc::new(RwLock::new(local)),
            registry: Arc::new(PeerRegistry::new()),
            log: Arc::new(log),
            options,
            shutdown,
            tasks: Vec::new(),
        })
    }

    /// Bind every listener and spawn the background tasks
    ///
    /// The receiver binds `transfer.port` (0 picks a free port) and the local
    /// peer takes over the bound port before anything is announced.
    pub async fn start(&mut self, handler: Arc<dyn FileReceivingEventHandler>) -> Result<()> {
        if self.is_running() {
            return Err(LocalDropError::validation("Node is already running"));
        }
        self.shutdown.send_replace(false);

        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.config.transfer.port));
        let receiver = FileReceiver::bind(
            bind_addr,
            self.config.transfer.download_dir.clone(),
            self.options.clone(),
            self.log.clone(),
        )
        .await?;
        self.local.write().file_transfer_port = receiver.local_port()?;

        let discovery = DiscoveryListener::bind(&self.config.discovery, self.local.clone()).await?;
        let hello = HelloListener::bind(
            &self.config.discovery,
            self.local.clone(),
            self.registry.clone(),
        )
        .await?;

        self.tasks.push(tokio::spawn(
            receiver.run(handler, self.shutdown.subscribe()),
        ));
        self.tasks
            .push(tokio::spawn(discovery.run(self.shutdown.subscribe())));
        self.tasks.push(tokio::spawn(hello.run(self.shutdown.subscribe())));

        info!("Node started as {}", self.local_peer());
        Ok(())
    }

    /// Signal shutdown and wait for the background tasks
    ///
    /// The hello listener broadcasts `BYE` before it returns.
    pub async fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.shutdown.send_replace(true);

        for task in self.tasks.drain(..) {
            match tokio::time::timeout(STOP_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Background task ended abnormally: {}", e),
                Err(_) => warn!("Background task did not stop within {:?}", STOP_TIMEOUT),
            }
        }
        info!("Node stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn config(&self) -> &StaticConfig {
        &self.config
    }

    pub fn local_peer(&self) -> Peer {
        self.local.read().clone()
    }

    /// Rename the local peer
    ///
    /// Discovery responses use the new name immediately. A running node also
    /// re-announces itself so other registries pick up the change.
    pub async fn set_local_name(&self, name: &str) -> Result<()> {
        Peer::validate_name(name)?;
        let announcement = {
            let mut local = self.local.write();
            local.name = name.trim().to_string();
            local.to_hello_message()
        };
        info!("Local peer renamed to '{}'", name.trim());

        if self.is_running() {
            discovery::send_udp_broadcast(
                &announcement,
                &self.config.discovery.broadcast_address,
                self.config.discovery.hello_port,
            )
            .await;
        }
        Ok(())
    }

    /// Broadcast a discovery request and collect the answers
    pub async fn discover_peers(&self) -> Result<Vec<Peer>> {
        let local = self.local_peer();
        discovery::discover_peers(&local, &self.config.discovery).await
    }

    /// Peers currently known through hello announcements or manual entry
    pub fn peers(&self) -> Vec<Peer> {
        self.registry.peers()
    }

    pub fn add_peer_manually(&self, name: &str, ip: &str, port: u16) -> Result<Peer> {
        self.registry.add_manual(name, ip, port)
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PeerEvent> {
        self.registry.subscribe()
    }

    pub fn transfer_log(&self) -> &Arc<TransferLog> {
        &self.log
    }

    /// Resolve a send target
    ///
    /// `ip:port` is used directly. Anything else is a peer name, looked up in
    /// the registry first and then through a discovery round.
    pub async fn resolve_peer(&self, target: &str) -> Result<Peer> {
        if let Some(addr) = parse_endpoint(target) {
            let ip = addr.ip().to_string();
            return Ok(Peer::new(ip.clone(), ip, addr.port()));
        }

        if let Some(peer) = self.registry.find_by_name(target) {
            return Ok(peer);
        }

        debug!("'{}' not in registry, running discovery", target);
        let discovered = self.discover_peers().await?;
        discovered
            .iter()
            .find(|p| p.name == target)
            .or_else(|| discovered.iter().find(|p| p.name.eq_ignore_ascii_case(target)))
            .cloned()
            .ok_or_else(|| LocalDropError::not_found(format!("No peer named '{}' found", target)))
    }

    /// Send files and directories to `receiver` and record the outcome
    ///
    /// Every requested path ends up in the sent log, failed sessions included.
    pub async fn send_files(
        &self,
        receiver: &Peer,
        paths: Vec<PathBuf>,
        handler: &dyn FileSendingEventHandler,
    ) -> Result<Vec<FileWithMetadata>> {
        let session = Uuid::new_v4();
        let sender = FileSender::new(
            self.local_peer(),
            receiver.clone(),
            paths.clone(),
            self.options.clone(),
        );

        match sender.send(handler).await {
            Ok(files) => {
                self.log.record_sent(session, receiver, &files);
                Ok(files)
            }
            Err(e) => {
                let failed: Vec<FileWithMetadata> = paths.into_iter().map(failed_entry).collect();
                self.log.record_sent(session, receiver, &failed);
                Err(e)
            }
        }
    }
}

fn failed_entry(path: PathBuf) -> FileWithMetadata {
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let relative = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut file = FileWithMetadata::new(path, relative, size);
    file.transmission_success = Some(false);
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback_config() -> StaticConfig {
        let mut config = StaticConfig::default();
        config.peer.name = Some("Test Node".to_string());
        config.peer.advertise_ip = Some("127.0.0.1".to_string());
        config.transfer.log_path = None;
        config
    }

    #[test]
    fn test_local_identity_from_config() {
        let peer = local_identity(&loopback_config()).unwrap();
        assert_eq!(peer.name, "Test Node");
        assert_eq!(peer.ip, "127.0.0.1");
        assert_eq!(peer.file_transfer_port, 0);
    }

    #[test]
    fn test_local_identity_rejects_bad_name() {
        let mut config = loopback_config();
        config.peer.name = Some("a|b".to_string());
        assert!(local_identity(&config).is_err());
    }

    #[test]
    fn test_local_user_name_is_valid() {
        assert!(Peer::validate_name(&local_user_name()).is_ok());
    }

    #[tokio::test]
    async fn test_rename_validates() {
        let node = Node::new(Arc::new(loopback_config())).unwrap();
        assert!(node.set_local_name("bad|name").await.is_err());
        node.set_local_name("Kitchen").await.unwrap();
        assert_eq!(node.local_peer().name, "Kitchen");
    }

    #[tokio::test]
    async fn test_resolve_endpoint_target() {
        let node = Node::new(Arc::new(loopback_config())).unwrap();
        let peer = node.resolve_peer("127.0.0.1:4000").await.unwrap();
        assert_eq!(peer.ip, "127.0.0.1");
        assert_eq!(peer.file_transfer_port, 4000);

        node.add_peer_manually("Desk", "10.0.0.9", 5000).unwrap();
        let peer = node.resolve_peer("Desk").await.unwrap();
        assert_eq!(peer.ip, "10.0.0.9");
    }
}
