//! Transfer event handlers
//!
//! Front ends observe transfers through these traits. Every method has a
//! default no-op body, so implementors only override what they need.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use tracing::{info, warn};

use super::{FileWithMetadata, Peer, Progress};
use crate::errors::LocalDropError;
use crate::transfer::types::FileEntry;

/// Events while sending files to another peer
pub trait FileSendingEventHandler: Send + Sync {
    /// The receiver accepted the transmission request
    fn on_accepted(&self, _receiver: &Peer) {}

    /// The receiver denied the transmission request
    fn on_denied(&self, _receiver: &Peer) {}

    /// New bytes were sent
    fn on_sending_progress(&self, _progress: &Progress) {}

    /// All files were processed
    fn on_finished(&self, _files: &[FileWithMetadata], _receiver: &Peer) {}

    /// The transmission failed
    fn on_sending_failed(&self, _error: &LocalDropError) {}
}

/// Events while receiving files from another peer
#[async_trait]
pub trait FileReceivingEventHandler: Send + Sync {
    /// A peer asks to send files. The return value accepts or denies the request.
    async fn on_incoming_files(&self, files: &[FileEntry], sender: &Peer) -> bool;

    /// New bytes were received
    fn on_receiving_progress(&self, _progress: &Progress) {}

    /// A single file was stored
    fn on_file_received(&self, _file: &FileWithMetadata, _sender: &Peer) {}

    /// The sender finished; `files` holds every file of the session
    fn on_receiving_finished(&self, _files: &[FileWithMetadata], _sender: &Peer) {}

    /// The session failed
    fn on_receiving_failed(&self, _error: &LocalDropError) {}
}

/// How incoming transfer requests are answered when nobody is asked
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AcceptPolicy {
    /// Ask interactively
    #[default]
    Ask,
    /// Accept every request
    Always,
    /// Deny every request
    Never,
}

impl std::fmt::Display for AcceptPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// Handler that answers requests from a fixed policy and logs everything
///
/// `Ask` has nobody to ask here and therefore denies.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyHandler {
    pub policy: AcceptPolicy,
}

impl PolicyHandler {
    pub fn new(policy: AcceptPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl FileReceivingEventHandler for PolicyHandler {
    async fn on_incoming_files(&self, files: &[FileEntry], sender: &Peer) -> bool {
        let accept = self.policy == AcceptPolicy::Always;
        info!(
            "Incoming request from {} ({} files): {}",
            sender,
            files.len(),
            if accept { "accepted" } else { "denied" }
        );
        accept
    }

    fn on_file_received(&self, file: &FileWithMetadata, sender: &Peer) {
        info!(
            "Received {} ({} bytes) from {}",
            file.path.display(),
            file.size,
            sender.name
        );
    }

    fn on_receiving_failed(&self, error: &LocalDropError) {
        warn!("Receiving failed: {}", error);
    }
}

impl FileSendingEventHandler for PolicyHandler {
    fn on_denied(&self, receiver: &Peer) {
        info!("{} denied the transfer", receiver);
    }

    fn on_sending_failed(&self, error: &LocalDropError) {
        warn!("Sending failed: {}", error);
    }
}
