//! Transfer protocol type definitions
//!
//! Defines the frames exchanged between a sending and a receiving peer.

use serde::{Deserialize, Serialize};

use crate::core::Peer;

/// A file announced in a transfer request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Relative path on the receiver side, components separated by `/`
    pub relative_path: String,
    /// Size in bytes
    pub size: u64,
}

/// Frames of a transfer session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferMessage {
    /// Sender asks for permission to send the listed files
    TransferRequest {
        sender: Peer,
        files: Vec<FileEntry>,
    },

    /// Receiver accepts the request
    Accepted,

    /// Receiver denies the request
    Denied,

    /// Announces the next file. Exactly `size` raw bytes follow this frame.
    FileHeader {
        index: usize,
        relative_path: String,
        size: u64,
    },

    /// Receiver's verdict for a single file
    FileResult {
        index: usize,
        success: bool,
        message: Option<String>,
    },

    /// Sender has no more files
    Finished,
}

impl TransferMessage {
    /// Short name of the frame, for logs and protocol errors
    pub fn kind(&self) -> &'static str {
        match self {
            TransferMessage::TransferRequest { .. } => "TransferRequest",
            TransferMessage::Accepted => "Accepted",
            TransferMessage::Denied => "Denied",
            TransferMessage::FileHeader { .. } => "FileHeader",
            TransferMessage::FileResult { .. } => "FileResult",
            TransferMessage::Finished => "Finished",
        }
    }
}
