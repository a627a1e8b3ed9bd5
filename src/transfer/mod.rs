//! File transfer over TCP
//!
//! # Architecture
//!
//! - **types.rs**: Frames of a transfer session
//! - **protocol.rs**: Frame encoding/decoding (length-prefixed JSON)
//! - **sender.rs**: Connects to a peer and streams files
//! - **receiver.rs**: Accepts sessions and stores files in the download directory
//! - **log.rs**: Record of sent and received files
//!
//! # Session
//!
//! ```text
//! sender                              receiver
//!   | -- TransferRequest{files} -------> |
//!   | <------------- Accepted / Denied - |
//!   | -- FileHeader{0} + raw bytes ----> |
//!   | <------------------ FileResult{0} - |
//!   |    ...                             |
//!   | -- Finished ---------------------> |
//! ```

pub mod log;
pub mod protocol;
pub mod receiver;
pub mod sender;
pub mod types;

use std::time::Duration;

use crate::config::TransferConfig;
use crate::core::progress::PROGRESS_INTERVAL;

pub use log::{Direction, LogEntry, TransferLog};
pub use receiver::FileReceiver;
pub use sender::FileSender;
pub use types::{FileEntry, TransferMessage};

/// Tunables shared by sender and receiver
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub buffer_size: usize,
    pub connect_timeout: Duration,
    /// Bound on waiting for any single frame from the other side
    pub response_timeout: Duration,
    pub progress_interval: Duration,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self::from(&TransferConfig::default())
    }
}

impl From<&TransferConfig> for TransferOptions {
    fn from(config: &TransferConfig) -> Self {
        Self {
            buffer_size: config.buffer_size.max(1),
            connect_timeout: config.connect_timeout(),
            response_timeout: config.response_timeout(),
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}
