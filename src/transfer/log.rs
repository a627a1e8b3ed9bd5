//! Sent / received transfer log

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::core::{FileWithMetadata, Peer};
use crate::errors::Result;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Identifies the transfer session the file belonged to
    pub session: Uuid,
    pub direction: Direction,
    pub peer: Peer,
    /// Local path: source for sent files, destination for received ones
    pub path: PathBuf,
    pub size: u64,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// Thread-safe list of transferred files
///
/// When opened with [`open`](Self::open) every new record is written back to
/// the backing file.
#[derive(Debug, Default)]
pub struct TransferLog {
    entries: RwLock<Vec<LogEntry>>,
    persist_path: Option<PathBuf>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the log at `path` and keep saving to it
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut log = Self::load_from_file(&path)?;
        log.persist_path = Some(path.as_ref().to_path_buf());
        Ok(log)
    }

    pub fn record_sent(&self, session: Uuid, receiver: &Peer, files: &[FileWithMetadata]) {
        self.record(session, Direction::Sent, receiver, files);
    }

    pub fn record_received(&self, session: Uuid, sender: &Peer, files: &[FileWithMetadata]) {
        self.record(session, Direction::Received, sender, files);
    }

    fn record(&self, session: Uuid, direction: Direction, peer: &Peer, files: &[FileWithMetadata]) {
        let now = Utc::now();
        let mut entries = self.entries.write();
        entries.extend(files.iter().map(|file| LogEntry {
            session,
            direction,
            peer: peer.clone(),
            path: file.path.clone(),
            size: file.size,
            success: file.transmission_success.unwrap_or(false),
            timestamp: now,
        }));
        drop(entries);

        if let Some(path) = &self.persist_path
            && let Err(e) = self.save_to_file(path)
        {
            warn!("Failed to persist transfer log to {}: {}", path.display(), e);
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    pub fn sent(&self) -> Vec<LogEntry> {
        self.filtered(Direction::Sent)
    }

    pub fn received(&self) -> Vec<LogEntry> {
        self.filtered(Direction::Received)
    }

    fn filtered(&self, direction: Direction) -> Vec<LogEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.direction == direction)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Load a log saved with [`save_to_file`](Self::save_to_file); a missing file is an empty log
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<LogEntry> = serde_json::from_str(&content)?;
        Ok(Self {
            entries: RwLock::new(entries),
            persist_path: None,
        })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&*self.entries.read())?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
