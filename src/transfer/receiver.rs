use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::log::TransferLog;
use super::protocol::{read_message, write_message};
use super::types::{FileEntry, TransferMessage};
use super::TransferOptions;
use crate::core::{
    FileReceivingEventHandler, FileWithMetadata, Peer, Progress, SpeedEstimator,
    destination_candidates, sanitize_relative_path,
};
use crate::errors::{LocalDropError, Result};

/// Listens for transfer sessions and stores incoming files
pub struct FileReceiver {
    listener: TcpListener,
    download_dir: PathBuf,
    options: TransferOptions,
    log: Arc<TransferLog>,
}

/// Per-connection state shared with the session task
struct Session {
    download_dir: PathBuf,
    options: TransferOptions,
    log: Arc<TransferLog>,
    handler: Arc<dyn FileReceivingEventHandler>,
}

impl FileReceiver {
    /// Bind the TCP listener; port 0 picks a free port
    ///
    /// The download directory is created when missing.
    pub async fn bind(
        addr: SocketAddr,
        download_dir: PathBuf,
        options: TransferOptions,
        log: Arc<TransferLog>,
    ) -> Result<Self> {
        tokio::fs::create_dir_all(&download_dir).await.map_err(|e| {
            LocalDropError::file_operation(format!(
                "Cannot create download directory {}: {}",
                download_dir.display(),
                e
            ))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| LocalDropError::network(format!("Cannot bind receiver on {}: {}", addr, e)))?;

        Ok(Self {
            listener,
            download_dir,
            options,
            log,
        })
    }

    pub fn local_port(&self) -> Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Accept sessions until `shutdown` flips to `true`
    ///
    /// Every session runs in its own task; a failing session never stops the listener.
    pub async fn run(
        self,
        handler: Arc<dyn FileReceivingEventHandler>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let session = Arc::new(Session {
            download_dir: self.download_dir,
            options: self.options,
            log: self.log,
            handler,
        });

        if let Ok(addr) = self.listener.local_addr() {
            info!("Receiver listening on {}", addr);
        }

        while !*shutdown.borrow() {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        debug!("Connection received from {}", remote);
                        let session = session.clone();
                        tokio::spawn(async move {
                            if let Err(e) = session.handle(stream).await {
                                warn!("Transfer session with {} failed: {}", remote, e);
                                session.handler.on_receiving_failed(&e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Receiver stopped");
    }
}

impl Session {
    async fn handle(&self, mut stream: TcpStream) -> Result<()> {
        let (sender, entries) = match self.next_message(&mut stream).await? {
            TransferMessage::TransferRequest { sender, files } => (sender, files),
            other => {
                return Err(LocalDropError::protocol(format!(
                    "Expected TransferRequest, got {}",
                    other.kind()
                )));
            }
        };
        info!(
            "Incoming transfer request from {} ({} files)",
            sender,
            entries.len()
        );

        if !self.handler.on_incoming_files(&entries, &sender).await {
            write_message(&mut stream, &TransferMessage::Denied).await?;
            info!("Denied transfer from {}", sender);
            return Ok(());
        }
        write_message(&mut stream, &TransferMessage::Accepted).await?;

        let session_id = Uuid::new_v4();
        let mut received = Vec::with_capacity(entries.len());
        let result = self
            .receive_files(&mut stream, &sender, &entries, &mut received)
            .await;

        if !received.is_empty() {
            self.log.record_received(session_id, &sender, &received);
        }
        result?;

        let succeeded = received
            .iter()
            .filter(|f| f.transmission_success == Some(true))
            .count();
        info!(
            "Received {}/{} files from {}",
            succeeded,
            received.len(),
            sender
        );
        self.handler.on_receiving_finished(&received, &sender);
        Ok(())
    }

    async fn receive_files(
        &self,
        stream: &mut TcpStream,
        sender: &Peer,
        entries: &[FileEntry],
        received: &mut Vec<FileWithMetadata>,
    ) -> Result<()> {
        let total_bytes = entries.iter().map(|e| e.size).sum();
        let mut progress = Progress::new(total_bytes, entries.len());
        let mut speed = SpeedEstimator::new(self.options.progress_interval);
        let mut buffer = vec![0u8; self.options.buffer_size];

        loop {
            match self.next_message(stream).await? {
                TransferMessage::FileHeader {
                    index,
                    relative_path,
                    size,
                } => {
                    let expected = received.len();
                    if index != expected
                        || entries
                            .get(index)
                            .is_none_or(|e| e.relative_path != relative_path || e.size != size)
                    {
                        return Err(LocalDropError::protocol(format!(
                            "Unexpected file header {} ({}), expected file {}",
                            index, relative_path, expected
                        )));
                    }

                    progress.current_file = Some(relative_path.clone());
                    let file = self
                        .receive_file(
                            stream,
                            &relative_path,
                            size,
                            &mut buffer,
                            &mut progress,
                            &mut speed,
                        )
                        .await?;

                    let success = file.transmission_success == Some(true);
                    let message = (!success).then(|| format!("Failed to store {}", relative_path));
                    write_message(
                        stream,
                        &TransferMessage::FileResult {
                            index,
                            success,
                            message,
                        },
                    )
                    .await?;

                    if success {
                        self.handler.on_file_received(&file, sender);
                    }
                    received.push(file);

                    progress.files_transmitted += 1;
                    speed.update(progress.bytes_transmitted);
                    progress.bits_per_second_estimation = speed.bits_per_second();
                    self.handler.on_receiving_progress(&progress);
                }
                TransferMessage::Finished => {
                    if received.len() != entries.len() {
                        return Err(LocalDropError::protocol(format!(
                            "Sender finished after {} of {} files",
                            received.len(),
                            entries.len()
                        )));
                    }
                    return Ok(());
                }
                other => {
                    return Err(LocalDropError::protocol(format!(
                        "Expected FileHeader or Finished, got {}",
                        other.kind()
                    )));
                }
            }
        }
    }

    /// Copy exactly `size` bytes from the stream into the download directory
    ///
    /// Local write failures mark the file as failed but the remaining bytes
    /// are still drained so the stream stays aligned. Stream failures abort the session.
    async fn receive_file(
        &self,
        stream: &mut TcpStream,
        relative_path: &str,
        size: u64,
        buffer: &mut [u8],
        progress: &mut Progress,
        speed: &mut SpeedEstimator,
    ) -> Result<FileWithMetadata> {
        let (destination, mut target) = match self.open_destination(relative_path).await {
            Ok((path, file)) => (path, Some(file)),
            Err(e) => {
                warn!("Cannot store {}: {}", relative_path, e);
                (PathBuf::from(relative_path), None)
            }
        };
        let mut failed = target.is_none();

        let mut remaining = size;
        while remaining > 0 {
            let chunk = remaining.min(buffer.len() as u64) as usize;
            let n = timeout(self.options.response_timeout, stream.read(&mut buffer[..chunk]))
                .await
                .map_err(|_| LocalDropError::timeout("Sender stalled mid-file"))??;
            if n == 0 {
                drop(target);
                if !failed {
                    let _ = tokio::fs::remove_file(&destination).await;
                }
                return Err(LocalDropError::network(format!(
                    "Connection closed with {} bytes of {} outstanding",
                    remaining, relative_path
                )));
            }

            if let Some(file) = target.as_mut()
                && let Err(e) = file.write_all(&buffer[..n]).await
            {
                warn!("Write to {} failed: {}", destination.display(), e);
                target = None;
                failed = true;
                let _ = tokio::fs::remove_file(&destination).await;
            }

            remaining -= n as u64;
            progress.bytes_transmitted += n as u64;
            if speed.update(progress.bytes_transmitted) {
                progress.bits_per_second_estimation = speed.bits_per_second();
                self.handler.on_receiving_progress(progress);
            }
        }

        if let Some(mut file) = target
            && let Err(e) = file.flush().await
        {
            warn!("Flush of {} failed: {}", destination.display(), e);
            failed = true;
            let _ = tokio::fs::remove_file(&destination).await;
        }

        if !failed {
            debug!("File saved as {}", destination.display());
        }
        let mut file = FileWithMetadata::new(destination, relative_path.to_string(), size);
        file.transmission_success = Some(!failed);
        Ok(file)
    }

    /// Create a fresh file for `relative_path`; never truncates an existing one
    ///
    /// Concurrent sessions may race for the same name, so each candidate is
    /// claimed with `create_new` and a taken name moves on to the next suffix.
    async fn open_destination(&self, relative_path: &str) -> Result<(PathBuf, File)> {
        let relative = sanitize_relative_path(relative_path)?;
        if let Some(parent) = self.download_dir.join(&relative).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        for destination in destination_candidates(&self.download_dir, &relative) {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&destination)
                .await
            {
                Ok(file) => return Ok((destination, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(LocalDropError::file_operation(format!(
            "No free name for {}",
            relative_path
        )))
    }

    async fn next_message(&self, stream: &mut TcpStream) -> Result<TransferMessage> {
        timeout(self.options.response_timeout, read_message(stream))
            .await
            .map_err(|_| LocalDropError::timeout("Sender did not send the next frame in time"))?
            .map_err(LocalDropError::from)
    }
}
