use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use super::TransferOptions;
use super::protocol::{read_message, write_message};
use super::types::TransferMessage;
use crate::core::{
    FileSendingEventHandler, FileWithMetadata, Peer, Progress, SpeedEstimator,
    expand_files_with_relative_paths,
};
use crate::errors::{LocalDropError, Result};

/// Sends a set of files and directories to one receiving peer
pub struct FileSender {
    local: Peer,
    receiver: Peer,
    paths: Vec<PathBuf>,
    options: TransferOptions,
}

impl FileSender {
    pub fn new(local: Peer, receiver: Peer, paths: Vec<PathBuf>, options: TransferOptions) -> Self {
        Self {
            local,
            receiver,
            paths,
            options,
        }
    }

    /// Run the whole session
    ///
    /// Returns the expanded files with `transmission_success` filled in from
    /// the receiver's verdicts. A denied request yields `TransferDenied`.
    pub async fn send(&self, handler: &dyn FileSendingEventHandler) -> Result<Vec<FileWithMetadata>> {
        match self.run(handler).await {
            Ok(files) => Ok(files),
            Err(e) => {
                if !matches!(e, LocalDropError::TransferDenied(_)) {
                    handler.on_sending_failed(&e);
                }
                Err(e)
            }
        }
    }

    async fn run(&self, handler: &dyn FileSendingEventHandler) -> Result<Vec<FileWithMetadata>> {
        let paths = self.paths.clone();
        let mut files = tokio::task::spawn_blocking(move || expand_files_with_relative_paths(&paths))
            .await
            .map_err(|e| LocalDropError::transfer_failed(format!("File expansion aborted: {}", e)))??;

        let address = self.receiver.address();
        let mut stream = timeout(self.options.connect_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| LocalDropError::timeout(format!("Connecting to {} timed out", address)))?
            .map_err(|e| LocalDropError::network(format!("Cannot connect to {}: {}", address, e)))?;
        let _ = stream.set_nodelay(true);
        debug!("Connected to {}", address);

        write_message(
            &mut stream,
            &TransferMessage::TransferRequest {
                sender: self.local.clone(),
                files: files.iter().map(FileWithMetadata::to_entry).collect(),
            },
        )
        .await?;

        match self.next_message(&mut stream).await? {
            TransferMessage::Accepted => {
                info!("{} accepted {} files", self.receiver, files.len());
                handler.on_accepted(&self.receiver);
            }
            TransferMessage::Denied => {
                info!("{} denied the transfer", self.receiver);
                handler.on_denied(&self.receiver);
                return Err(LocalDropError::transfer_denied(format!(
                    "{} denied the transfer",
                    self.receiver.name
                )));
            }
            other => {
                return Err(LocalDropError::protocol(format!(
                    "Expected Accepted or Denied, got {}",
                    other.kind()
                )));
            }
        }

        let total_bytes = files.iter().map(|f| f.size).sum();
        let mut progress = Progress::new(total_bytes, files.len());
        let mut speed = SpeedEstimator::new(self.options.progress_interval);
        let mut buffer = vec![0u8; self.options.buffer_size];

        for (index, file) in files.iter_mut().enumerate() {
            progress.current_file = Some(file.relative_path.clone());
            self.send_file(
                &mut stream,
                index,
                file,
                &mut buffer,
                &mut progress,
                &mut speed,
                handler,
            )
            .await?;

            match self.next_message(&mut stream).await? {
                TransferMessage::FileResult {
                    index: acked,
                    success,
                    message,
                } if acked == index => {
                    if !success {
                        info!(
                            "{} could not store {}: {}",
                            self.receiver.name,
                            file.relative_path,
                            message.as_deref().unwrap_or("unknown error")
                        );
                    }
                    file.transmission_success = Some(success);
                }
                other => {
                    return Err(LocalDropError::protocol(format!(
                        "Expected FileResult for file {}, got {}",
                        index,
                        other.kind()
                    )));
                }
            }

            progress.files_transmitted += 1;
            speed.update(progress.bytes_transmitted);
            progress.bits_per_second_estimation = speed.bits_per_second();
            handler.on_sending_progress(&progress);
        }

        write_message(&mut stream, &TransferMessage::Finished).await?;
        let _ = stream.shutdown().await;

        info!(
            "Sent {} files ({} bytes) to {}",
            files.len(),
            total_bytes,
            self.receiver
        );
        handler.on_finished(&files, &self.receiver);
        Ok(files)
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_file(
        &self,
        stream: &mut TcpStream,
        index: usize,
        file: &FileWithMetadata,
        buffer: &mut [u8],
        progress: &mut Progress,
        speed: &mut SpeedEstimator,
        handler: &dyn FileSendingEventHandler,
    ) -> Result<()> {
        let mut source = File::open(&file.path).await.map_err(|e| {
            LocalDropError::transfer_failed(format!("Cannot open {}: {}", file.path.display(), e))
        })?;

        write_message(
            stream,
            &TransferMessage::FileHeader {
                index,
                relative_path: file.relative_path.clone(),
                size: file.size,
            },
        )
        .await?;

        let mut remaining = file.size;
        while remaining > 0 {
            let chunk = remaining.min(buffer.len() as u64) as usize;
            let n = source.read(&mut buffer[..chunk]).await.map_err(|e| {
                LocalDropError::transfer_failed(format!("Cannot read {}: {}", file.path.display(), e))
            })?;
            if n == 0 {
                return Err(LocalDropError::transfer_failed(format!(
                    "{} shrank during the transfer",
                    file.path.display()
                )));
            }

            stream.write_all(&buffer[..n]).await?;
            remaining -= n as u64;
            progress.bytes_transmitted += n as u64;

            if speed.update(progress.bytes_transmitted) {
                progress.bits_per_second_estimation = speed.bits_per_second();
                handler.on_sending_progress(progress);
            }
        }
        stream.flush().await?;
        Ok(())
    }

    async fn next_message(&self, stream: &mut TcpStream) -> Result<TransferMessage> {
        timeout(self.options.response_timeout, read_message(stream))
            .await
            .map_err(|_| {
                LocalDropError::timeout(format!("{} did not respond in time", self.receiver.name))
            })?
            .map_err(LocalDropError::from)
    }
}
