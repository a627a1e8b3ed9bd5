//! Terminal event handler for sending and receiving

use async_trait::async_trait;
use colored::Colorize;
use parking_lot::Mutex;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::warn;

use crate::core::{
    AcceptPolicy, FileReceivingEventHandler, FileSendingEventHandler, FileWithMetadata, Peer,
    Progress,
};
use crate::errors::LocalDropError;
use crate::transfer::FileEntry;
use crate::utils::{
    bits_per_second_to_readable_string, bytes_to_readable_string, seconds_to_readable_time,
};

/// Prints transfer events and answers requests according to an [`AcceptPolicy`]
///
/// With `Ask` the user is prompted on stdin; concurrent requests are asked
/// one after another. A prompt left unanswered for `answer_timeout` denies.
pub struct ConsoleHandler {
    policy: AcceptPolicy,
    answer_timeout: Duration,
    /// Lines typed on stdin; the lock also serializes prompts
    answers: AsyncMutex<Option<mpsc::UnboundedReceiver<String>>>,
    /// Whether a `\r` progress line is currently on screen
    progress_line: Mutex<bool>,
}

impl ConsoleHandler {
    pub fn new(policy: AcceptPolicy, answer_timeout: Duration) -> Self {
        let answers = if policy == AcceptPolicy::Ask {
            spawn_stdin_reader()
        } else {
            None
        };
        Self::with_answers(policy, answer_timeout, answers)
    }

    fn with_answers(
        policy: AcceptPolicy,
        answer_timeout: Duration,
        answers: Option<mpsc::UnboundedReceiver<String>>,
    ) -> Self {
        Self {
            policy,
            answer_timeout,
            answers: AsyncMutex::new(answers),
            progress_line: Mutex::new(false),
        }
    }

    fn print_progress(&self, progress: &Progress) {
        let line = format_progress(progress);
        print!("\r\x1b[2K{}", line);
        let _ = io::stdout().flush();
        *self.progress_line.lock() = true;
    }

    /// Finish an open progress line so the next message starts on a fresh one
    fn end_progress(&self) {
        let mut open = self.progress_line.lock();
        if *open {
            println!();
            *open = false;
        }
    }

    async fn ask(&self, files: &[FileEntry], sender: &Peer) -> bool {
        let mut answers = self.answers.lock().await;
        let Some(lines) = answers.as_mut() else {
            warn!("No terminal input available, denying {}", sender);
            return false;
        };
        // input typed while no prompt was open answers nothing
        while lines.try_recv().is_ok() {}
        self.end_progress();

        let total: u64 = files.iter().map(|f| f.size).sum();
        println!(
            "{} {} wants to send {} file(s), {}",
            "?".bold().yellow(),
            sender.to_string().cyan(),
            files.len().to_string().green(),
            bytes_to_readable_string(total)
        );
        for file in files.iter().take(10) {
            println!(
                "    {} {}",
                file.relative_path,
                bytes_to_readable_string(file.size).dimmed()
            );
        }
        if files.len() > 10 {
            println!("    {}", format!("... and {} more", files.len() - 10).dimmed());
        }
        print!(
            "{} ",
            format!(
                "Accept? [y/N] ({} to answer)",
                seconds_to_readable_time(self.answer_timeout.as_secs_f32())
            )
            .yellow()
        );
        let _ = io::stdout().flush();

        match timeout(self.answer_timeout, lines.recv()).await {
            Ok(Some(line)) => line.trim().eq_ignore_ascii_case("y"),
            // stdin closed
            Ok(None) => {
                println!();
                false
            }
            Err(_) => {
                println!();
                println!("{} No answer in time", "✗".bold().red());
                false
            }
        }
    }
}

/// Read stdin lines on a detached thread
///
/// A blocking read on the runtime's pool would keep the runtime alive after
/// Ctrl+C; a plain thread ends with the process.
fn spawn_stdin_reader() -> Option<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

    match spawned {
        Ok(_) => Some(rx),
        Err(e) => {
            warn!("Cannot read answers from stdin: {}", e);
            None
        }
    }
}

/// One-line rendering of a progress snapshot
pub fn format_progress(progress: &Progress) -> String {
    format!(
        "{:>5.1}% {} / {}  {}  {} left  [{}/{}] {}",
        progress.total_progress() * 100.0,
        bytes_to_readable_string(progress.bytes_transmitted),
        bytes_to_readable_string(progress.total_bytes),
        bits_per_second_to_readable_string(progress.bits_per_second_estimation),
        seconds_to_readable_time(progress.remaining_seconds_estimation()),
        progress.files_transmitted,
        progress.total_files,
        progress.current_file.as_deref().unwrap_or("")
    )
}

fn print_file_results(files: &[FileWithMetadata]) {
    for file in files {
        let mark = match file.transmission_success {
            Some(true) => "✓".green(),
            Some(false) => "✗".red(),
            None => "-".dimmed(),
        };
        println!(
            "  {} {} {}",
            mark,
            file.relative_path,
            bytes_to_readable_string(file.size).dimmed()
        );
    }
}

#[async_trait]
impl FileReceivingEventHandler for ConsoleHandler {
    async fn on_incoming_files(&self, files: &[FileEntry], sender: &Peer) -> bool {
        let accept = match self.policy {
            AcceptPolicy::Always => true,
            AcceptPolicy::Never => false,
            AcceptPolicy::Ask => self.ask(files, sender).await,
        };

        let verdict = if accept { "accepted".green() } else { "denied".red() };
        println!(
            "{} Request from {} ({} files) {}",
            "ℹ".bold().blue(),
            sender.to_string().cyan(),
            files.len(),
            verdict
        );
        accept
    }

    fn on_receiving_progress(&self, progress: &Progress) {
        self.print_progress(progress);
    }

    fn on_receiving_finished(&self, files: &[FileWithMetadata], sender: &Peer) {
        self.end_progress();
        let ok = files
            .iter()
            .filter(|f| f.transmission_success == Some(true))
            .count();
        println!(
            "{} Received {}/{} file(s) from {}",
            "✓".bold().green(),
            ok,
            files.len(),
            sender.name.cyan()
        );
        print_file_results(files);
    }

    fn on_receiving_failed(&self, error: &LocalDropError) {
        self.end_progress();
        eprintln!("{}", error.format_colored());
    }
}

impl FileSendingEventHandler for ConsoleHandler {
    fn on_accepted(&self, receiver: &Peer) {
        println!(
            "{} {} accepted, sending...",
            "ℹ".bold().blue(),
            receiver.name.cyan()
        );
    }

    fn on_denied(&self, receiver: &Peer) {
        println!("{} {} denied the transfer", "✗".bold().red(), receiver.name.cyan());
    }

    fn on_sending_progress(&self, progress: &Progress) {
        self.print_progress(progress);
    }

    fn on_finished(&self, files: &[FileWithMetadata], receiver: &Peer) {
        self.end_progress();
        let ok = files
            .iter()
            .filter(|f| f.transmission_success == Some(true))
            .count();
        println!(
            "{} Sent {}/{} file(s) to {}",
            "✓".bold().green(),
            ok,
            files.len(),
            receiver.name.cyan()
        );
        print_file_results(files);
    }

    fn on_sending_failed(&self, _error: &LocalDropError) {
        // reported once by the caller
        self.end_progress();
    }
}
