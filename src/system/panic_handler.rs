//! Panic handler module
//!
//! Provides different panic handling strategies based on running mode:
//! - Serve mode: Display detailed stack trace, log to crash.log
//! - One-shot commands: Display simple message, log to crash.log

use chrono::Utc;
use colored::Colorize;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::path::PathBuf;

/// Running mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Long-running `serve` node
    Serve,
    /// Short commands such as `send` or `discover`
    Cli,
}

/// Install custom panic hook
pub fn install_panic_hook(mode: RunMode) {
    panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "Unknown location".to_string());

        let backtrace = std::backtrace::Backtrace::force_capture();
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

        let crash_log = crash_log_path();
        if let Err(e) = write_crash_log(&crash_log, &timestamp, &message, &location, &backtrace) {
            eprintln!("Failed to write crash log: {}", e);
        }

        match mode {
            RunMode::Serve => display_serve_panic(&message, &location, &backtrace, &crash_log),
            RunMode::Cli => display_simple_panic(&message, &crash_log),
        }
    }));
}

/// crash.log lives next to the config file
fn crash_log_path() -> PathBuf {
    crate::config::config_path()
        .parent()
        .map(|dir| dir.join("crash.log"))
        .unwrap_or_else(|| PathBuf::from("crash.log"))
}

fn display_serve_panic(
    message: &str,
    location: &str,
    backtrace: &std::backtrace::Backtrace,
    crash_log: &std::path::Path,
) {
    let rule = "═══════════════════════════════════════════════════";
    eprintln!();
    eprintln!("{}", rule.red().bold());
    eprintln!("{}", "PANIC".red().bold());
    eprintln!("{}", rule.red().bold());
    eprintln!();
    eprintln!("{} {}", "Reason:".yellow().bold(), message.white());
    eprintln!("{} {}", "Location:".yellow().bold(), location.white());
    eprintln!();
    eprintln!("{}", "Backtrace:".yellow().bold());
    eprintln!("{}", format!("{:?}", backtrace).dimmed());
    eprintln!();
    eprintln!(
        "{}",
        format!("Details saved to {}", crash_log.display()).cyan()
    );
    eprintln!("{}", rule.red().bold());
    eprintln!();
}

fn display_simple_panic(message: &str, crash_log: &std::path::Path) {
    eprintln!();
    eprintln!("Program panicked: {}", message);
    eprintln!("Details saved to {}", crash_log.display());
    eprintln!();
}

fn write_crash_log(
    path: &std::path::Path,
    timestamp: &str,
    message: &str,
    location: &str,
    backtrace: &std::backtrace::Backtrace,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    writeln!(file, "==========================================")?;
    writeln!(file, "Crash Report - {}", timestamp)?;
    writeln!(file, "==========================================")?;
    writeln!(file, "Message: {}", message)?;
    writeln!(file, "Location: {}", location)?;
    writeln!(file, "\nBacktrace:")?;
    writeln!(file, "{:?}", backtrace)?;
    writeln!(file, "==========================================\n")?;

    Ok(())
}
