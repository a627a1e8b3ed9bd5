use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing::debug;

use localdrop::cli::Cli;
use localdrop::config;
use localdrop::interfaces::cli::run_cli_command;
use localdrop::system::{RunMode, init_logging, install_panic_hook};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mode = if cli.command.is_long_running() {
        RunMode::Serve
    } else {
        RunMode::Cli
    };
    install_panic_hook(mode);

    let config = config::init_config(cli.config.as_deref()).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            config::resolve_config_path(cli.config.as_deref()).display()
        )
    })?;

    // 日志 guard 需要在整个进程生命周期内保持
    let log_guard = init_logging(&config.logging);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run_cli_command(cli.command, config).await {
        eprintln!("{}", e.format_colored());
        drop(log_guard);
        std::process::exit(1);
    }

    if mode == RunMode::Serve {
        println!("{}", "Bye.".dimmed());
    }
    Ok(())
}
