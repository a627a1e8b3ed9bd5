//! Config commands

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use crate::config::{self, StaticConfig};
use crate::interfaces::cli::CliError;

/// Generate example configuration file
pub fn config_generate(output_path: Option<String>, force: bool) -> Result<(), CliError> {
    let path = output_path.unwrap_or_else(|| "config.example.toml".to_string());

    // 非 --force 模式下交互确认覆盖
    if !force && Path::new(&path).exists() {
        print!(
            "{} {} {}",
            "File already exists:".yellow(),
            path.blue(),
            "Overwrite? [y/N] ".yellow()
        );
        io::stdout()
            .flush()
            .map_err(|e| CliError::CommandError(e.to_string()))?;

        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| CliError::CommandError(e.to_string()))?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Aborted.".red());
            return Ok(());
        }
    }

    println!(
        "{} {}",
        "Generating configuration file...".yellow(),
        path.blue()
    );

    StaticConfig::default().save_to_file(&path).map_err(|e| {
        CliError::CommandError(format!("Unable to write configuration file: {}", e))
    })?;

    println!(
        "  {} {}",
        "Configuration file generated successfully".green(),
        path.blue()
    );
    println!(
        "  {} {}",
        "Copy it to".yellow(),
        config::default_config_path().display().to_string().blue()
    );
    Ok(())
}

/// Print the effective configuration (file + environment)
pub fn config_show(config: Arc<StaticConfig>, json: bool) -> Result<(), CliError> {
    let rendered = if json {
        serde_json::to_string_pretty(config.as_ref())
            .map_err(|e| CliError::CommandError(e.to_string()))?
    } else {
        toml::to_string_pretty(config.as_ref())
            .map_err(|e| CliError::CommandError(e.to_string()))?
    };

    if !json {
        println!(
            "{} {}",
            "# Source:".dimmed(),
            config::config_path().display().to_string().dimmed()
        );
    }
    println!("{}", rendered);
    Ok(())
}
