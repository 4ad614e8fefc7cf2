// src/main.rs

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Context;
use chisel::config::{Config, LoggingConfig};
use log::{error, info, warn};

/// Logs go to `logging.file` when set: stderr is the screen the editor is
/// drawing on.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.level));
    builder.format_timestamp_micros();

    if let Some(ref path) = config.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

/// Main entry point for the `chisel` editor.
fn main() -> anyhow::Result<()> {
    let (config, config_error) = Config::load_or_default();
    init_logging(&config.logging)?;
    if let Some(e) = config_error {
        warn!("Config: {:#}. Using defaults.", e);
    }

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: chisel <file>")?;

    info!("Starting chisel on {}...", path.display());
    if let Err(e) = chisel::editor::run(&config, &path) {
        error!("chisel stopped: {:#}", e);
        return Err(e);
    }
    info!("chisel exited successfully.");
    Ok(())
}
