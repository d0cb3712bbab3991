use std::fs::File;
use std::io::Write;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub fn log_line(log: Option<&mut File>, message: &str) -> Result<()> {
    info!("{message}");
    if let Some(log) = log {
        writeln!(log, "{message}")?;
    }
    Ok(())
}

pub fn warn_line(log: Option<&mut File>, message: &str) -> Result<()> {
    warn!("{message}");
    if let Some(log) = log {
        writeln!(log, "WARNING: {message}")?;
    }
    Ok(())
}
