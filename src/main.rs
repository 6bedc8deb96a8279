use anyhow::{Context, Result};
use clap::Parser;
use fluid_pilot::catalog::SnapshotCatalog;
use fluid_pilot::config::Config;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cfg = Config::parse();
    init_tracing(&cfg)?;

    if cfg.clean_settings {
        let catalog = SnapshotCatalog::new(&cfg.settings_dir);
        let rewritten = catalog
            .clean()
            .with_context(|| format!("clean snapshots in {}", cfg.settings_dir.display()))?;
        println!("cleaned {rewritten} snapshot file(s) in {}", cfg.settings_dir.display());
        return Ok(());
    }

    fluid_pilot::app::run(cfg)
}

/// stderr when headless, the log file when given; the HUD owns the terminal
/// otherwise, so nothing is installed.
fn init_tracing(cfg: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_filter))
        .with_context(|| format!("invalid log filter '{}'", cfg.log_filter))?;

    if let Some(path) = &cfg.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else if cfg.headless || cfg.clean_settings {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
    Ok(())
}
