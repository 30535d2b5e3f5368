use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use foreman_supervisor::{
    lifecycle, LifecycleCoordinator, ProcessRegistry, Supervisor, SupervisorConfig,
};

/// Foreman - named process supervisor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long, value_name = "FILE", default_value = "foreman.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_present = args.config.exists();
    let mut config = if config_present {
        SupervisorConfig::load_from_file(&args.config)?
    } else {
        SupervisorConfig::default()
    };

    initialize_logging(args.debug, &config.supervisor.log_level)?;
    info!("starting foreman, config: {}", args.config.display());
    if !config_present {
        info!("config file not found, using defaults");
    }

    if config.processes.is_empty() {
        info!("no processes configured, registering built-in file server");
        config
            .processes
            .push(SupervisorConfig::default_file_server(&config.supervisor));
    }

    let registry = Arc::new(ProcessRegistry::new());
    for entry in &config.processes {
        let mut spec = entry.to_spec();
        // Entries without an explicit working directory run inside their
        // data directory, next to any generated config.json.
        if spec.work_dir.is_none() {
            spec.work_dir = Some(entry.data_dir(&config.supervisor.data_dir));
        }
        registry
            .register(spec)
            .with_context(|| format!("failed to register process '{}'", entry.name))?;
    }
    info!("registered {} processes", config.processes.len());

    let supervisor = Arc::new(
        Supervisor::new(registry, CancellationToken::new())
            .with_grace_period(Duration::from_secs(config.supervisor.grace_period_secs)),
    );
    let coordinator = Arc::new(LifecycleCoordinator::new(supervisor.clone()));

    for entry in config.processes.iter().filter(|e| e.enabled) {
        entry
            .prepare_data_dir(&config.supervisor.data_dir)
            .with_context(|| format!("failed to prepare data for '{}'", entry.name))?;

        match supervisor.start(&entry.name, &[]).await {
            Ok(msg) => info!("{msg}"),
            Err(e) => warn!(process = %entry.name, "{e}"),
        }
    }

    lifecycle::wait_for_signal().await;
    coordinator.shutdown().await;
    info!("foreman shut down");

    Ok(())
}

fn initialize_logging(debug: bool, configured_level: &str) -> Result<()> {
    let level = if debug { "debug" } else { configured_level };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    Ok(())
}
