//! Remotebuddy Daemon - Main Entry Point
//!
//! Long-running daemon that turns remote control key presses into calls
//! against the local playback-control API.

use remotebuddy_common::tracing;
use remotebuddyd::config::{self, DEFAULT_CONFIG_PATH};
use remotebuddyd::favorites::FavoritesFileWatcher;
use remotebuddyd::hotplug::HotplugWatcher;
use remotebuddyd::DaemonContext;
use std::env;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let config_path = config_path_from_args(&args)?;
    let config = config::load_config(&config_path).await?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(config.daemon.level())
        .with_target(false)
        .init();

    info!("Starting Remotebuddy Daemon v{}", env!("CARGO_PKG_VERSION"));
    info!("Using configuration from {}", config_path.display());

    if !nix::unistd::geteuid().is_root() {
        warn!("Not running as root, input devices may not be readable");
    }

    let context = DaemonContext::from_config(config)?;

    // Favorites: watcher feeds the reload supervisor
    let (favorites_tx, favorites_rx) = mpsc::unbounded_channel();
    let favorites_watcher = match FavoritesFileWatcher::start(context.favorites.path(), favorites_tx) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            error!("Favorites will not be reloaded on change: {}", e);
            None
        }
    };
    let favorites_supervisor = context.spawn_favorites_supervisor(favorites_rx);

    // Devices: udev monitor feeds the rescan supervisor
    let (hotplug_tx, hotplug_rx) = mpsc::unbounded_channel();
    let hotplug_watcher = match HotplugWatcher::start(context.config.devices.input_dir.clone(), hotplug_tx) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            error!("Hot-plugged devices will not be picked up: {}", e);
            None
        }
    };
    let device_supervisor = context.spawn_device_supervisor(hotplug_rx);

    // Set up signal handlers for graceful shutdown
    let mut signals = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut interrupt = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    // Wait for shutdown signal
    tokio::select! {
        _ = signals.recv() => {
            info!("Received SIGTERM, shutting down gracefully");
        }
        _ = interrupt.recv() => {
            info!("Received SIGINT, shutting down gracefully");
        }
    }

    // Dropping the watchers closes both queues, which ends the supervisors
    drop(hotplug_watcher);
    drop(favorites_watcher);
    if let Err(e) = device_supervisor.await {
        error!("Device supervisor failed: {}", e);
    }
    if let Err(e) = favorites_supervisor.await {
        error!("Favorites supervisor failed: {}", e);
    }

    context.shutdown().await;
    info!("Remotebuddy Daemon shutdown complete");
    Ok(())
}

/// Pick the configuration file from `--config <path>`, or the default
fn config_path_from_args(args: &[String]) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match args.iter().position(|arg| arg == "--config") {
        Some(index) => args
            .get(index + 1)
            .map(PathBuf::from)
            .ok_or_else(|| "--config requires a path".into()),
        None => Ok(PathBuf::from(DEFAULT_CONFIG_PATH)),
    }
}
