//! Remotebuddy Daemon Library
//!
//! This library provides the core functionality for the remotebuddy daemon:
//! - Input device discovery with hot-plug rescans
//! - Per-device key event readers
//! - Dispatch of key presses to the playback-control API
//! - Favorites reloaded from a watched JSON file

use remotebuddy_common::tracing;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod commands;
pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod favorites;
pub mod hotplug;
pub mod playback;
pub mod reader;
pub mod registry;
pub mod supervisor;

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;

// Re-export common types
pub use remotebuddy_common::{DeviceInfo, KeyPress};

use config::DaemonConfig;
use device::{EvdevInputSource, InputSource};
use dispatcher::CommandDispatcher;
use error::RemoteError;
use favorites::FavoritesStore;
use hotplug::HotplugEvent;
use playback::{HttpPlaybackApi, PlaybackApi};
use registry::DeviceRegistry;

/// DaemonContext owns the long-lived components of the daemon
pub struct DaemonContext {
    pub config: DaemonConfig,
    pub favorites: Arc<FavoritesStore>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub registry: Arc<DeviceRegistry>,
}

impl DaemonContext {
    /// Wire the components around the given playback API and input source
    pub fn new(config: DaemonConfig, api: Arc<dyn PlaybackApi>, source: Arc<dyn InputSource>) -> Self {
        let favorites = Arc::new(FavoritesStore::new(config.favorites.path.clone()));
        let dispatcher = Arc::new(CommandDispatcher::new(
            api,
            Arc::clone(&favorites),
            config.api.send_deadline(),
        ));
        let registry = Arc::new(DeviceRegistry::new(
            source,
            Arc::clone(&dispatcher),
            config.devices.forward_repeats,
        ));

        Self {
            config,
            favorites,
            dispatcher,
            registry,
        }
    }

    /// Context backed by the HTTP playback API and evdev devices
    pub fn from_config(config: DaemonConfig) -> Result<Self, RemoteError> {
        let api = HttpPlaybackApi::new(
            config.api.command_url.clone(),
            config.api.favorite_url.clone(),
            config.api.send_deadline(),
        )?;
        Ok(Self::new(config, Arc::new(api), Arc::new(EvdevInputSource)))
    }

    /// Reload favorites now and again on every change notification
    pub fn spawn_favorites_supervisor(&self, changes: mpsc::UnboundedReceiver<std::path::PathBuf>) -> JoinHandle<()> {
        let favorites = Arc::clone(&self.favorites);
        let coalesce = self.config.favorites.coalesce_window();
        tokio::spawn(async move {
            supervisor::supervise("favorites", changes, coalesce, || {
                let favorites = Arc::clone(&favorites);
                async move {
                    favorites.reload().await;
                }
            })
            .await;
        })
    }

    /// Rescan devices now and again on every hot-plug notification
    pub fn spawn_device_supervisor(&self, hotplug: mpsc::UnboundedReceiver<HotplugEvent>) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            supervisor::supervise("devices", hotplug, std::time::Duration::ZERO, || {
                let registry = Arc::clone(&registry);
                async move {
                    registry.rescan().await;
                }
            })
            .await;
        })
    }

    /// Stop every device reader
    pub async fn shutdown(&self) {
        tracing::info!("Stopping device readers");
        self.registry.shutdown().await;
    }
}
