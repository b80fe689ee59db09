//! Live set of suitable devices, one reader task each.

use remotebuddy_common::{tracing, DeviceInfo};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::device::InputSource;
use crate::dispatcher::CommandDispatcher;
use crate::reader::DeviceEventReader;

struct ActiveReader {
    device: DeviceInfo,
    task: JoinHandle<()>,
}

pub struct DeviceRegistry {
    source: Arc<dyn InputSource>,
    dispatcher: Arc<CommandDispatcher>,
    forward_repeats: bool,
    // held for the whole of a rescan, so overlapping rescans run one after the other
    active: Mutex<HashMap<PathBuf, ActiveReader>>,
}

impl DeviceRegistry {
    pub fn new(
        source: Arc<dyn InputSource>,
        dispatcher: Arc<CommandDispatcher>,
        forward_repeats: bool,
    ) -> Self {
        Self {
            source,
            dispatcher,
            forward_repeats,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Stop every reader, enumerate devices again and start one reader per
    /// suitable device.
    pub async fn rescan(&self) {
        let mut active = self.active.lock().await;
        let stopped = stop_readers(&mut active).await;

        let source = Arc::clone(&self.source);
        let devices = match tokio::task::spawn_blocking(move || source.enumerate()).await {
            Ok(devices) => devices,
            Err(e) => {
                error!("Device enumeration task failed: {}", e);
                Vec::new()
            }
        };

        for device in select_suitable(devices) {
            let reader = DeviceEventReader::new(
                device.clone(),
                Arc::clone(&self.source),
                Arc::clone(&self.dispatcher),
                self.forward_repeats,
            );
            let task = tokio::spawn(reader.run());
            active.insert(device.path.clone(), ActiveReader { device, task });
        }

        info!("Rescan complete: stopped {} readers, watching {} devices", stopped, active.len());
    }

    /// Devices that currently own a reader, ordered by path
    pub async fn active_devices(&self) -> Vec<DeviceInfo> {
        let active = self.active.lock().await;
        let mut devices: Vec<DeviceInfo> = active.values().map(|r| r.device.clone()).collect();
        devices.sort_by(|a, b| a.path.cmp(&b.path));
        devices
    }

    /// Stop all readers and release their devices
    pub async fn shutdown(&self) {
        info!("Shutting down device registry");
        let mut active = self.active.lock().await;
        let stopped = stop_readers(&mut active).await;
        info!("Stopped {} readers", stopped);
    }
}

/// Cancel and reap every reader. Once this returns no reader holds its
/// device open. Readers that already finished on their own are reaped the
/// same way.
async fn stop_readers(active: &mut HashMap<PathBuf, ActiveReader>) -> usize {
    let count = active.len();
    for (path, reader) in active.drain() {
        reader.task.abort();
        match reader.task.await {
            Err(e) if e.is_panic() => warn!("Reader for {} panicked: {}", path.display(), e),
            _ => debug!("Stopped reader for {}", path.display()),
        }
    }
    count
}

/// Drop duplicate paths (first descriptor wins) and devices that fail the
/// suitability check
pub fn select_suitable(devices: Vec<DeviceInfo>) -> Vec<DeviceInfo> {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();

    for device in devices {
        if !seen.insert(device.path.clone()) {
            warn!("Ignoring second device reported at {}: {}", device.path.display(), device);
            continue;
        }
        if device.is_suitable() {
            info!("Found suitable device: {} at {}", device, device.path.display());
            selected.push(device);
        } else {
            debug!("Skipping device {} at {}", device, device.path.display());
        }
    }

    selected
}
