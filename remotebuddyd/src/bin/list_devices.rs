//! Lists input devices and whether remotebuddyd would read them
//! Usage: cargo run --bin list_devices

use remotebuddy_common::tracing;
use remotebuddyd::device::{EvdevInputSource, InputSource};
use remotebuddyd::registry::select_suitable;
use tracing::{info, warn};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    if !nix::unistd::geteuid().is_root() {
        warn!("Not running as root, some devices may be missing");
    }

    let devices = EvdevInputSource.enumerate();
    info!("Found {} input devices:", devices.len());
    for device in &devices {
        info!("  - {} at {} (VID:{:04x} PID:{:04x}) phys={} suitable={}",
              device.name, device.path.display(), device.vendor_id, device.product_id,
              device.phys, device.is_suitable());
    }

    let suitable = select_suitable(devices);
    if suitable.is_empty() {
        warn!("No remote-style devices found (need a volume-down or \"0\" key)");
    } else {
        info!("remotebuddyd would read {} of them", suitable.len());
    }
}
