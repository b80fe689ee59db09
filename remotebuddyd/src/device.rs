use async_trait::async_trait;
use evdev::{Device as EvdevDevice, EventStream, InputEventKind, Key};
use remotebuddy_common::{tracing, DeviceInfo, RawEvent};
use std::path::PathBuf;
use tracing::debug;

use crate::error::DeviceError;

/// Source of input devices: enumeration plus opening a device for reading
#[async_trait]
pub trait InputSource: Send + Sync {
    /// List every input device currently visible to the host. May block on
    /// device I/O, so callers run it off the async threads.
    fn enumerate(&self) -> Vec<DeviceInfo>;

    /// Open `device` for event reading. The handle is released when the
    /// returned stream is dropped.
    async fn open(&self, device: &DeviceInfo) -> Result<Box<dyn KeyEventStream>, DeviceError>;
}

/// Raw event stream of one opened device
#[async_trait]
pub trait KeyEventStream: Send {
    async fn next_event(&mut self) -> Result<RawEvent, DeviceError>;
}

/// Input devices under /dev/input, read through evdev
pub struct EvdevInputSource;

#[async_trait]
impl InputSource for EvdevInputSource {
    fn enumerate(&self) -> Vec<DeviceInfo> {
        evdev::enumerate()
            .map(|(path, device)| device_info(path, &device))
            .collect()
    }

    async fn open(&self, device: &DeviceInfo) -> Result<Box<dyn KeyEventStream>, DeviceError> {
        let path = device.path.clone();
        let evdev = EvdevDevice::open(&path).map_err(|source| DeviceError::Open {
            path: path.clone(),
            source,
        })?;
        let stream = evdev.into_event_stream().map_err(|source| DeviceError::Open {
            path: path.clone(),
            source,
        })?;

        Ok(Box::new(EvdevKeyStream { path, stream }))
    }
}

/// Build a descriptor from an opened evdev device
fn device_info(path: PathBuf, device: &EvdevDevice) -> DeviceInfo {
    let input_id = device.input_id();
    let keys = device
        .supported_keys()
        .map(|keys| keys.iter().map(|key| key.code()).collect())
        .unwrap_or_default();

    DeviceInfo {
        name: device.name().unwrap_or("Unknown Device").to_string(),
        path,
        vendor_id: input_id.vendor(),
        product_id: input_id.product(),
        phys: device.physical_path().unwrap_or("unknown").to_string(),
        keys,
    }
}

/// evdev's symbolic name for `key`, empty when the code has none
fn key_symbol(key: Key) -> String {
    let symbol = format!("{:?}", key);
    if symbol.starts_with("KEY_") || symbol.starts_with("BTN_") {
        symbol
    } else {
        String::new()
    }
}

struct EvdevKeyStream {
    path: PathBuf,
    stream: EventStream,
}

#[async_trait]
impl KeyEventStream for EvdevKeyStream {
    async fn next_event(&mut self) -> Result<RawEvent, DeviceError> {
        let event = self.stream.next_event().await.map_err(|source| DeviceError::Read {
            path: self.path.clone(),
            source,
        })?;

        Ok(match event.kind() {
            InputEventKind::Key(key) => {
                let symbol = key_symbol(key);
                debug!("Event from {}: key={} ({}) value={}",
                       self.path.display(), key.code(), symbol, event.value());
                RawEvent::Key {
                    code: key.code(),
                    symbol,
                    value: event.value(),
                }
            }
            _ => RawEvent::Other,
        })
    }
}
