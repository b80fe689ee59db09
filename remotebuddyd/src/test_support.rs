//! Scripted collaborators shared by the unit tests.

use async_trait::async_trait;
use remotebuddy_common::{DeviceInfo, RawEvent, KEY_VOLUMEDOWN};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::commands::CommandPayload;
use crate::device::{InputSource, KeyEventStream};
use crate::error::{DeviceError, RemoteError};
use crate::playback::PlaybackApi;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Command(Vec<(String, String)>),
    Favorite(Value),
}

pub fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Records every call on a channel; optionally never answers
pub struct RecordingApi {
    calls: mpsc::UnboundedSender<Call>,
    hang: bool,
}

impl RecordingApi {
    pub fn new(hang: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<Call>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { calls, hang }), rx)
    }

    async fn finish(&self) {
        if self.hang {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl PlaybackApi for RecordingApi {
    async fn send_command(&self, params: CommandPayload) -> Result<(), RemoteError> {
        let _ = self.calls.send(Call::Command(pairs(params)));
        self.finish().await;
        Ok(())
    }

    async fn play_favorite(&self, payload: &Value) -> Result<(), RemoteError> {
        let _ = self.calls.send(Call::Favorite(payload.clone()));
        self.finish().await;
        Err(RemoteError::Status(500))
    }
}

pub async fn next_call(rx: &mut mpsc::UnboundedReceiver<Call>) -> Call {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no call issued")
        .expect("call channel closed")
}

pub fn device(path: &str, keys: Vec<u16>) -> DeviceInfo {
    DeviceInfo {
        name: format!("Scripted {}", path),
        path: PathBuf::from(path),
        vendor_id: 0x1d57,
        product_id: 0xad02,
        phys: format!("scripted/{}", path),
        keys,
    }
}

pub fn remote(path: &str) -> DeviceInfo {
    device(path, vec![113, KEY_VOLUMEDOWN, 115])
}

type Feed = mpsc::UnboundedSender<Option<RawEvent>>;

/// Input source whose device list and events are driven by the test
#[derive(Default)]
pub struct ScriptedInputSource {
    devices: Mutex<Vec<DeviceInfo>>,
    feeds: Mutex<HashMap<PathBuf, Feed>>,
    open_streams: Arc<AtomicUsize>,
    opened_total: AtomicUsize,
}

impl ScriptedInputSource {
    pub fn new(devices: Vec<DeviceInfo>) -> Arc<Self> {
        let source = Self::default();
        *source.devices.lock().unwrap() = devices;
        Arc::new(source)
    }

    pub fn set_devices(&self, devices: Vec<DeviceInfo>) {
        *self.devices.lock().unwrap() = devices;
    }

    /// Streams currently held open by readers
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    pub fn opened_total(&self) -> usize {
        self.opened_total.load(Ordering::SeqCst)
    }

    /// Wait until a reader has opened `path`
    pub async fn wait_open(&self, path: &str) {
        let path = Path::new(path);
        for _ in 0..200 {
            if self.feeds.lock().unwrap().contains_key(path) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} was never opened", path.display());
    }

    /// Wait until exactly `count` streams are open
    pub async fn wait_open_streams(&self, count: usize) {
        for _ in 0..200 {
            if self.open_streams() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} open streams, have {}", count, self.open_streams());
    }

    pub fn send(&self, path: &str, event: RawEvent) {
        if let Some(feed) = self.feeds.lock().unwrap().get(Path::new(path)) {
            let _ = feed.send(Some(event));
        }
    }

    /// Emit a press followed by a release of `symbol`
    pub fn tap(&self, path: &str, code: u16, symbol: &str) {
        for value in [1, 0] {
            self.send(path, RawEvent::Key { code, symbol: symbol.to_string(), value });
        }
    }

    /// Make the next read on `path` fail as if the device was pulled
    pub fn unplug(&self, path: &str) {
        if let Some(feed) = self.feeds.lock().unwrap().remove(Path::new(path)) {
            let _ = feed.send(None);
        }
    }
}

#[async_trait]
impl InputSource for ScriptedInputSource {
    fn enumerate(&self) -> Vec<DeviceInfo> {
        self.devices.lock().unwrap().clone()
    }

    async fn open(&self, device: &DeviceInfo) -> Result<Box<dyn KeyEventStream>, DeviceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().unwrap().insert(device.path.clone(), tx);
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        self.opened_total.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(ScriptedStream {
            path: device.path.clone(),
            events: rx,
            open_streams: Arc::clone(&self.open_streams),
        }))
    }
}

struct ScriptedStream {
    path: PathBuf,
    events: mpsc::UnboundedReceiver<Option<RawEvent>>,
    open_streams: Arc<AtomicUsize>,
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyEventStream for ScriptedStream {
    async fn next_event(&mut self) -> Result<RawEvent, DeviceError> {
        match self.events.recv().await {
            Some(Some(event)) => Ok(event),
            _ => Err(DeviceError::Read {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "device unplugged"),
            }),
        }
    }
}
