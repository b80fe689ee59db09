use remotebuddy_common::{normalize_key_name, tracing, DeviceInfo, KeyPress, KeyState, RawEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::device::{InputSource, KeyEventStream};
use crate::dispatcher::CommandDispatcher;

/// Turns a raw event stream into key presses.
///
/// Non-key events and releases are skipped; autorepeats only pass when
/// `forward_repeats` is set. The sequence ends for good on the first read
/// failure.
pub struct KeyPresses {
    stream: Option<Box<dyn KeyEventStream>>,
    forward_repeats: bool,
}

impl KeyPresses {
    pub fn new(stream: Box<dyn KeyEventStream>, forward_repeats: bool) -> Self {
        Self {
            stream: Some(stream),
            forward_repeats,
        }
    }

    pub async fn next_press(&mut self) -> Option<KeyPress> {
        loop {
            let event = self.stream.as_mut()?.next_event().await;
            match event {
                Ok(RawEvent::Key { code, symbol, value }) => {
                    match KeyState::from_value(value) {
                        Some(KeyState::Pressed) => {}
                        Some(KeyState::Repeated) if self.forward_repeats => {}
                        _ => continue,
                    }
                    return Some(KeyPress {
                        code,
                        name: normalize_key_name(&symbol),
                    });
                }
                Ok(RawEvent::Other) => continue,
                Err(e) => {
                    debug!("Input stream ended: {}", e);
                    // drop the handle now rather than when the reader goes away
                    self.stream = None;
                    return None;
                }
            }
        }
    }
}

/// Reads one device and forwards every key press to the dispatcher until
/// the device goes away or the task is cancelled
pub struct DeviceEventReader {
    device: DeviceInfo,
    source: Arc<dyn InputSource>,
    dispatcher: Arc<CommandDispatcher>,
    forward_repeats: bool,
}

impl DeviceEventReader {
    pub fn new(
        device: DeviceInfo,
        source: Arc<dyn InputSource>,
        dispatcher: Arc<CommandDispatcher>,
        forward_repeats: bool,
    ) -> Self {
        Self {
            device,
            source,
            dispatcher,
            forward_repeats,
        }
    }

    pub async fn run(self) {
        let path = self.device.path.display().to_string();
        info!("Starting event reader for {} at {}", self.device, path);

        let stream = match self.source.open(&self.device).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to open device {} for event reading: {}", path, e);
                return;
            }
        };

        let mut presses = KeyPresses::new(stream, self.forward_repeats);
        while let Some(press) = presses.next_press().await {
            debug!("Key press from {}: {} (code {})", path, press.name, press.code);
            self.dispatcher.dispatch(&press.name);
        }

        info!("Event reader stopped for {}", path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceError;
    use crate::favorites::FavoritesStore;
    use crate::test_support::{next_call, pairs, remote, Call, RecordingApi, ScriptedInputSource};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;

    // Replays a fixed list of events, then fails like an unplugged device
    struct Replay(VecDeque<RawEvent>);

    #[async_trait]
    impl KeyEventStream for Replay {
        async fn next_event(&mut self) -> Result<RawEvent, DeviceError> {
            self.0.pop_front().ok_or_else(|| DeviceError::Read {
                path: "/dev/input/event9".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            })
        }
    }

    fn key(code: u16, symbol: &str, value: i32) -> RawEvent {
        RawEvent::Key { code, symbol: symbol.to_string(), value }
    }

    fn replay(events: Vec<RawEvent>) -> Box<dyn KeyEventStream> {
        Box::new(Replay(events.into()))
    }

    async fn collect(mut presses: KeyPresses) -> Vec<String> {
        let mut names = Vec::new();
        while let Some(press) = presses.next_press().await {
            names.push(press.name);
        }
        names
    }

    #[tokio::test]
    async fn test_only_presses_pass() {
        let presses = KeyPresses::new(
            replay(vec![
                key(115, "KEY_VOLUMEUP", 1),
                RawEvent::Other,
                key(115, "KEY_VOLUMEUP", 2),
                key(115, "KEY_VOLUMEUP", 0),
                key(164, "KEY_PLAYPAUSE", 1),
                key(164, "KEY_PLAYPAUSE", 0),
            ]),
            false,
        );
        assert_eq!(collect(presses).await, vec!["VOLUMEUP", "PLAYPAUSE"]);
    }

    #[tokio::test]
    async fn test_repeats_forwarded_when_enabled() {
        let presses = KeyPresses::new(
            replay(vec![
                key(115, "KEY_VOLUMEUP", 1),
                key(115, "KEY_VOLUMEUP", 2),
                key(115, "KEY_VOLUMEUP", 2),
                key(115, "KEY_VOLUMEUP", 0),
            ]),
            true,
        );
        assert_eq!(collect(presses).await, vec!["VOLUMEUP"; 3]);
    }

    #[tokio::test]
    async fn test_unnamed_key_reads_as_mute() {
        let mut presses = KeyPresses::new(replay(vec![key(0x2f0, "", 1)]), false);
        let press = presses.next_press().await.unwrap();
        assert_eq!(press, KeyPress { code: 0x2f0, name: "MUTE".to_string() });
    }

    #[tokio::test]
    async fn test_sequence_ends_after_read_failure() {
        let mut presses = KeyPresses::new(replay(vec![key(2, "KEY_1", 1)]), false);
        assert!(presses.next_press().await.is_some());
        assert!(presses.next_press().await.is_none());
        assert!(presses.next_press().await.is_none());
    }

    #[tokio::test]
    async fn test_reader_dispatches_and_stops_on_unplug() {
        let source = ScriptedInputSource::new(vec![]);
        let favorites = Arc::new(FavoritesStore::new("/nonexistent/favorites.json"));
        let (api, mut calls) = RecordingApi::new(false);
        let dispatcher = Arc::new(CommandDispatcher::new(api, favorites, Duration::from_millis(50)));

        let reader = DeviceEventReader::new(remote("/dev/input/event3"), source.clone(), dispatcher, false);
        let task = tokio::spawn(reader.run());

        source.wait_open("/dev/input/event3").await;
        source.tap("/dev/input/event3", 114, "KEY_VOLUMEDOWN");
        source.tap("/dev/input/event3", 0x2f0, "");
        assert_eq!(next_call(&mut calls).await, Call::Command(pairs(&[("cmd", "volume"), ("volume", "minus")])));
        assert_eq!(next_call(&mut calls).await, Call::Command(pairs(&[("cmd", "volume"), ("volume", "toggle")])));

        source.unplug("/dev/input/event3");
        tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert_eq!(source.open_streams(), 0);
    }
}
