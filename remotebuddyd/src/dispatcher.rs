//! Routes normalized key presses to the playback API.
//!
//! Delivery is at-most-once and best effort: every remote call runs on its
//! own task under a short deadline, so a slow or unreachable endpoint never
//! holds up the device reader that pressed the key. Failed calls are logged
//! at debug level and dropped.

use remotebuddy_common::tracing;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::commands::{command_for, CommandPayload};
use crate::error::RemoteError;
use crate::favorites::FavoritesStore;
use crate::playback::PlaybackApi;

/// What a key press was routed to
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Command(CommandPayload),
    Favorite(Value),
    Unbound,
}

pub struct CommandDispatcher {
    api: Arc<dyn PlaybackApi>,
    favorites: Arc<FavoritesStore>,
    deadline: Duration,
}

impl CommandDispatcher {
    pub fn new(api: Arc<dyn PlaybackApi>, favorites: Arc<FavoritesStore>, deadline: Duration) -> Self {
        Self { api, favorites, deadline }
    }

    /// Fire the call bound to `key` without waiting for it.
    ///
    /// The fixed command table wins over favorites. Must be called from
    /// within a tokio runtime.
    pub fn dispatch(&self, key: &str) -> Dispatch {
        if let Some(params) = command_for(key) {
            debug!("Key {} -> command {:?}", key, params);
            let api = Arc::clone(&self.api);
            self.send_best_effort(key, async move { api.send_command(params).await });
            return Dispatch::Command(params);
        }

        if let Some(payload) = self.favorites.lookup(key) {
            debug!("Key {} -> favorite {}", key, payload);
            let api = Arc::clone(&self.api);
            let body = payload.clone();
            self.send_best_effort(key, async move { api.play_favorite(&body).await });
            return Dispatch::Favorite(payload);
        }

        debug!("Key {} is not bound", key);
        Dispatch::Unbound
    }

    fn send_best_effort<F>(&self, key: &str, call: F)
    where
        F: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        let deadline = self.deadline;
        let key = key.to_string();

        tokio::spawn(async move {
            let result = match tokio::time::timeout(deadline, call).await {
                Ok(result) => result,
                Err(_) => Err(RemoteError::Deadline(deadline.as_millis() as u64)),
            };
            match result {
                Ok(()) => debug!("Delivered {}", key),
                Err(e) => debug!("Dropped {} press: {}", key, e),
            }
        });
    }
}
