//! Client side of the playback-control API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::commands::CommandPayload;
use crate::error::RemoteError;

/// Outbound calls the dispatcher can make
#[async_trait]
pub trait PlaybackApi: Send + Sync {
    /// Issue a playback command, parameters passed as the query string
    async fn send_command(&self, params: CommandPayload) -> Result<(), RemoteError>;

    /// Ask the player to replace its queue with `payload` and start playing
    async fn play_favorite(&self, payload: &Value) -> Result<(), RemoteError>;
}

/// [`PlaybackApi`] over HTTP using reqwest
pub struct HttpPlaybackApi {
    client: Client,
    command_url: String,
    favorite_url: String,
}

impl HttpPlaybackApi {
    pub fn new(
        command_url: impl Into<String>,
        favorite_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            command_url: command_url.into(),
            favorite_url: favorite_url.into(),
        })
    }
}

fn check_status(response: reqwest::Response) -> Result<(), RemoteError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(RemoteError::Status(status.as_u16()))
    }
}

#[async_trait]
impl PlaybackApi for HttpPlaybackApi {
    async fn send_command(&self, params: CommandPayload) -> Result<(), RemoteError> {
        let response = self.client.get(&self.command_url).query(params).send().await?;
        check_status(response)
    }

    async fn play_favorite(&self, payload: &Value) -> Result<(), RemoteError> {
        let response = self.client.post(&self.favorite_url).json(payload).send().await?;
        check_status(response)
    }
}
