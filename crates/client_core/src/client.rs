use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Method};
use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{DanceId, Rgb, SayingId, SongId},
    protocol::{
        dance_path, say_path, song_path, CameraFeed, CommandAck, LedPixelsRequest, MoveCommand,
        RobotStatus, RotateDirection, SENSEHAT_LEDS_PATH, STATUS_PATH,
    },
};
use tracing::debug;

use crate::{config::ClientConfig, error::RequestError};

/// Normalized outcome of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Json(Value),
    /// 2xx with an empty or non-JSON body. Many robot endpoints answer this way.
    NoContent,
}

impl CommandResult {
    pub fn json(&self) -> Option<&Value> {
        match self {
            CommandResult::Json(value) => Some(value),
            CommandResult::NoContent => None,
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self, CommandResult::NoContent)
    }

    /// Bridge acknowledgement, when the body has that shape.
    pub fn ack(&self) -> Option<CommandAck> {
        self.json()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> Result<RobotStatus, RequestError>;
}

#[async_trait]
pub trait PixelSink: Send + Sync {
    async fn send_pixels(&self, pixels: &[Rgb]) -> Result<CommandResult, RequestError>;
}

/// The single chokepoint for HTTP traffic to the robot.
///
/// No retries and no timeouts beyond the transport defaults; every caller
/// decides on its own how to surface a failure.
#[derive(Debug, Clone)]
pub struct RobotClient {
    http: Client,
    config: ClientConfig,
}

impl RobotClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http(config, Client::new())
    }

    pub fn with_http(config: ClientConfig, http: Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn request<B>(
        &self,
        path: &str,
        method: Method,
        body: Option<&B>,
    ) -> Result<CommandResult, RequestError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.config.endpoint(path);
        debug!(%method, %url, "robot api request");

        let mut builder = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| RequestError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                url,
                body,
            });
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(%url, "robot api response body unreadable: {err}");
                return Ok(CommandResult::NoContent);
            }
        };

        Ok(serde_json::from_slice::<Value>(&bytes)
            .map(CommandResult::Json)
            .unwrap_or(CommandResult::NoContent))
    }

    async fn post(&self, path: &str) -> Result<CommandResult, RequestError> {
        self.request::<()>(path, Method::POST, None).await
    }

    pub async fn send_move(&self, command: MoveCommand) -> Result<CommandResult, RequestError> {
        self.post(&command.path()).await
    }

    pub async fn move_forward(&self) -> Result<CommandResult, RequestError> {
        self.send_move(MoveCommand::Forward).await
    }

    pub async fn move_backward(&self) -> Result<CommandResult, RequestError> {
        self.send_move(MoveCommand::Backward).await
    }

    pub async fn move_left(&self) -> Result<CommandResult, RequestError> {
        self.send_move(MoveCommand::Left).await
    }

    pub async fn move_right(&self) -> Result<CommandResult, RequestError> {
        self.send_move(MoveCommand::Right).await
    }

    pub async fn stop(&self) -> Result<CommandResult, RequestError> {
        self.send_move(MoveCommand::Stop).await
    }

    pub async fn speed_up(&self) -> Result<CommandResult, RequestError> {
        self.send_move(MoveCommand::SpeedUp).await
    }

    pub async fn speed_down(&self) -> Result<CommandResult, RequestError> {
        self.send_move(MoveCommand::SpeedDown).await
    }

    pub async fn rotate(&self, direction: RotateDirection) -> Result<CommandResult, RequestError> {
        self.post(&direction.path()).await
    }

    pub async fn dance(&self, dance_id: DanceId) -> Result<CommandResult, RequestError> {
        self.post(&dance_path(dance_id)).await
    }

    pub async fn play_song(&self, song_id: SongId) -> Result<CommandResult, RequestError> {
        self.post(&song_path(song_id)).await
    }

    pub async fn say(&self, saying_id: SayingId) -> Result<CommandResult, RequestError> {
        self.post(&say_path(saying_id)).await
    }

    pub async fn send_led_pixels(&self, pixels: &[Rgb]) -> Result<CommandResult, RequestError> {
        self.request(
            SENSEHAT_LEDS_PATH,
            Method::POST,
            Some(&LedPixelsRequest { pixels }),
        )
        .await
    }

    pub async fn status(&self) -> Result<RobotStatus, RequestError> {
        let url = self.config.endpoint(STATUS_PATH);
        match self.request::<()>(STATUS_PATH, Method::GET, None).await? {
            CommandResult::Json(value) => {
                serde_json::from_value(value).map_err(|err| RequestError::Decode {
                    url,
                    reason: err.to_string(),
                })
            }
            CommandResult::NoContent => Err(RequestError::Decode {
                url,
                reason: "empty or non-JSON status body".to_string(),
            }),
        }
    }

    /// Image URL for the camera; the feed is loaded directly, never through `request`.
    pub fn camera_feed_url(&self, feed: CameraFeed) -> String {
        self.config.endpoint(feed.path())
    }
}

#[async_trait]
impl StatusSource for RobotClient {
    async fn fetch_status(&self) -> Result<RobotStatus, RequestError> {
        self.status().await
    }
}

#[async_trait]
impl PixelSink for RobotClient {
    async fn send_pixels(&self, pixels: &[Rgb]) -> Result<CommandResult, RequestError> {
        self.send_led_pixels(pixels).await
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
