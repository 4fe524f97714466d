use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{DanceId, Rgb, SayingId, SongId};

pub const STATUS_PATH: &str = "/api/status";
pub const SENSEHAT_LEDS_PATH: &str = "/api/sensehat/leds";
pub const CAMERA_FEED_PATH: &str = "/api/camera/feed";
pub const CAMERA_RECHUNK_PATH: &str = "/rechunk";

/// Connection snapshot reported by `GET /api/status`.
///
/// Unknown fields (the bridge adds `host`, `port` and `error`) are kept in
/// `extra` so the value can be handed to the UI exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotStatus {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<u8>,
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RobotStatus {
    pub fn connecting() -> Self {
        Self::placeholder("Connecting...")
    }

    pub fn disconnected() -> Self {
        Self::placeholder("Disconnected")
    }

    fn placeholder(status: &str) -> Self {
        Self {
            connected: false,
            battery: None,
            status: status.to_string(),
            extra: Map::new(),
        }
    }
}

impl Default for RobotStatus {
    fn default() -> Self {
        Self::connecting()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveCommand {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    SpeedUp,
    SpeedDown,
}

impl MoveCommand {
    pub const ALL: [MoveCommand; 7] = [
        MoveCommand::Forward,
        MoveCommand::Backward,
        MoveCommand::Left,
        MoveCommand::Right,
        MoveCommand::Stop,
        MoveCommand::SpeedUp,
        MoveCommand::SpeedDown,
    ];

    pub fn segment(self) -> &'static str {
        match self {
            MoveCommand::Forward => "forward",
            MoveCommand::Backward => "backward",
            MoveCommand::Left => "left",
            MoveCommand::Right => "right",
            MoveCommand::Stop => "stop",
            MoveCommand::SpeedUp => "speedup",
            MoveCommand::SpeedDown => "speeddown",
        }
    }

    pub fn path(self) -> String {
        format!("/api/move/{}", self.segment())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateDirection {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl RotateDirection {
    pub const ALL: [RotateDirection; 4] = [
        RotateDirection::TopLeft,
        RotateDirection::TopRight,
        RotateDirection::BottomLeft,
        RotateDirection::BottomRight,
    ];

    pub fn segment(self) -> &'static str {
        match self {
            RotateDirection::TopLeft => "topleft",
            RotateDirection::TopRight => "topright",
            RotateDirection::BottomLeft => "bottomleft",
            RotateDirection::BottomRight => "bottomright",
        }
    }

    pub fn path(self) -> String {
        format!("/api/rotate/{}", self.segment())
    }
}

pub fn dance_path(dance_id: DanceId) -> String {
    format!("/api/dance/{dance_id}")
}

pub fn song_path(song_id: SongId) -> String {
    format!("/api/song/{song_id}")
}

pub fn say_path(saying_id: SayingId) -> String {
    format!("/api/say/{saying_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFeed {
    #[default]
    Live,
    Rechunk,
}

impl CameraFeed {
    pub fn path(self) -> &'static str {
        match self {
            CameraFeed::Live => CAMERA_FEED_PATH,
            CameraFeed::Rechunk => CAMERA_RECHUNK_PATH,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LedPixelsRequest<'a> {
    pub pixels: &'a [Rgb],
}

/// Acknowledgement body the robot bridge answers commands with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
