pub mod client;
pub mod config;
pub mod error;
pub mod painter;
pub mod poller;

pub use client::{CommandResult, PixelSink, RobotClient, StatusSource};
pub use config::{BaseUrlSources, ClientConfig, PageOrigin};
pub use error::{ConfigError, RequestError, SendError};
pub use painter::{LedPainter, PointerEvent, SendOutcome};
pub use poller::StatusPoller;
