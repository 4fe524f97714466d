use thiserror::Error;

/// Failure of a single robot API call.
#[derive(Debug, Error)]
pub enum RequestError {
    /// DNS, refused connection, reset and the like. There is no status code.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} {status_text} for {url}: {body}")]
    Http {
        status: u16,
        status_text: String,
        url: String,
        body: String,
    },
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl RequestError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            RequestError::Transport { .. } | RequestError::Decode { .. } => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            RequestError::Http { body, .. } => Some(body),
            RequestError::Transport { .. } | RequestError::Decode { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid robot api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("a send is already in flight")]
    Busy,
    #[error(transparent)]
    Request(#[from] RequestError),
}
