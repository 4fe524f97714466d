use tracing::debug;
use url::Url;

use crate::error::ConfigError;

/// Base URL baked in at compile time, the highest priority source.
pub const BUILD_TIME_BASE_URL: Option<&str> = option_env!("MBUFF_ROBOT_API_URL");
pub const INFERRED_PORT: u16 = 5001;
const FALLBACK_BASE_URL: &str = "http://localhost:5001";

/// Where the dashboard itself is being served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrigin {
    /// Scheme in location style, e.g. `http:`. A missing colon is tolerated.
    pub protocol: String,
    pub hostname: String,
}

impl PageOrigin {
    pub fn new(protocol: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            hostname: hostname.into(),
        }
    }

    fn inferred_base_url(&self) -> String {
        let protocol = self.protocol.trim();
        let colon = if protocol.ends_with(':') { "" } else { ":" };
        format!(
            "{protocol}{colon}//{}:{INFERRED_PORT}",
            self.hostname.trim()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseUrlSources {
    pub build_time: Option<String>,
    pub runtime_override: Option<String>,
    pub page: Option<PageOrigin>,
}

impl BaseUrlSources {
    pub fn from_build_env() -> Self {
        Self {
            build_time: BUILD_TIME_BASE_URL.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_runtime_override(mut self, url: impl Into<String>) -> Self {
        self.runtime_override = Some(url.into());
        self
    }

    pub fn with_page(mut self, page: PageOrigin) -> Self {
        self.page = Some(page);
        self
    }
}

/// Immutable client configuration, resolved once before the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    /// Picks the first non-empty of build-time value, runtime override and
    /// the address inferred from the page origin.
    pub fn resolve(sources: &BaseUrlSources) -> Result<Self, ConfigError> {
        let explicit = [&sources.build_time, &sources.runtime_override]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .find(|value| !value.is_empty());

        let raw = match explicit {
            Some(value) => value.to_string(),
            None => sources
                .page
                .as_ref()
                .map(PageOrigin::inferred_base_url)
                .unwrap_or_else(|| FALLBACK_BASE_URL.to_string()),
        };

        let config = Self::new(raw)?;
        debug!(base_url = %config.base_url, "resolved robot api base url");
        Ok(config)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = base_url.into();
        let base_url = raw.trim().trim_end_matches('/').to_string();
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: raw.clone(),
            reason,
        };

        let parsed = Url::parse(&base_url).map_err(|err| invalid(err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }
        match parsed.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(invalid("missing host".to_string())),
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
