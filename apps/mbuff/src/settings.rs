use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use client_core::{poller::DEFAULT_POLL_INTERVAL, BaseUrlSources, PageOrigin};
use serde::Deserialize;
use tracing::debug;

const DEFAULT_PROTOCOL: &str = "http:";

/// Keys accepted in `mbuff.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub robot_api: Option<String>,
    pub host: Option<String>,
    pub protocol: Option<String>,
    pub poll_interval_secs: Option<u64>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub robot_api: Option<String>,
    pub host: Option<String>,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub sources: BaseUrlSources,
    pub poll_interval: Duration,
}

pub fn load_settings(path: &Path, overrides: &Overrides) -> anyhow::Result<Settings> {
    let file = read_file_settings(path)?;
    Ok(merge(BaseUrlSources::from_build_env(), file, overrides))
}

fn read_file_settings(path: &Path) -> anyhow::Result<FileSettings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(FileSettings::default());
        }
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("failed to read settings file '{}'", path.display())))
        }
    };

    toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

fn merge(mut sources: BaseUrlSources, file: FileSettings, overrides: &Overrides) -> Settings {
    sources.runtime_override = overrides.robot_api.clone().or(file.robot_api);

    let host = overrides.host.clone().or(file.host);
    let protocol = overrides.protocol.clone().or(file.protocol);
    sources.page = host.map(|hostname| {
        PageOrigin::new(
            protocol.unwrap_or_else(|| DEFAULT_PROTOCOL.to_string()),
            hostname,
        )
    });

    let poll_interval = file
        .poll_interval_secs
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL);

    Settings {
        sources,
        poll_interval,
    }
}
