//! Config file and environment loading for `wa-send`.
//!
//! The file is TOML with a single `[whatsapp]` table. Any setting can be
//! overridden by an environment variable, which is how the access token is
//! usually supplied.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use whatsapp_core::config::{ClientConfig, DEFAULT_MEDIA_URL};

pub const ENV_API_URL: &str = "WHATSAPP_API_URL";
pub const ENV_ACCESS_TOKEN: &str = "WHATSAPP_ACCESS_TOKEN";
pub const ENV_UPLOAD_URL: &str = "WHATSAPP_UPLOAD_URL";
pub const ENV_MEDIA_URL: &str = "WHATSAPP_MEDIA_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing `{key}`: set it under [whatsapp] or export {env}")]
    Missing { key: &'static str, env: &'static str },
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    whatsapp: WhatsAppSection,
}

#[derive(Debug, Default, Deserialize)]
struct WhatsAppSection {
    api_url: Option<String>,
    upload_url: Option<String>,
    media_url: Option<String>,
    access_token: Option<String>,
    timeout_secs: Option<u64>,
}

/// Load `path` and apply environment overrides from the process environment.
///
/// A missing file is only an error when `required` is set (the user passed
/// `--config` explicitly); otherwise the environment alone must suffice.
pub fn load(path: &Path, required: bool) -> Result<ClientConfig, ConfigError> {
    load_with(path, required, |key| std::env::var(key).ok())
}

pub fn load_with<F>(path: &Path, required: bool, env: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<FileConfig>(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => FileConfig::default(),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let section = file.whatsapp;
    let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

    let api_url = lookup(ENV_API_URL)
        .or(section.api_url)
        .ok_or(ConfigError::Missing {
            key: "api_url",
            env: ENV_API_URL,
        })?;
    let access_token = lookup(ENV_ACCESS_TOKEN)
        .or(section.access_token)
        .ok_or(ConfigError::Missing {
            key: "access_token",
            env: ENV_ACCESS_TOKEN,
        })?;

    Ok(ClientConfig {
        api_url,
        upload_url: lookup(ENV_UPLOAD_URL).or(section.upload_url),
        media_url: lookup(ENV_MEDIA_URL)
            .or(section.media_url)
            .unwrap_or_else(|| DEFAULT_MEDIA_URL.to_string()),
        access_token,
        timeout_secs: section.timeout_secs,
    })
}
