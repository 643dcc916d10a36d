//! Client configuration injected at construction.
//!
//! The core never reads files or the environment; hosts deserialize or build
//! a `ClientConfig` and hand it to `CloudClient::from_config` or
//! `Dispatcher::from_config`.

use std::time::Duration;

use serde::Deserialize;

/// Graph API root used for media metadata lookups.
pub const DEFAULT_MEDIA_URL: &str = "https://graph.facebook.com/v17.0";

#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Messaging endpoint, e.g. `https://graph.facebook.com/v17.0/<phone-id>/messages`.
    pub api_url: String,
    /// Upload endpoint. Falls back to `api_url` when unset.
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default = "default_media_url")]
    pub media_url: String,
    pub access_token: String,
    /// Whole-request deadline applied by the transport.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_media_url() -> String {
    DEFAULT_MEDIA_URL.to_string()
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            upload_url: None,
            media_url: default_media_url(),
            access_token: access_token.into(),
            timeout_secs: None,
        }
    }

    pub fn effective_upload_url(&self) -> &str {
        self.upload_url.as_deref().unwrap_or(&self.api_url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .field("media_url", &self.media_url)
            .field("access_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
