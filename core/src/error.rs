//! Error types for the WhatsApp Cloud API client.
//!
//! # Design
//! Rejections from the platform get one variant per endpoint family so
//! callers can tell a failed upload from a failed send without inspecting
//! strings. Each rejection keeps the raw status code and body for debugging.
//! Nothing here is fatal: every failure is a value handed back to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `CloudClient` parse methods and `Dispatcher` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A local media file could not be opened or read.
    #[error("failed to read media file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP exchange itself failed; no response was received.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The upload endpoint answered with a non-2xx status.
    #[error("upload rejected with HTTP {status}: {body}")]
    UploadRejected { status: u16, body: String },

    /// The messaging endpoint answered with anything but 200 or 202.
    /// `details` holds the body parsed as JSON when it was valid JSON.
    #[error("send rejected with HTTP {status}: {body}")]
    SendRejected {
        status: u16,
        body: String,
        details: Option<serde_json::Value>,
    },

    /// A media download answered with a non-2xx status.
    #[error("media download rejected with HTTP {status}: {body}")]
    DownloadRejected { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("failed to serialize request: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ApiError::Transport(Box::new(err))
    }

    /// HTTP status attached to a platform rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UploadRejected { status, .. }
            | ApiError::SendRejected { status, .. }
            | ApiError::DownloadRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
