//! I/O-performing façade over `CloudClient`.
//!
//! # Design
//! `Dispatcher` pairs the stateless `CloudClient` with an owned `Transport`.
//! Every operation is build → execute → parse, run to completion on the
//! calling thread. Nothing is retried: a failed call is reported once and the
//! caller decides whether sending again is safe.
//!
//! The dispatcher holds no mutable state, so a `Dispatcher<T>` is `Sync`
//! whenever `T` is and can be shared across threads behind an `Arc`.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::client::CloudClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::Transport;
use crate::transport::UreqTransport;
use crate::types::{
    ButtonItem, ListRow, MediaKind, MediaMetadata, MediaReference, MediaSend, OutboundMessage,
    SendResult,
};
use crate::upload::MediaFile;

#[derive(Debug, Clone)]
pub struct Dispatcher<T = UreqTransport> {
    client: CloudClient,
    transport: T,
}

impl Dispatcher<UreqTransport> {
    /// Dispatcher over a fresh ureq agent honoring `config.timeout_secs`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            CloudClient::from_config(config),
            UreqTransport::with_timeout(config.timeout()),
        )
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(client: CloudClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &CloudClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    pub fn send(&self, message: &OutboundMessage) -> Result<SendResult, ApiError> {
        debug!(to = %message.recipient, kind = message.kind(), "sending message");
        let request = self.client.build_send(message)?;
        let response = self.transport.execute(request)?;
        match self.client.parse_send(response) {
            Ok(result) => {
                info!(
                    to = %message.recipient,
                    kind = message.kind(),
                    message_id = result.message_ids().next().unwrap_or_default(),
                    "message accepted"
                );
                Ok(result)
            }
            Err(err) => {
                warn!(to = %message.recipient, kind = message.kind(), error = %err, "message not accepted");
                Err(err)
            }
        }
    }

    pub fn send_text(&self, recipient: &str, body: &str) -> Result<SendResult, ApiError> {
        self.send(&OutboundMessage::text(recipient, body))
    }

    /// Send already-uploaded media by reference.
    pub fn send_media(
        &self,
        recipient: &str,
        kind: MediaKind,
        media: &MediaReference,
    ) -> Result<SendResult, ApiError> {
        self.send(&OutboundMessage::media(recipient, kind, media.clone()))
    }

    /// Upload `file_path` as `audio/ogg`, then send it.
    pub fn send_audio(
        &self,
        recipient: &str,
        file_path: impl AsRef<Path>,
    ) -> Result<MediaSend, ApiError> {
        self.upload_and_send(recipient, MediaKind::Audio, file_path.as_ref())
    }

    /// Upload `file_path` as `image/jpeg`, then send it.
    pub fn send_image(
        &self,
        recipient: &str,
        file_path: impl AsRef<Path>,
    ) -> Result<MediaSend, ApiError> {
        self.upload_and_send(recipient, MediaKind::Image, file_path.as_ref())
    }

    fn upload_and_send(
        &self,
        recipient: &str,
        kind: MediaKind,
        file_path: &Path,
    ) -> Result<MediaSend, ApiError> {
        let media = self.upload_media(file_path, kind.mime_type())?;
        let result = self.send_media(recipient, kind, &media)?;
        Ok(MediaSend { media, result })
    }

    pub fn send_location(
        &self,
        recipient: &str,
        latitude: f64,
        longitude: f64,
        name: Option<&str>,
        address: Option<&str>,
    ) -> Result<SendResult, ApiError> {
        self.send(&OutboundMessage::location(
            recipient, latitude, longitude, name, address,
        ))
    }

    pub fn send_interactive_list(
        &self,
        recipient: &str,
        body_text: &str,
        button_label: &str,
        rows: Vec<ListRow>,
    ) -> Result<SendResult, ApiError> {
        self.send(&OutboundMessage::interactive_list(
            recipient,
            body_text,
            button_label,
            rows,
        ))
    }

    /// See `OutboundMessage::interactive_buttons` for how `kind` and the
    /// buttons shape the payload.
    pub fn send_interactive_buttons(
        &self,
        recipient: &str,
        kind: &str,
        body_text: &str,
        buttons: &[ButtonItem],
    ) -> Result<SendResult, ApiError> {
        self.send(&OutboundMessage::interactive_buttons(
            recipient, kind, body_text, buttons,
        ))
    }

    // -----------------------------------------------------------------------
    // Media
    // -----------------------------------------------------------------------

    pub fn upload_media(
        &self,
        file_path: impl AsRef<Path>,
        mime_type: &str,
    ) -> Result<MediaReference, ApiError> {
        let file_path = file_path.as_ref();
        let file = MediaFile::read(file_path, mime_type)?;
        debug!(
            file = %file_path.display(),
            mime_type,
            size = file.data.len(),
            "uploading media"
        );
        let response = self.transport.execute(self.client.build_upload(file))?;
        let media = self.client.parse_upload(response).inspect_err(|err| {
            warn!(file = %file_path.display(), error = %err, "upload failed");
        })?;
        info!(media_id = %media.id, "media uploaded");
        Ok(media)
    }

    pub fn resolve_media_url(&self, media_id: &str) -> Result<MediaMetadata, ApiError> {
        debug!(media_id, "resolving media url");
        let response = self
            .transport
            .execute(self.client.build_media_metadata(media_id))?;
        self.client.parse_media_metadata(response)
    }

    /// Fetch `url` into memory. The whole body is buffered.
    pub fn download_media(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        debug!(url, "downloading media");
        let response = self.transport.execute(self.client.build_download(url))?;
        let bytes = self.client.parse_download(response)?;
        debug!(size = bytes.len(), "media downloaded");
        Ok(bytes)
    }

    /// Resolve `media_id`, then download it.
    pub fn fetch_media(&self, media_id: &str) -> Result<(MediaMetadata, Vec<u8>), ApiError> {
        let metadata = self.resolve_media_url(media_id)?;
        let bytes = self.download_media(&metadata.download_url)?;
        Ok((metadata, bytes))
    }
}
