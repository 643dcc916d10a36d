//! Stateless HTTP request builder and response parser for the Cloud API.
//!
//! # Design
//! `CloudClient` holds only endpoint URLs and the access token and carries no
//! mutable state between calls. Each endpoint is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. Executing the round-trip is left to a `Transport`, which
//! keeps this layer deterministic and free of I/O.
//!
//! Upload requests are built in `upload.rs`, which also owns local file
//! access.

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{MediaMetadata, OutboundMessage, SendResult};

/// Synchronous, stateless request builder for the WhatsApp Cloud API.
#[derive(Clone)]
pub struct CloudClient {
    api_url: String,
    upload_url: String,
    media_url: String,
    access_token: String,
}

impl CloudClient {
    /// Client posting sends and uploads to `api_url`, with media lookups
    /// against the default Graph API root.
    pub fn new(api_url: &str, access_token: &str) -> Self {
        Self::from_config(&ClientConfig::new(api_url, access_token))
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_url: config.effective_upload_url().trim_end_matches('/').to_string(),
            media_url: config.media_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    pub(crate) fn authorization(&self) -> (String, String) {
        (
            "authorization".to_string(),
            format!("Bearer {}", self.access_token),
        )
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    pub fn build_send(&self, message: &OutboundMessage) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_vec(message).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.api_url.clone(),
            headers: vec![
                self.authorization(),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        })
    }

    /// Accepts 200 and 202 only. Any other status becomes `SendRejected`,
    /// carrying the parsed body as `details` when it is valid JSON.
    pub fn parse_send(&self, response: HttpResponse) -> Result<SendResult, ApiError> {
        if !matches!(response.status, 200 | 202) {
            return Err(ApiError::SendRejected {
                status: response.status,
                details: serde_json::from_slice(&response.body).ok(),
                body: response.text(),
            });
        }
        decode(&response)
    }

    // -----------------------------------------------------------------------
    // Media resolution
    // -----------------------------------------------------------------------

    pub fn build_media_metadata(&self, media_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/{media_id}", self.media_url),
            headers: vec![self.authorization()],
            body: None,
        }
    }

    /// Decodes the metadata envelope. The status code is not inspected; an
    /// error body simply fails to decode.
    pub fn parse_media_metadata(&self, response: HttpResponse) -> Result<MediaMetadata, ApiError> {
        decode(&response)
    }

    pub fn build_download(&self, url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: vec![self.authorization()],
            body: None,
        }
    }

    pub fn parse_download(&self, response: HttpResponse) -> Result<Vec<u8>, ApiError> {
        if !(200..300).contains(&response.status) {
            return Err(ApiError::DownloadRejected {
                status: response.status,
                body: response.text(),
            });
        }
        Ok(response.body)
    }
}

impl std::fmt::Debug for CloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClient")
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .field("media_url", &self.media_url)
            .finish_non_exhaustive()
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ButtonItem, ListRow};

    fn client() -> CloudClient {
        CloudClient::new("http://localhost:3000/messages", "test-token")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn body_json(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(req.body.as_deref().unwrap()).unwrap()
    }

    const ACCEPTED: &str = r#"{"messaging_product":"whatsapp","contacts":[{"input":"15550001111","wa_id":"15550001111"}],"messages":[{"id":"wamid.1"}]}"#;

    #[test]
    fn build_send_text_produces_correct_request() {
        let req = client()
            .build_send(&OutboundMessage::text("15550001111", "hi"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/messages");
        assert_eq!(
            req.headers,
            vec![
                ("authorization".to_string(), "Bearer test-token".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ]
        );
        let body = body_json(&req);
        assert_eq!(body["text"]["body"], "hi");
        assert_eq!(body["recipient_type"], "individual");
    }

    #[test]
    fn build_send_buttons_with_cta() {
        let message = OutboundMessage::interactive_buttons(
            "1555",
            "cta_url",
            "Visit us",
            &[ButtonItem::link("Open", "https://example.com")],
        );
        let body = body_json(&client().build_send(&message).unwrap());
        assert_eq!(body["interactive"]["type"], "cta_url");
        assert_eq!(body["interactive"]["action"]["name"], "cta_url");
        assert_eq!(
            body["interactive"]["action"]["parameters"]["display_text"],
            "Open"
        );
    }

    #[test]
    fn build_send_list() {
        let message = OutboundMessage::interactive_list(
            "1555",
            "Choose a plan",
            "Plans",
            vec![ListRow::new("basic", "Basic").with_description("Free")],
        );
        let body = body_json(&client().build_send(&message).unwrap());
        assert_eq!(body["interactive"]["type"], "list");
        assert_eq!(body["interactive"]["action"]["button"], "Plans");
        assert_eq!(
            body["interactive"]["action"]["sections"][0]["rows"][0]["description"],
            "Free"
        );
    }

    #[test]
    fn build_send_rejects_nan_latitude() {
        let message = OutboundMessage::location("1555", f64::NAN, 1.0, None, None);
        let err = client().build_send(&message).unwrap_err();
        match err {
            ApiError::Serialization(msg) => assert!(msg.contains("finite")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_send_accepts_200_and_202() {
        let result = client().parse_send(response(200, ACCEPTED)).unwrap();
        assert_eq!(result.messaging_product, "whatsapp");
        assert_eq!(result.contacts[0].resolved_id, "15550001111");
        assert_eq!(result.message_ids().collect::<Vec<_>>(), vec!["wamid.1"]);

        assert!(client().parse_send(response(202, ACCEPTED)).is_ok());
    }

    #[test]
    fn parse_send_rejects_400_with_details() {
        let err = client()
            .parse_send(response(400, r#"{"error":"invalid recipient"}"#))
            .unwrap_err();
        match err {
            ApiError::SendRejected { status, body, details } => {
                assert_eq!(status, 400);
                assert_eq!(body, r#"{"error":"invalid recipient"}"#);
                assert_eq!(details.unwrap()["error"], "invalid recipient");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_send_rejects_redirects_and_other_2xx() {
        let err = client().parse_send(response(301, "moved")).unwrap_err();
        assert!(matches!(err, ApiError::SendRejected { status: 301, details: None, .. }));

        let err = client().parse_send(response(201, ACCEPTED)).unwrap_err();
        assert!(matches!(err, ApiError::SendRejected { status: 201, .. }));
    }

    #[test]
    fn parse_send_bad_json() {
        let err = client().parse_send(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn build_media_metadata_uses_media_root() {
        let req = client().build_media_metadata("123");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://graph.facebook.com/v17.0/123");
        assert_eq!(req.header("authorization"), Some("Bearer test-token"));
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_media_metadata_populates_all_fields() {
        let meta = client()
            .parse_media_metadata(response(
                200,
                r#"{"id":"123","mime_type":"image/jpeg","sha256":"abc","file_size":100,"url":"https://x/y"}"#,
            ))
            .unwrap();
        assert_eq!(meta.id, "123");
        assert_eq!(meta.mime_type, "image/jpeg");
        assert_eq!(meta.checksum, "abc");
        assert_eq!(meta.file_size_bytes, 100);
        assert_eq!(meta.download_url, "https://x/y");
    }

    #[test]
    fn parse_media_metadata_bad_json() {
        let err = client()
            .parse_media_metadata(response(404, r#"{"error":{"message":"gone"}}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn download_round_trip() {
        let req = client().build_download("https://lookaside.example/file?x=1");
        assert_eq!(req.url, "https://lookaside.example/file?x=1");
        assert_eq!(req.header("authorization"), Some("Bearer test-token"));

        let bytes = client().parse_download(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: vec![0, 1, 2, 255],
        });
        assert_eq!(bytes.unwrap(), vec![0, 1, 2, 255]);

        let err = client().parse_download(response(403, "denied")).unwrap_err();
        assert!(matches!(err, ApiError::DownloadRejected { status: 403, .. }));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let mut config = ClientConfig::new("http://localhost:3000/messages/", "t");
        config.media_url = "http://localhost:3000/media/".to_string();
        let client = CloudClient::from_config(&config);
        assert_eq!(client.api_url(), "http://localhost:3000/messages");
        assert_eq!(client.upload_url(), "http://localhost:3000/messages");
        assert_eq!(client.build_media_metadata("9").url, "http://localhost:3000/media/9");
    }

    #[test]
    fn debug_hides_token() {
        assert!(!format!("{:?}", client()).contains("test-token"));
    }
}
