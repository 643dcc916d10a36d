//! Payload models for the WhatsApp Cloud API.
//!
//! # Design
//! `OutboundMessage` pairs a recipient with exactly one `MessageContent`
//! variant, so a message can never be half text and half media. The wire
//! envelope (`messaging_product`, `recipient_type`, `to`, `type` plus one
//! variant key) is written by a hand-rolled `Serialize` impl because the
//! literal fields and the per-variant key do not map onto a derive.
//!
//! Field names and omission rules follow the platform contract: optional
//! fields are skipped when absent, never emitted as `null`.
//!
//! Response envelopes (`SendResult`, `MediaMetadata`, `MediaReference`) are
//! plain derives and ignore unknown fields.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

/// Literal sent as `messaging_product` on every request.
pub const MESSAGING_PRODUCT: &str = "whatsapp";

/// Literal sent as `recipient_type` on every non-media send.
pub const RECIPIENT_TYPE: &str = "individual";

/// Interactive buttons `kind` that degrades to a plain text send.
pub const KIND_TEXT: &str = "text";

/// Interactive buttons `kind` that asks the recipient to share a location.
pub const KIND_LOCATION_REQUEST: &str = "location_request_message";

// ---------------------------------------------------------------------------
// Outbound envelope
// ---------------------------------------------------------------------------

/// One message addressed to one recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub recipient: String,
    pub content: MessageContent,
}

impl OutboundMessage {
    pub fn new(recipient: impl Into<String>, content: MessageContent) -> Self {
        Self {
            recipient: recipient.into(),
            content,
        }
    }

    pub fn text(recipient: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(
            recipient,
            MessageContent::Text(TextBody { body: body.into() }),
        )
    }

    pub fn media(recipient: impl Into<String>, kind: MediaKind, media: MediaReference) -> Self {
        Self::new(recipient, kind.content(media))
    }

    pub fn location(
        recipient: impl Into<String>,
        latitude: f64,
        longitude: f64,
        name: Option<&str>,
        address: Option<&str>,
    ) -> Self {
        Self::new(
            recipient,
            MessageContent::Location(Location::new(latitude, longitude, name, address)),
        )
    }

    /// A list message whose rows all live in one untitled section.
    pub fn interactive_list(
        recipient: impl Into<String>,
        body_text: impl Into<String>,
        button_label: impl Into<String>,
        rows: Vec<ListRow>,
    ) -> Self {
        Self::new(
            recipient,
            MessageContent::InteractiveList(ListInteractive {
                body: BodyText { text: body_text.into() },
                action: ListAction {
                    button: button_label.into(),
                    sections: vec![ListSection { title: None, rows }],
                },
            }),
        )
    }

    /// A buttons message of the given `kind`.
    ///
    /// `kind == "text"` yields a plain text message with `body_text` and the
    /// buttons are ignored. `kind == "location_request_message"` yields a
    /// location request. Any other kind resolves `buttons` through
    /// `ButtonAction::from_buttons`.
    pub fn interactive_buttons(
        recipient: impl Into<String>,
        kind: &str,
        body_text: impl Into<String>,
        buttons: &[ButtonItem],
    ) -> Self {
        if kind == KIND_TEXT {
            return Self::text(recipient, body_text);
        }
        let action = if kind == KIND_LOCATION_REQUEST {
            ButtonAction::LocationRequest
        } else {
            ButtonAction::from_buttons(buttons)
        };
        Self::new(
            recipient,
            MessageContent::InteractiveButtons(ButtonsInteractive {
                interactive_type: kind.to_string(),
                body: BodyText { text: body_text.into() },
                action,
            }),
        )
    }

    /// Value of the `type` discriminator on the wire.
    pub fn kind(&self) -> &'static str {
        self.content.kind()
    }
}

/// The variant payload of an `OutboundMessage`.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(TextBody),
    Audio(MediaReference),
    Image(MediaReference),
    Location(Location),
    InteractiveList(ListInteractive),
    InteractiveButtons(ButtonsInteractive),
}

impl MessageContent {
    pub fn kind(&self) -> &'static str {
        match self {
            MessageContent::Text(_) => "text",
            MessageContent::Audio(_) => "audio",
            MessageContent::Image(_) => "image",
            MessageContent::Location(_) => "location",
            MessageContent::InteractiveList(_) | MessageContent::InteractiveButtons(_) => {
                "interactive"
            }
        }
    }

    /// Media-reference sends are the only ones without `recipient_type`.
    fn carries_recipient_type(&self) -> bool {
        !matches!(self, MessageContent::Audio(_) | MessageContent::Image(_))
    }
}

impl Serialize for OutboundMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("messaging_product", MESSAGING_PRODUCT)?;
        if self.content.carries_recipient_type() {
            map.serialize_entry("recipient_type", RECIPIENT_TYPE)?;
        }
        map.serialize_entry("to", &self.recipient)?;
        let kind = self.content.kind();
        map.serialize_entry("type", kind)?;
        match &self.content {
            MessageContent::Text(text) => map.serialize_entry(kind, text)?,
            MessageContent::Audio(media) | MessageContent::Image(media) => {
                map.serialize_entry(kind, media)?
            }
            MessageContent::Location(location) => map.serialize_entry(kind, location)?,
            MessageContent::InteractiveList(list) => map.serialize_entry(kind, list)?,
            MessageContent::InteractiveButtons(buttons) => map.serialize_entry(kind, buttons)?,
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Text, media, location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBody {
    pub body: String,
}

/// Opaque handle to media previously uploaded to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    pub id: String,
}

impl MediaReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Media message kinds sent by reference after an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
}

impl MediaKind {
    /// MIME type declared when uploading files of this kind.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio/ogg",
            MediaKind::Image => "image/jpeg",
        }
    }

    pub fn content(self, media: MediaReference) -> MessageContent {
        match self {
            MediaKind::Audio => MessageContent::Audio(media),
            MediaKind::Image => MessageContent::Image(media),
        }
    }
}

/// Coordinates must be finite; NaN or infinity fails serialization instead
/// of being written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    #[serde(serialize_with = "finite")]
    pub latitude: f64,
    #[serde(serialize_with = "finite")]
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    /// Empty `name` or `address` strings are treated as absent.
    pub fn new(latitude: f64, longitude: f64, name: Option<&str>, address: Option<&str>) -> Self {
        Self {
            latitude,
            longitude,
            name: non_empty(name),
            address: non_empty(address),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(serde::ser::Error::custom(format!(
            "coordinate must be finite, got {value}"
        )));
    }
    serializer.serialize_f64(*value)
}

// ---------------------------------------------------------------------------
// Interactive: list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyText {
    pub text: String,
}

/// A list message: one button that opens a menu of sectioned rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListInteractive {
    pub body: BodyText,
    pub action: ListAction,
}

impl Serialize for ListInteractive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ListInteractive", 3)?;
        state.serialize_field("type", "list")?;
        state.serialize_field("body", &self.body)?;
        state.serialize_field("action", &self.action)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListAction {
    pub button: String,
    pub sections: Vec<ListSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub rows: Vec<ListRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ListRow {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Interactive: buttons
// ---------------------------------------------------------------------------

/// A buttons message. `interactive_type` is the caller's kind, sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonsInteractive {
    #[serde(rename = "type")]
    pub interactive_type: String,
    pub body: BodyText,
    pub action: ButtonAction,
}

/// Caller-side description of one button before the action is resolved.
///
/// A button with a non-empty `link` becomes a call-to-action; any other
/// button becomes a reply button of type `reply_type` (default `reply`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ButtonItem {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "type")]
    pub reply_type: Option<String>,
}

impl ButtonItem {
    pub fn reply(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: Some(url.into()),
            ..Self::default()
        }
    }

    fn url(&self) -> Option<&str> {
        self.link.as_deref().filter(|l| !l.is_empty())
    }
}

/// The single action attached to a buttons message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// `{"name":"cta_url","parameters":{...}}`
    CallToAction(CtaParameters),
    /// `{"buttons":[...]}`, or `{}` when the list is empty.
    Reply(Vec<ReplyButton>),
    /// `{"name":"send_location"}`
    LocationRequest,
}

impl ButtonAction {
    /// Resolve a button list into one action.
    ///
    /// Link-bearing buttons never become reply buttons. If any button has a
    /// link the action is a call-to-action built from the last such button,
    /// and collected reply buttons are dropped.
    pub fn from_buttons(buttons: &[ButtonItem]) -> Self {
        let mut call_to_action = None;
        let mut replies = Vec::new();
        for button in buttons {
            match button.url() {
                Some(url) => {
                    call_to_action = Some(CtaParameters {
                        display_text: button.text.clone(),
                        url: url.to_string(),
                    });
                }
                None => replies.push(ReplyButton::from(button)),
            }
        }
        match call_to_action {
            Some(parameters) => ButtonAction::CallToAction(parameters),
            None => ButtonAction::Reply(replies),
        }
    }
}

impl Serialize for ButtonAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            ButtonAction::CallToAction(parameters) => {
                map.serialize_entry("name", "cta_url")?;
                map.serialize_entry("parameters", parameters)?;
            }
            ButtonAction::Reply(buttons) => {
                if !buttons.is_empty() {
                    map.serialize_entry("buttons", buttons)?;
                }
            }
            ButtonAction::LocationRequest => {
                map.serialize_entry("name", "send_location")?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CtaParameters {
    pub display_text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyButton {
    #[serde(rename = "type")]
    pub kind: String,
    pub reply: ButtonReply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonReply {
    pub id: String,
    pub title: String,
}

impl From<&ButtonItem> for ReplyButton {
    fn from(item: &ButtonItem) -> Self {
        Self {
            kind: item
                .reply_type
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "reply".to_string()),
            reply: ButtonReply {
                id: item.id.clone(),
                title: item.text.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The platform's acknowledgment of an accepted send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    pub messaging_product: String,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub messages: Vec<MessageId>,
}

impl SendResult {
    pub fn message_ids(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub input: String,
    #[serde(rename = "wa_id")]
    pub resolved_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId {
    pub id: String,
}

/// Metadata returned when resolving a media ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub id: String,
    pub mime_type: String,
    #[serde(rename = "sha256")]
    pub checksum: String,
    #[serde(rename = "file_size")]
    pub file_size_bytes: u64,
    #[serde(rename = "url")]
    pub download_url: String,
}

/// Receipt of an upload-then-send: the uploaded media and the send result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSend {
    pub media: MediaReference,
    pub result: SendResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn to_json(message: &OutboundMessage) -> Value {
        serde_json::to_value(message).unwrap()
    }

    #[test]
    fn text_payload_has_only_text_fields() {
        let json = to_json(&OutboundMessage::text("15550001111", "hello"));
        assert_eq!(
            json,
            json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": "15550001111",
                "type": "text",
                "text": {"body": "hello"}
            })
        );
        for key in ["interactive", "audio", "image", "location"] {
            assert!(json.get(key).is_none(), "unexpected key {key}");
        }
    }

    #[test]
    fn media_payload_omits_recipient_type() {
        let message = OutboundMessage::new("1555", MediaKind::Audio.content(MediaReference::new("m-1")));
        let json = to_json(&message);
        assert_eq!(json["type"], "audio");
        assert_eq!(json["audio"]["id"], "m-1");
        assert!(json.get("recipient_type").is_none());

        let message = OutboundMessage::new("1555", MediaKind::Image.content(MediaReference::new("m-2")));
        let json = to_json(&message);
        assert_eq!(json["image"], json!({"id": "m-2"}));
        assert!(json.get("recipient_type").is_none());
    }

    #[test]
    fn location_skips_empty_name_and_address() {
        let location = Location::new(1.5, -2.25, Some(""), None);
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json, json!({"latitude": 1.5, "longitude": -2.25}));

        let location = Location::new(1.5, -2.25, Some("Office"), Some("Main St 1"));
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["name"], "Office");
        assert_eq!(json["address"], "Main St 1");
    }

    #[test]
    fn non_finite_coordinates_fail_to_serialize() {
        for (lat, lon) in [(f64::NAN, 1.0), (1.0, f64::INFINITY), (f64::NEG_INFINITY, 0.0)] {
            let message = OutboundMessage::location("1555", lat, lon, None, None);
            assert!(serde_json::to_value(&message).is_err(), "{lat}, {lon}");
        }
    }

    #[test]
    fn list_interactive_serializes_untitled_section() {
        let list = ListInteractive {
            body: BodyText { text: "Pick one".to_string() },
            action: ListAction {
                button: "Menu".to_string(),
                sections: vec![ListSection {
                    title: None,
                    rows: vec![
                        ListRow::new("a", "Alpha"),
                        ListRow::new("b", "Beta").with_description("second"),
                    ],
                }],
            },
        };
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "list",
                "body": {"text": "Pick one"},
                "action": {
                    "button": "Menu",
                    "sections": [{
                        "rows": [
                            {"id": "a", "title": "Alpha"},
                            {"id": "b", "title": "Beta", "description": "second"}
                        ]
                    }]
                }
            })
        );
    }

    #[test]
    fn reply_buttons_default_to_reply_type() {
        let action = ButtonAction::from_buttons(&[
            ButtonItem::reply("yes", "Yes"),
            ButtonItem {
                reply_type: Some("reply".to_string()),
                ..ButtonItem::reply("no", "No")
            },
        ]);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json,
            json!({"buttons": [
                {"type": "reply", "reply": {"id": "yes", "title": "Yes"}},
                {"type": "reply", "reply": {"id": "no", "title": "No"}}
            ]})
        );
    }

    #[test]
    fn last_link_button_wins() {
        let action = ButtonAction::from_buttons(&[
            ButtonItem::link("First", "https://one.example"),
            ButtonItem::reply("r", "Reply"),
            ButtonItem::link("Second", "https://two.example"),
        ]);
        assert_eq!(
            action,
            ButtonAction::CallToAction(CtaParameters {
                display_text: "Second".to_string(),
                url: "https://two.example".to_string(),
            })
        );
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["name"], "cta_url");
        assert_eq!(json["parameters"]["url"], "https://two.example");
        assert!(json.get("buttons").is_none());
    }

    #[test]
    fn empty_link_counts_as_reply() {
        let item = ButtonItem {
            link: Some(String::new()),
            ..ButtonItem::reply("x", "X")
        };
        let action = ButtonAction::from_buttons(&[item]);
        assert!(matches!(action, ButtonAction::Reply(ref b) if b.len() == 1));
    }

    #[test]
    fn empty_reply_action_serializes_as_empty_object() {
        let json = serde_json::to_value(ButtonAction::Reply(Vec::new())).unwrap();
        assert_eq!(json, json!({}));
        let json = serde_json::to_value(ButtonAction::LocationRequest).unwrap();
        assert_eq!(json, json!({"name": "send_location"}));
    }

    #[test]
    fn text_kind_buttons_message_is_plain_text() {
        let message = OutboundMessage::interactive_buttons(
            "1555",
            KIND_TEXT,
            "just text",
            &[ButtonItem::reply("a", "A")],
        );
        assert_eq!(message, OutboundMessage::text("1555", "just text"));
    }

    #[test]
    fn location_request_ignores_buttons() {
        let message = OutboundMessage::interactive_buttons(
            "1555",
            KIND_LOCATION_REQUEST,
            "Where are you?",
            &[ButtonItem::link("Site", "https://example.com")],
        );
        let json = to_json(&message);
        assert_eq!(json["recipient_type"], "individual");
        assert_eq!(
            json["interactive"],
            json!({
                "type": "location_request_message",
                "body": {"text": "Where are you?"},
                "action": {"name": "send_location"}
            })
        );
    }

    #[test]
    fn interactive_list_wraps_rows_in_one_section() {
        let message = OutboundMessage::interactive_list(
            "1555",
            "Choose",
            "Open",
            vec![ListRow::new("1", "One")],
        );
        let json = to_json(&message);
        assert_eq!(json["type"], "interactive");
        assert_eq!(json["interactive"]["action"]["sections"].as_array().unwrap().len(), 1);
        assert!(json["interactive"]["action"]["sections"][0].get("title").is_none());
    }

    #[test]
    fn send_result_tolerates_missing_lists() {
        let result: SendResult = serde_json::from_str(r#"{"messaging_product":"whatsapp"}"#).unwrap();
        assert!(result.contacts.is_empty());
        assert_eq!(result.message_ids().count(), 0);
    }

    #[test]
    fn media_metadata_maps_wire_names() {
        let meta: MediaMetadata = serde_json::from_str(
            r#"{"id":"123","mime_type":"image/jpeg","sha256":"abc","file_size":100,"url":"https://x/y","messaging_product":"whatsapp"}"#,
        )
        .unwrap();
        assert_eq!(meta.checksum, "abc");
        assert_eq!(meta.file_size_bytes, 100);
        assert_eq!(meta.download_url, "https://x/y");
    }
}
