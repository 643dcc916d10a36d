//! Synchronous client core for the WhatsApp Cloud API.
//!
//! # Overview
//! Builds send, upload and media requests as plain data, executes them
//! through an injected `Transport`, and decodes the platform's responses into
//! typed results or `ApiError` values.
//!
//! # Design
//! - `CloudClient` is stateless: endpoint URLs plus the access token. Each
//!   endpoint is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit.
//! - `Dispatcher` owns a `CloudClient` and a `Transport` and runs
//!   build → execute → parse for every operation. `UreqTransport` is the
//!   default transport.
//! - `OutboundMessage` is a sum type over the message kinds; its wire form
//!   reproduces the platform contract exactly.
//! - No retries, no global state, no logging subscriber: hosts decide those.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod multipart;
pub mod transport;
pub mod types;
pub mod upload;

pub use client::CloudClient;
pub use config::ClientConfig;
pub use dispatcher::Dispatcher;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use transport::UreqTransport;
pub use types::{
    ButtonAction, ButtonItem, ListRow, MediaKind, MediaMetadata, MediaReference, MediaSend,
    MessageContent, OutboundMessage, SendResult,
};
pub use upload::MediaFile;
