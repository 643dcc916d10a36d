//! In-memory stand-in for the WhatsApp Cloud API.
//!
//! Emulates the messaging, media upload, media metadata and media download
//! endpoints closely enough for the client's integration tests. Every send it
//! accepts is recorded and can be read back from `/__inbox`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
pub struct StoredMedia {
    pub id: String,
    pub mime_type: String,
    pub file_name: Option<String>,
    pub sha256: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub messages: Vec<Value>,
    pub media: HashMap<String, StoredMedia>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub access_token: Arc<str>,
    /// Public root of this server, used to build media download URLs.
    pub base_url: Arc<str>,
    pub db: Db,
}

impl AppState {
    pub fn new(access_token: &str, base_url: &str) -> Self {
        Self {
            access_token: Arc::from(access_token),
            base_url: Arc::from(base_url.trim_end_matches('/')),
            db: Db::default(),
        }
    }
}

type Rejection = (StatusCode, Json<Value>);

fn reject(status: StatusCode, message: &str) -> Rejection {
    (status, Json(json!({ "error": message })))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/messages", post(send_message))
        .route("/media", post(upload_media))
        .route("/media/{id}", get(media_metadata))
        .route("/download/{id}", get(download_media))
        .route("/__inbox", get(inbox))
        .with_state(state)
}

/// Serve on `listener` with a fresh store, advertising the listener's own
/// address in download URLs.
pub async fn run(listener: TcpListener, access_token: &str) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    let state = AppState::new(access_token, &format!("http://{addr}"));
    serve(listener, state).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Rejection> {
    let expected = format!("Bearer {}", state.access_token);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(reject(StatusCode::UNAUTHORIZED, "invalid access token")),
    }
}

fn is_phone_number(to: &str) -> bool {
    let digits = to.strip_prefix('+').unwrap_or(to);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, Rejection> {
    authorize(&state, &headers)?;
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "invalid json"))?;

    if payload["messaging_product"] != "whatsapp" {
        return Err(reject(StatusCode::BAD_REQUEST, "invalid messaging_product"));
    }
    let to = payload["to"].as_str().unwrap_or_default().to_string();
    if !is_phone_number(&to) {
        return Err(reject(StatusCode::BAD_REQUEST, "invalid recipient"));
    }
    let kind = payload["type"].as_str().unwrap_or_default().to_string();
    if kind.is_empty() || payload.get(&kind).is_none() {
        return Err(reject(StatusCode::BAD_REQUEST, "missing message payload"));
    }

    let message_id = format!("wamid.{}", Uuid::new_v4().simple());
    tracing::info!(%to, %kind, %message_id, "accepted message");
    state.db.write().await.messages.push(payload);

    Ok(Json(json!({
        "messaging_product": "whatsapp",
        "contacts": [{ "input": to, "wa_id": to.trim_start_matches('+') }],
        "messages": [{ "id": message_id }],
    })))
}

async fn upload_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, Rejection> {
    authorize(&state, &headers)?;

    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut mime_type = None;
    let mut product = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| reject(StatusCode::BAD_REQUEST, &e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| reject(StatusCode::BAD_REQUEST, &e.body_text()))?;
                file = Some((file_name, data.to_vec()));
            }
            "type" => {
                mime_type = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| reject(StatusCode::BAD_REQUEST, &e.body_text()))?,
                );
            }
            "messaging_product" => {
                product = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| reject(StatusCode::BAD_REQUEST, &e.body_text()))?,
                );
            }
            _ => {}
        }
    }

    if product.as_deref() != Some("whatsapp") {
        return Err(reject(StatusCode::BAD_REQUEST, "invalid messaging_product"));
    }
    let mime_type = mime_type.ok_or_else(|| reject(StatusCode::BAD_REQUEST, "missing type"))?;
    let (file_name, data) = file.ok_or_else(|| reject(StatusCode::BAD_REQUEST, "missing file"))?;

    let media = StoredMedia {
        id: Uuid::new_v4().simple().to_string(),
        mime_type,
        file_name,
        sha256: hex::encode(Sha256::digest(&data)),
        data,
    };
    let id = media.id.clone();
    tracing::info!(%id, mime_type = %media.mime_type, size = media.data.len(), "stored media");
    state.db.write().await.media.insert(id.clone(), media);
    Ok(Json(json!({ "id": id })))
}

async fn media_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, Rejection> {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    let media = db
        .media
        .get(&id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "unknown media"))?;
    Ok(Json(json!({
        "messaging_product": "whatsapp",
        "id": media.id,
        "mime_type": media.mime_type,
        "sha256": media.sha256,
        "file_size": media.data.len(),
        "url": format!("{}/download/{}", state.base_url, media.id),
    })))
}

async fn download_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<([(header::HeaderName, String); 1], Vec<u8>), Rejection> {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    let media = db
        .media
        .get(&id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "unknown media"))?;
    Ok((
        [(header::CONTENT_TYPE, media.mime_type.clone())],
        media.data.clone(),
    ))
}

async fn inbox(State(state): State<AppState>) -> Json<Vec<Value>> {
    Json(state.db.read().await.messages.clone())
}
