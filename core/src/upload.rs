//! Media upload: local file access plus the upload request/response pair.
//!
//! The file is opened read-only inside `MediaFile::read` and closed before
//! that function returns, on success and failure alike, so no handle is held
//! while the request is in flight.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::client::{decode, CloudClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::MultipartForm;
use crate::types::{MediaReference, MESSAGING_PRODUCT};

/// A media file loaded into memory, ready to attach to an upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaFile {
    /// Read `path`. `mime_type` is taken as given; the content is not sniffed.
    pub fn read(path: &Path, mime_type: &str) -> Result<Self, ApiError> {
        let io_error = |source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut data = Vec::new();
        {
            let mut file = File::open(path).map_err(io_error)?;
            file.read_to_end(&mut data).map_err(io_error)?;
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            data,
        })
    }

    pub fn from_bytes(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

impl CloudClient {
    pub fn build_upload(&self, file: MediaFile) -> HttpRequest {
        self.build_upload_with(MultipartForm::new(), file)
    }

    /// Like `build_upload`, appending the parts to a caller-supplied form
    /// (used to pin the boundary).
    pub fn build_upload_with(&self, form: MultipartForm, file: MediaFile) -> HttpRequest {
        let form = form
            .file("file", file.file_name, file.mime_type.clone(), file.data)
            .text("type", file.mime_type)
            .text("messaging_product", MESSAGING_PRODUCT);
        HttpRequest {
            method: HttpMethod::Post,
            url: self.upload_url().to_string(),
            headers: vec![
                self.authorization(),
                ("content-type".to_string(), form.content_type()),
            ],
            body: Some(form.encode()),
        }
    }

    pub fn parse_upload(&self, response: HttpResponse) -> Result<MediaReference, ApiError> {
        if !(200..300).contains(&response.status) {
            return Err(ApiError::UploadRejected {
                status: response.status,
                body: response.text(),
            });
        }
        decode(&response)
    }
}
