//! HTTP transport for the remote background removal service
//!
//! Endpoint contract:
//! - `POST /api/upload/` — multipart `image` + `engine`; JSON result
//!   descriptor on success, `{"error": "..."}` on failure.
//! - `POST /api/composite/` — multipart `filename` + optional `color` /
//!   `bg_image`; response mirrors the upload endpoint.
//! - `POST /api/batch-zip/` — JSON `{"filenames": [...]}`; binary archive
//!   stream on success.
//! - `GET /api/download/{filename}/` — stored artifact for direct download.

use crate::backends::{ArchiveBackend, UploadBackend};
use crate::config::{ClientConfig, Engine};
use crate::error::{BgClientError, Result};
use crate::types::{ImageFile, ResultDescriptor};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::multipart;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Error-bearing response body returned by every endpoint on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Request body of the archive-assembly endpoint
#[derive(Debug, Serialize)]
struct ArchiveRequest<'a> {
    filenames: &'a [String],
}

/// Reqwest-backed client for the remote service
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HTTP backend from the client configuration
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Failed to create the HTTP client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BgClientError::network_error("create HTTP client", &e))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Recomposite a previously processed result against a solid color or a
    /// custom background image. At least one of `color` and `background`
    /// should be given; the server keeps the transparent result otherwise.
    ///
    /// # Errors
    /// - `UploadFailed` on remote or transport failure
    pub async fn composite(
        &self,
        filename: &str,
        color: Option<&str>,
        background: Option<&ImageFile>,
    ) -> Result<ResultDescriptor> {
        let mut form = multipart::Form::new().text("filename", filename.to_string());
        if let Some(color) = color {
            form = form.text("color", color.to_string());
        }
        if let Some(bg) = background {
            form = form.part("bg_image", file_part(bg)?);
        }

        let response = self
            .client
            .post(self.endpoint("/api/composite/"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BgClientError::upload_failed(format!("transport error: {}", e)))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BgClientError::upload_failed(format!("transport error: {}", e)))?;
        descriptor_from_body(status, &body)
    }

    /// Fetch a stored artifact for direct download
    ///
    /// # Errors
    /// - `InvalidResponse` when the server does not return the artifact
    pub async fn download(&self, filename: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.endpoint(&format!("/api/download/{}/", filename)))
            .send()
            .await
            .map_err(|e| BgClientError::network_error("download result", &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BgClientError::invalid_response(format!(
                "download of '{}' returned {}",
                filename, status
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BgClientError::network_error("read download body", &e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl UploadBackend for HttpBackend {
    async fn upload(&self, file: &ImageFile, engine: Engine) -> Result<ResultDescriptor> {
        let form = multipart::Form::new()
            .part("image", file_part(file)?)
            .text("engine", engine.as_str());

        let response = self
            .client
            .post(self.endpoint("/api/upload/"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BgClientError::upload_failed(format!("transport error: {}", e)))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BgClientError::upload_failed(format!("transport error: {}", e)))?;
        descriptor_from_body(status, &body)
    }
}

#[async_trait]
impl ArchiveBackend for HttpBackend {
    async fn assemble(&self, filenames: &[String]) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.endpoint("/api/batch-zip/"))
            .json(&ArchiveRequest { filenames })
            .send()
            .await
            .map_err(|e| BgClientError::bundle_failed(format!("transport error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| BgClientError::bundle_failed(format!("transport error: {}", e)))?;
            return Err(archive_error(status, &body));
        }

        // The archive can be large; collect the byte stream chunk by chunk.
        let mut stream = response.bytes_stream();
        let mut archive = Vec::new();
        while let Some(chunk) = stream
            .try_next()
            .await
            .map_err(|e| BgClientError::bundle_failed(format!("transport error: {}", e)))?
        {
            archive.extend_from_slice(&chunk);
        }
        if archive.is_empty() {
            return Err(BgClientError::bundle_failed(
                "archive endpoint returned an empty payload",
            ));
        }
        Ok(archive)
    }
}

/// Build the multipart file part carrying the image payload
fn file_part(file: &ImageFile) -> Result<multipart::Part> {
    multipart::Part::bytes(file.data().to_vec())
        .file_name(file.name().to_string())
        .mime_str(file.media_type())
        .map_err(|e| {
            BgClientError::upload_failed(format!(
                "invalid media type '{}': {}",
                file.media_type(),
                e
            ))
        })
}

/// Parse an upload/composite response body into a result descriptor.
///
/// An error-bearing body wins over the status code so the server's reason is
/// what reaches the item status display; some deployments report errors with
/// a 200 status.
fn descriptor_from_body(status: StatusCode, body: &[u8]) -> Result<ResultDescriptor> {
    if let Ok(err) = serde_json::from_slice::<ErrorBody>(body) {
        return Err(BgClientError::upload_failed(err.error));
    }
    if !status.is_success() {
        return Err(BgClientError::upload_failed(format!(
            "server returned {}",
            status
        )));
    }
    serde_json::from_slice(body)
        .map_err(|e| BgClientError::upload_failed(format!("malformed response body: {}", e)))
}

fn archive_error(status: StatusCode, body: &[u8]) -> BgClientError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) => BgClientError::bundle_failed(err.error),
        Err(_) => BgClientError::bundle_failed(format!("server returned {}", status)),
    }
}
