use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use custody_types::{Address, Cid};
use futures_util::stream;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{endpoints, StorageConfig};
use crate::error::{StorageError, StorageResult};
use crate::progress::ProgressObserver;
use crate::uploader::{EvidenceUploader, UploadAuth};

const UPLOAD_CHUNK_BYTES: usize = 256 * 1024;

/// HTTP client for the storage network's upload API and retrieval gateway.
pub struct StorageClient {
    http: reqwest::Client,
    config: StorageConfig,
}

#[derive(Debug, Deserialize)]
struct AuthMessageResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UploadedEntry {
    #[serde(rename = "Hash")]
    hash: String,
}

/// File uploads come back as a one-element array; text uploads as a single
/// object. Both carry the CID in `Hash`.
#[derive(Debug, Deserialize)]
struct FileUploadResponse {
    data: Vec<UploadedEntry>,
}

#[derive(Debug, Deserialize)]
struct TextUploadResponse {
    data: UploadedEntry,
}

/// Evidence retrieved from the gateway, decoded by content type.
#[derive(Clone, Debug)]
pub enum FetchedEvidence {
    Json(serde_json::Value),
    Text(String),
    Binary(Bytes),
}

impl FetchedEvidence {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Retrieve evidence through the public gateway and decode it by the
    /// response content type.
    pub async fn fetch(&self, cid: &Cid) -> StorageResult<FetchedEvidence> {
        let url = format!(
            "{}/ipfs/{}",
            self.config.gateway_base.trim_end_matches('/'),
            cid
        );
        debug!(%cid, "fetching from gateway");
        let response = self.http.get(&url).send().await?;
        let response = ensure_success(response).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;
        decode_fetched(content_type.as_deref(), body)
    }
}

#[async_trait]
impl EvidenceUploader for StorageClient {
    async fn auth_message(&self, account: Address) -> StorageResult<String> {
        let url = StorageConfig::join(&self.config.api_base, endpoints::AUTH_MESSAGE);
        let response = self
            .http
            .get(&url)
            .query(&[("publicKey", account.to_string())])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let parsed: AuthMessageResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Auth(e.to_string()))?;
        Ok(parsed.message)
    }

    async fn upload_encrypted(
        &self,
        name: &str,
        data: Bytes,
        auth: &UploadAuth,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> StorageResult<Cid> {
        let url = StorageConfig::join(&self.config.api_base, endpoints::UPLOAD_ENCRYPTED);
        debug!(name, bytes = data.len(), "starting encrypted upload");
        let total = data.len() as u64;
        let part = multipart::Part::stream_with_length(progress_body(data, observer), total)
            .file_name(name.to_string())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("x-auth-address", auth.account.to_string())
            .header("x-auth-signature", &auth.signature)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let parsed: FileUploadResponse = response.json().await?;
        let entry = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::UnexpectedResponse("empty upload response".into()))?;
        let cid =
            Cid::new(entry.hash).map_err(|e| StorageError::UnexpectedResponse(e.to_string()))?;
        info!(%cid, "encrypted upload complete");
        Ok(cid)
    }

    async fn upload_text_encrypted(
        &self,
        text: &str,
        name: &str,
        auth: &UploadAuth,
    ) -> StorageResult<Cid> {
        let url = StorageConfig::join(&self.config.api_base, endpoints::UPLOAD_TEXT_ENCRYPTED);
        debug!(name, bytes = text.len(), "starting encrypted text upload");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("x-auth-address", auth.account.to_string())
            .header("x-auth-signature", &auth.signature)
            .json(&serde_json::json!({ "text": text, "name": name }))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let parsed: TextUploadResponse = response.json().await?;
        let cid = Cid::new(parsed.data.hash)
            .map_err(|e| StorageError::UnexpectedResponse(e.to_string()))?;
        info!(%cid, "encrypted text upload complete");
        Ok(cid)
    }

    async fn upload_plain(
        &self,
        name: &str,
        data: Bytes,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> StorageResult<Cid> {
        let url = StorageConfig::join(&self.config.api_base, endpoints::UPLOAD_PLAIN);
        debug!(name, bytes = data.len(), "starting plain upload");
        let total = data.len() as u64;
        let part = multipart::Part::stream_with_length(progress_body(data, observer), total)
            .file_name(name.to_string())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let parsed: FileUploadResponse = response.json().await?;
        let entry = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::UnexpectedResponse("empty upload response".into()))?;
        let cid =
            Cid::new(entry.hash).map_err(|e| StorageError::UnexpectedResponse(e.to_string()))?;
        info!(%cid, "plain upload complete");
        Ok(cid)
    }
}

async fn ensure_success(response: reqwest::Response) -> StorageResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Split the payload into chunks paired with the cumulative percentage
/// after each chunk is sent. The final chunk always lands on 100.
fn chunks_with_percent(data: &Bytes) -> Vec<(Bytes, f32)> {
    let total = data.len();
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < total {
        let end = (offset + UPLOAD_CHUNK_BYTES).min(total);
        let percent = end as f32 * 100.0 / total as f32;
        chunks.push((data.slice(offset..end), percent));
        offset = end;
    }
    chunks
}

fn progress_body(data: Bytes, observer: Option<Arc<dyn ProgressObserver>>) -> reqwest::Body {
    if data.is_empty() {
        if let Some(observer) = &observer {
            observer.on_progress(100.0);
        }
        return reqwest::Body::from(data);
    }
    let chunks = chunks_with_percent(&data);
    let stream = stream::iter(chunks.into_iter().map(move |(chunk, percent)| {
        if let Some(observer) = &observer {
            observer.on_progress(percent);
        }
        Ok::<Bytes, std::io::Error>(chunk)
    }));
    reqwest::Body::wrap_stream(stream)
}

fn decode_fetched(content_type: Option<&str>, body: Bytes) -> StorageResult<FetchedEvidence> {
    let content_type = content_type.unwrap_or("");
    if content_type.starts_with("application/json") {
        let value = serde_json::from_slice(&body)
            .map_err(|e| StorageError::UnexpectedResponse(format!("invalid json body: {e}")))?;
        Ok(FetchedEvidence::Json(value))
    } else if content_type.starts_with("text/") {
        let text = String::from_utf8(body.to_vec())
            .map_err(|e| StorageError::UnexpectedResponse(format!("invalid utf-8 body: {e}")))?;
        Ok(FetchedEvidence::Text(text))
    } else {
        Ok(FetchedEvidence::Binary(body))
    }
}
