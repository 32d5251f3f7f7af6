use bytes::Bytes;
use crate::{ApiError, ChatReply, FileUpload, TermSheetApi};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:2000/api";

#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: String,
    /// `None` leaves the client on reqwest's defaults (no overall timeout).
    pub request_timeout: Option<Duration>,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    cfg: Arc<HttpApiConfig>,
}

impl HttpApi {
    pub fn new(mut cfg: HttpApiConfig) -> Result<Self, ApiError> {
        cfg.base_url = cfg.base_url.trim_end_matches('/').to_string();
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            cfg: Arc::new(cfg),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.cfg.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.cfg.base_url, path)
    }
}

async fn ensure_success(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
    debug!(status = status.as_u16(), body = ?body, "backend returned an error status");
    Err(ApiError::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
    })
}

#[async_trait::async_trait]
impl TermSheetApi for HttpApi {
    async fn health(&self) -> Result<(), ApiError> {
        let url = self.url("health");
        debug!(%url, "probing backend");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn validate(&self, upload: &FileUpload) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(&upload.path)
            .await
            .map_err(|e| ApiError::Io(format!("{}: {}", upload.path.display(), e)))?;
        debug!(
            file = %upload.file_name,
            mime = %upload.mime,
            size = bytes.len(),
            "uploading term sheet"
        );
        let part = Part::bytes(bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)
            .map_err(|e| ApiError::Io(e.to_string()))?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.url("validate-term-sheet"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;
        let resp = ensure_success(resp).await?;
        resp.text()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn chat(
        &self,
        message: &str,
        term_sheet_data: &serde_json::Value,
    ) -> Result<ChatReply, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ChatRequest<'a> {
            message: &'a str,
            term_sheet_data: &'a serde_json::Value,
        }

        let body = ChatRequest {
            message,
            term_sheet_data,
        };
        let resp = self
            .client
            .post(self.url("chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;
        let resp = ensure_success(resp).await?;
        resp.json::<ChatReply>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}
