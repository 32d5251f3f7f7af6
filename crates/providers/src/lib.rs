//! Backend API abstractions for the term sheet validation service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub mod http;
pub mod offline;

pub use http::{HttpApi, HttpApiConfig, DEFAULT_BASE_URL};
pub use offline::OfflineApi;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("request failed with status {status} {reason}")]
    Status { status: u16, reason: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("could not read upload: {0}")]
    Io(String),
}

/// A file to send as the `file` part of the validation upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[async_trait::async_trait]
pub trait TermSheetApi: Send + Sync {
    async fn health(&self) -> Result<(), ApiError>;

    /// Uploads the term sheet and returns the raw response body.
    async fn validate(&self, upload: &FileUpload) -> Result<String, ApiError>;

    async fn chat(
        &self,
        message: &str,
        term_sheet_data: &serde_json::Value,
    ) -> Result<ChatReply, ApiError>;
}
