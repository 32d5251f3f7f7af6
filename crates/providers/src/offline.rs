use crate::{ApiError, ChatReply, FileUpload, TermSheetApi};

#[derive(Debug, Default)]
pub struct OfflineApi;

#[async_trait::async_trait]
impl TermSheetApi for OfflineApi {
    async fn health(&self) -> Result<(), ApiError> {
        Err(ApiError::Unreachable("offline mode".into()))
    }

    async fn validate(&self, _upload: &FileUpload) -> Result<String, ApiError> {
        Err(ApiError::Unreachable("offline mode".into()))
    }

    async fn chat(
        &self,
        _message: &str,
        _term_sheet_data: &serde_json::Value,
    ) -> Result<ChatReply, ApiError> {
        Err(ApiError::Unreachable("offline mode".into()))
    }
}
