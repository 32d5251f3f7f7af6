use crate::models::{ChatMessage, SelectedFile, ValidationResult};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatVisibility {
    #[default]
    Hidden,
    Visible,
}

impl ChatVisibility {
    pub fn toggled(self) -> Self {
        match self {
            ChatVisibility::Hidden => ChatVisibility::Visible,
            ChatVisibility::Visible => ChatVisibility::Hidden,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Banner {
    #[default]
    Hidden,
    BackendUnavailable,
    MockLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(u64);

#[derive(Debug, Clone)]
struct ChatEntry {
    placeholder: Option<PlaceholderId>,
    message: ChatMessage,
}

/// Append-only chat transcript. Placeholders are the only entries that can
/// be taken back out.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
    next_placeholder: u64,
}

impl ChatLog {
    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(ChatEntry {
            placeholder: None,
            message,
        });
    }

    pub fn push_placeholder(&mut self, message: ChatMessage) -> PlaceholderId {
        let id = PlaceholderId(self.next_placeholder);
        self.next_placeholder += 1;
        self.entries.push(ChatEntry {
            placeholder: Some(id),
            message,
        });
        id
    }

    /// Returns false if the placeholder was already removed.
    pub fn remove_placeholder(&mut self, id: PlaceholderId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.placeholder != Some(id));
        self.entries.len() != before
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub selected_file: Option<SelectedFile>,
    pub validation: Option<ValidationResult>,
    /// The validation response exactly as received, forwarded with chat
    /// requests. Mock results store their own serialized form.
    pub term_sheet_data: Option<serde_json::Value>,
    pub backend_available: bool,
    pub chat_log: ChatLog,
    pub chat_visibility: ChatVisibility,
    pub banner: Banner,
}

/// Shared handle to the session state. Every flow goes through the small
/// update operations here; the lock is never held across network I/O.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> SessionState {
        self.inner.lock().await.clone()
    }

    pub async fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.inner.lock().await;
        f(&mut state)
    }

    pub async fn backend_available(&self) -> bool {
        self.inner.lock().await.backend_available
    }

    pub async fn selected_file(&self) -> Option<SelectedFile> {
        self.inner.lock().await.selected_file.clone()
    }
}
