use crate::models::ChatMessage;
use crate::render::{FileView, ResultView};
use crate::state::{Banner, ChatVisibility};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Error,
    Info,
}

/// A transient message shown outside the main views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

impl Notification {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            text: text.into(),
        }
    }
}

/// The view layer. Flows hand it fully rendered state; it owns no logic.
pub trait Presenter: Send + Sync {
    fn file_selected(&self, file: &FileView);
    fn loading(&self, message: Option<&str>);
    fn result(&self, view: &ResultView);
    fn notify(&self, notification: &Notification);
    fn banner(&self, banner: Banner);
    fn chat_changed(&self, messages: &[ChatMessage]);
    fn chat_visibility(&self, visibility: ChatVisibility);
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    FileSelected(FileView),
    Loading(Option<String>),
    Result(ResultView),
    Notify(Notification),
    Banner(Banner),
    ChatChanged(Vec<ChatMessage>),
    ChatVisibility(ChatVisibility),
}

/// Headless presenter that records every call, for embedding and tests.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: PresenterEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn results(&self) -> Vec<ResultView> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Result(view) => Some(view),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn banners(&self) -> Vec<Banner> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Banner(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// The most recent transcript handed to the presenter.
    pub fn last_chat(&self) -> Vec<ChatMessage> {
        self.events()
            .into_iter()
            .rev()
            .find_map(|e| match e {
                PresenterEvent::ChatChanged(messages) => Some(messages),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl Presenter for RecordingPresenter {
    fn file_selected(&self, file: &FileView) {
        self.record(PresenterEvent::FileSelected(file.clone()));
    }

    fn loading(&self, message: Option<&str>) {
        self.record(PresenterEvent::Loading(message.map(str::to_string)));
    }

    fn result(&self, view: &ResultView) {
        self.record(PresenterEvent::Result(view.clone()));
    }

    fn notify(&self, notification: &Notification) {
        self.record(PresenterEvent::Notify(notification.clone()));
    }

    fn banner(&self, banner: Banner) {
        self.record(PresenterEvent::Banner(banner));
    }

    fn chat_changed(&self, messages: &[ChatMessage]) {
        self.record(PresenterEvent::ChatChanged(messages.to_vec()));
    }

    fn chat_visibility(&self, visibility: ChatVisibility) {
        self.record(PresenterEvent::ChatVisibility(visibility));
    }
}
