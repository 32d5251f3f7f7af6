//! User-triggered flows over the session store.
//!
//! Each flow reads and writes [`SessionStore`] through short updates, talks
//! to the backend through [`TermSheetApi`], and hands rendered views to the
//! [`Presenter`]. Flows are not serialized against each other: two validations
//! in flight both complete and the last one to finish is what stays displayed.
//! Chat transcripts are presented while the store is still locked, so the
//! presenter sees them in the order they were written.

use crate::config::TimingConfig;
use crate::intake::{pick_first, IntakeError};
use crate::mock::{mock_chat_response, mock_validation_result};
use crate::models::{ChatMessage, ParseError, SelectedFile, ValidationResult};
use crate::presenter::{Notification, Presenter};
use crate::render::{render_file, render_result};
use crate::state::{Banner, ChatVisibility, PlaceholderId, SessionState, SessionStore};
use providers::{ApiError, TermSheetApi};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const ANALYZING_MESSAGE: &str = "Analyzing term sheet...";
pub const ANALYZED_GREETING: &str =
    "I've analyzed your term sheet. What would you like to know about it?";
pub const GENERIC_GREETING: &str =
    "Welcome! Please validate a term sheet to start the conversation.";
pub const VALIDATE_FIRST_REPLY: &str =
    "Please validate a term sheet first so I can help you analyze it.";
pub const THINKING_MESSAGE: &str = "Thinking...";
pub const CHAT_APOLOGY: &str = "I'm sorry, I encountered an error. Please try again.";

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Please select a term sheet file first.")]
    NoFileSelected,
    #[error("Please enter a message.")]
    EmptyMessage,
    #[error("session was torn down before the flow finished")]
    Cancelled,
    #[error(transparent)]
    Intake(#[from] IntakeError),
}

#[derive(Debug, Error)]
enum RequestError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub chat_thinking: Duration,
    pub fallback_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for Timing {
    fn from(cfg: &TimingConfig) -> Self {
        Self {
            chat_thinking: Duration::from_millis(cfg.chat_thinking_ms),
            fallback_delay: Duration::from_millis(cfg.fallback_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    /// Parsed from the backend's response.
    Backend,
    /// Backend known to be down; no request was made.
    Mock,
    /// The request failed and mock data replaced it after the fallback delay.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub result: ValidationResult,
    pub source: ResultSource,
}

#[derive(Clone)]
pub struct Session {
    store: SessionStore,
    api: Arc<dyn TermSheetApi>,
    presenter: Arc<dyn Presenter>,
    timing: Timing,
    teardown: Arc<watch::Sender<bool>>,
}

impl Session {
    pub fn new(api: Arc<dyn TermSheetApi>, presenter: Arc<dyn Presenter>, timing: Timing) -> Self {
        let (teardown, _) = watch::channel(false);
        Self {
            store: SessionStore::new(),
            api,
            presenter,
            timing,
            teardown: Arc::new(teardown),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn snapshot(&self) -> SessionState {
        self.store.snapshot().await
    }

    /// Cancels every pending fallback or thinking delay. Flows waiting on one
    /// return [`FlowError::Cancelled`] without touching the view.
    pub fn teardown(&self) {
        self.teardown.send_replace(true);
    }

    async fn pause(&self, delay: Duration) -> Result<(), FlowError> {
        let mut torn_down = self.teardown.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = torn_down.wait_for(|torn| *torn) => {
                debug!("delay cancelled by teardown");
                Err(FlowError::Cancelled)
            }
        }
    }

    /// Startup reachability probe. Availability is never re-checked.
    pub async fn probe_backend(&self) -> bool {
        match self.api.health().await {
            Ok(()) => {
                info!("backend is available");
                self.store.update(|s| s.backend_available = true).await;
                true
            }
            Err(err) => {
                warn!(error = %err, "backend is unavailable");
                self.store
                    .update(|s| {
                        s.backend_available = false;
                        s.banner = Banner::BackendUnavailable;
                    })
                    .await;
                self.presenter.banner(Banner::BackendUnavailable);
                false
            }
        }
    }

    /// Picks the first of `paths`; an empty selection is ignored.
    pub async fn select_file(&self, paths: &[PathBuf]) -> Result<Option<SelectedFile>, FlowError> {
        let Some(path) = pick_first(paths) else {
            return Ok(None);
        };
        let file = SelectedFile::from_path(path)?;
        debug!(name = %file.name, size = file.size_bytes, "file selected");
        self.store
            .update(|s| s.selected_file = Some(file.clone()))
            .await;
        self.presenter.file_selected(&render_file(&file));
        Ok(Some(file))
    }

    pub async fn validate(&self) -> Result<ValidationOutcome, FlowError> {
        let file = self
            .store
            .selected_file()
            .await
            .ok_or(FlowError::NoFileSelected)?;
        info!(file = %file.name, "starting validation");

        if !self.store.backend_available().await {
            info!("backend unavailable, using mock data");
            self.presenter.notify(&Notification::info(
                "Backend unavailable; showing mock validation data.",
            ));
            let result = self.load_mock_data().await;
            return Ok(ValidationOutcome {
                result,
                source: ResultSource::Mock,
            });
        }

        self.presenter.loading(Some(ANALYZING_MESSAGE));
        let response = self.request_validation(&file).await;
        self.presenter.loading(None);

        match response {
            Ok((result, data)) => {
                self.display(result.clone(), data).await;
                Ok(ValidationOutcome {
                    result,
                    source: ResultSource::Backend,
                })
            }
            Err(err) => {
                warn!(error = %err, "validation request failed");
                self.presenter.notify(&Notification::error(format!(
                    "An error occurred while validating the term sheet: {}. Falling back to mock data.",
                    err
                )));
                self.pause(self.timing.fallback_delay).await?;
                let result = self.load_mock_data().await;
                Ok(ValidationOutcome {
                    result,
                    source: ResultSource::Fallback,
                })
            }
        }
    }

    /// Returns the parsed result together with the decoded body it came from.
    async fn request_validation(
        &self,
        file: &SelectedFile,
    ) -> Result<(ValidationResult, Value), RequestError> {
        let body = self.api.validate(&file.upload()).await?;
        debug!(len = body.len(), "validation response received");
        let data: Value = serde_json::from_str(&body).map_err(ParseError::from)?;
        let result = ValidationResult::from_value(data.clone())?;
        Ok((result, data))
    }

    /// Shows the fixed mock result, as offered by the backend-unavailable banner.
    pub async fn load_mock_data(&self) -> ValidationResult {
        let result = mock_validation_result();
        self.display(result.clone(), result.to_json()).await;
        let banner_changed = self
            .store
            .update(|s| {
                if s.banner == Banner::BackendUnavailable {
                    s.banner = Banner::MockLoaded;
                    true
                } else {
                    false
                }
            })
            .await;
        if banner_changed {
            self.presenter.banner(Banner::MockLoaded);
        }
        result
    }

    /// Stores and renders a result, seeding the chat if it is still empty.
    async fn display(&self, result: ValidationResult, data: Value) {
        let view = render_result(&result);
        self.store
            .update(|s| {
                s.validation = Some(result);
                s.term_sheet_data = Some(data);
                self.presenter.result(&view);
                if s.chat_log.is_empty() {
                    s.chat_log.push(ChatMessage::system(ANALYZED_GREETING));
                    self.presenter.chat_changed(&s.chat_log.messages());
                }
            })
            .await;
    }

    /// Applies `f` to the state and presents the resulting transcript before
    /// the lock is released.
    async fn update_chat<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        self.store
            .update(|s| {
                let out = f(s);
                self.presenter.chat_changed(&s.chat_log.messages());
                out
            })
            .await
    }

    pub async fn toggle_chat(&self) -> ChatVisibility {
        self.store
            .update(|s| {
                s.chat_visibility = s.chat_visibility.toggled();
                self.presenter.chat_visibility(s.chat_visibility);
                if s.chat_visibility == ChatVisibility::Visible && s.chat_log.is_empty() {
                    let greeting = if s.validation.is_some() {
                        ANALYZED_GREETING
                    } else {
                        GENERIC_GREETING
                    };
                    s.chat_log.push(ChatMessage::system(greeting));
                    self.presenter.chat_changed(&s.chat_log.messages());
                }
                s.chat_visibility
            })
            .await
    }

    /// Sends a chat message and returns the single system reply it produced.
    pub async fn send_message(&self, text: &str) -> Result<ChatMessage, FlowError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FlowError::EmptyMessage);
        }

        let (validation, data, backend_available) = self
            .update_chat(|s| {
                s.chat_log.push(ChatMessage::user(text));
                (
                    s.validation.clone(),
                    s.term_sheet_data.clone(),
                    s.backend_available,
                )
            })
            .await;

        let Some(validation) = validation else {
            return Ok(self.reply(None, VALIDATE_FIRST_REPLY.to_string()).await);
        };

        let thinking = self.push_transient(THINKING_MESSAGE).await;

        if !backend_available {
            self.pause(self.timing.chat_thinking).await?;
            let answer = mock_chat_response(text, &validation);
            return Ok(self.reply(Some(thinking), answer).await);
        }

        let data = data.unwrap_or_else(|| validation.to_json());
        match self.api.chat(text, &data).await {
            Ok(reply) => Ok(self.reply(Some(thinking), reply.response).await),
            Err(err) => {
                warn!(error = %err, "chat request failed");
                let apology = self
                    .update_chat(|s| {
                        s.chat_log.remove_placeholder(thinking);
                        s.chat_log.push_placeholder(ChatMessage::system(CHAT_APOLOGY))
                    })
                    .await;
                self.presenter.notify(&Notification::error(format!(
                    "Chat error: {}. Using mock responses instead.",
                    err
                )));
                self.pause(self.timing.fallback_delay).await?;
                let answer = mock_chat_response(text, &validation);
                Ok(self.reply(Some(apology), answer).await)
            }
        }
    }

    async fn push_transient(&self, text: &str) -> PlaceholderId {
        self.update_chat(|s| s.chat_log.push_placeholder(ChatMessage::system(text)))
            .await
    }

    /// Replaces `transient` (if any) with the final system reply.
    async fn reply(&self, transient: Option<PlaceholderId>, text: String) -> ChatMessage {
        let message = ChatMessage::system(text);
        self.update_chat(|s| {
            if let Some(id) = transient {
                s.chat_log.remove_placeholder(id);
            }
            s.chat_log.push(message.clone());
        })
        .await;
        message
    }
}
