//! Terminal rendering of the session views.

use std::sync::Mutex;
use termsheet_core::models::{ChatAuthor, ChatMessage};
use termsheet_core::presenter::{Notification, NotificationLevel, Presenter};
use termsheet_core::render::{FileView, IssuesView, ResultView, NO_ISSUES_TEXT};
use termsheet_core::state::{Banner, ChatVisibility};

pub const WELCOME: &str = "\
Welcome to TermSheet Validator!
Upload your term sheet document to validate it against our compliance rules.
  1. open <file>   2. validate   3. chat
Type `help` for all commands.";

const BAR_CELLS: usize = 20;

pub fn score_bar(width: u8) -> String {
    let filled = (width as usize * BAR_CELLS + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_CELLS - filled))
}

pub fn format_file(file: &FileView) -> String {
    format!("{} {} ({})", file.icon, file.name, file.size)
}

pub fn format_result(view: &ResultView) -> String {
    let mut out = format!(
        "{} {}\n  {}\n  Risk score: {} {} {}",
        view.status.icon,
        view.status.label,
        view.status.message,
        view.score.value,
        score_bar(view.score.bar_width),
        view.score.bucket.color(),
    );
    match &view.issues {
        IssuesView::NoIssues => {
            out.push_str("\n  ");
            out.push_str(NO_ISSUES_TEXT);
        }
        IssuesView::List(items) => {
            out.push_str("\n  Issues:");
            for item in items {
                out.push_str(&format!(
                    "\n    {} [{}] {}",
                    item.icon, item.severity, item.description
                ));
            }
        }
    }
    out
}

pub fn format_banner(banner: Banner) -> Option<&'static str> {
    match banner {
        Banner::Hidden => None,
        Banner::BackendUnavailable => Some(
            "The backend server appears to be unavailable. You can still explore the interface using mock data (type `mock`).",
        ),
        Banner::MockLoaded => {
            Some("Mock data loaded successfully! You can now interact with the interface.")
        }
    }
}

pub fn format_message(message: &ChatMessage) -> String {
    match message.author {
        ChatAuthor::User => format!("  you> {}", message.text),
        ChatAuthor::System => format!("  assistant> {}", message.text),
    }
}

/// Messages in `new` past the longest prefix shared with `old`.
pub fn fresh_messages<'a>(old: &[ChatMessage], new: &'a [ChatMessage]) -> &'a [ChatMessage] {
    let shared = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    &new[shared..]
}

#[derive(Debug, Default)]
struct ChatView {
    visible: bool,
    shown: Vec<ChatMessage>,
}

/// Prints views to stdout and notifications to stderr. Chat lines are only
/// printed while the chat is open.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    chat: Mutex<ChatView>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for TerminalPresenter {
    fn file_selected(&self, file: &FileView) {
        println!("Selected {}", format_file(file));
    }

    fn loading(&self, message: Option<&str>) {
        if let Some(message) = message {
            println!("{}", message);
        }
    }

    fn result(&self, view: &ResultView) {
        println!("{}", format_result(view));
    }

    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Error => eprintln!("error: {}", notification.text),
            NotificationLevel::Info => eprintln!("{}", notification.text),
        }
    }

    fn banner(&self, banner: Banner) {
        if let Some(text) = format_banner(banner) {
            println!("! {}", text);
        }
    }

    fn chat_changed(&self, messages: &[ChatMessage]) {
        let Ok(mut chat) = self.chat.lock() else {
            return;
        };
        if chat.visible {
            for message in fresh_messages(&chat.shown, messages) {
                println!("{}", format_message(message));
            }
        }
        chat.shown = messages.to_vec();
    }

    fn chat_visibility(&self, visibility: ChatVisibility) {
        let Ok(mut chat) = self.chat.lock() else {
            return;
        };
        chat.visible = visibility == ChatVisibility::Visible;
        if chat.visible {
            println!("-- chat open (type `chat` to close) --");
            for message in &chat.shown {
                println!("{}", format_message(message));
            }
        } else {
            println!("-- chat closed --");
        }
    }
}
