use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  open <path>...   select a term sheet (the first path is used)
  drop <path>...   same as open
  validate         validate the selected term sheet
  mock             load mock validation data
  chat             show or hide the assistant
  say <message>    ask the assistant (bare text works while the chat is open)
  show             print the current file and result
  help             this list
  quit             leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Open(Vec<PathBuf>),
    Validate,
    Mock,
    ToggleChat,
    Say(String),
    Show,
    Help,
    Quit,
    Unknown(String),
}

/// Splits on whitespace, keeping double-quoted runs together.
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for ch in input.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        args.push(current);
    }
    args
}

/// Maps one line of input to a command. Blank lines map to nothing.
pub fn parse_line(line: &str, chat_visible: bool) -> Option<ShellCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match word.to_lowercase().as_str() {
        "open" | "drop" => {
            ShellCommand::Open(split_args(rest).into_iter().map(PathBuf::from).collect())
        }
        "validate" => ShellCommand::Validate,
        "mock" => ShellCommand::Mock,
        "chat" => ShellCommand::ToggleChat,
        "say" => ShellCommand::Say(rest.to_string()),
        "show" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        _ if chat_visible => ShellCommand::Say(line.to_string()),
        other => ShellCommand::Unknown(other.to_string()),
    };
    Some(command)
}
