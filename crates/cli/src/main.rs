use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::shell::{parse_line, ShellCommand, HELP};
use cli::terminal::{format_file, format_result, TerminalPresenter, WELCOME};
use providers::{HttpApi, OfflineApi, TermSheetApi};
use std::path::PathBuf;
use std::sync::Arc;
use termsheet_core::config::{self, AppConfig};
use termsheet_core::presenter::{Presenter, RecordingPresenter};
use termsheet_core::render::{render_file, render_result};
use termsheet_core::session::{FlowError, ResultSource, Session, Timing};
use termsheet_core::state::ChatVisibility;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(base) = cli.api_base {
        cfg.api.base_url = base;
    }

    let api: Arc<dyn TermSheetApi> = if cli.offline {
        Arc::new(OfflineApi)
    } else {
        Arc::new(HttpApi::new(cfg.api.http()).context("building HTTP client")?)
    };
    info!(base_url = %cfg.api.base_url, offline = cli.offline, "starting");

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => run_shell(cfg, api).await,
        Commands::Health => run_health(cfg, api).await,
        Commands::Validate { file, json } => run_validate(cfg, api, file, json).await,
    }
}

#[derive(Parser)]
#[command(name = "termsheet")]
#[command(about = "Validate term sheets against the compliance backend", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Override the backend base URL, e.g. http://localhost:2000/api
    #[arg(long)]
    api_base: Option<String>,

    /// Never contact the backend; run on mock data
    #[arg(long, default_value_t = false)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Shell,
    /// Check whether the backend is reachable
    Health,
    /// Validate one file and print the result
    Validate {
        /// Term sheet to upload
        file: PathBuf,
        /// Output the validation result as JSON
        #[arg(long)]
        json: bool,
    },
}

async fn run_health(cfg: AppConfig, api: Arc<dyn TermSheetApi>) -> Result<()> {
    match api.health().await {
        Ok(()) => println!("backend available at {}", cfg.api.base_url),
        Err(e) => println!("backend unavailable at {}: {}", cfg.api.base_url, e),
    }
    Ok(())
}

async fn run_validate(
    cfg: AppConfig,
    api: Arc<dyn TermSheetApi>,
    file: PathBuf,
    json: bool,
) -> Result<()> {
    let presenter: Arc<dyn Presenter> = if json {
        Arc::new(RecordingPresenter::new())
    } else {
        Arc::new(TerminalPresenter::new())
    };
    let session = Session::new(api, presenter, Timing::from(&cfg.timing));
    session.probe_backend().await;
    session
        .select_file(&[file.clone()])
        .await
        .with_context(|| format!("selecting {}", file.display()))?;
    let outcome = session.validate().await?;
    if json {
        let source = match outcome.source {
            ResultSource::Backend => "backend",
            ResultSource::Mock => "mock",
            ResultSource::Fallback => "fallback",
        };
        let out = serde_json::json!({
            "source": source,
            "result": outcome.result,
            "view": render_result(&outcome.result),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}

fn report(err: FlowError) {
    match err {
        FlowError::Cancelled => debug!(error = %err, "flow ended early"),
        other => eprintln!("{}", other),
    }
}

async fn run_shell(cfg: AppConfig, api: Arc<dyn TermSheetApi>) -> Result<()> {
    let presenter = Arc::new(TerminalPresenter::new());
    let session = Session::new(api, presenter, Timing::from(&cfg.timing));

    println!("{}", WELCOME);
    session.probe_backend().await;

    let mut tasks = JoinSet::new();
    let mut quit = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let chat_visible = session.snapshot().await.chat_visibility == ChatVisibility::Visible;
        let Some(command) = parse_line(&line, chat_visible) else {
            continue;
        };
        match command {
            ShellCommand::Open(paths) => {
                if let Err(e) = session.select_file(&paths).await {
                    report(e);
                }
            }
            ShellCommand::Validate => {
                let session = session.clone();
                tasks.spawn(async move {
                    if let Err(e) = session.validate().await {
                        report(e);
                    }
                });
            }
            ShellCommand::Mock => {
                session.load_mock_data().await;
            }
            ShellCommand::ToggleChat => {
                session.toggle_chat().await;
            }
            ShellCommand::Say(text) => {
                let session = session.clone();
                tasks.spawn(async move {
                    if let Err(e) = session.send_message(&text).await {
                        report(e);
                    }
                });
            }
            ShellCommand::Show => {
                let state = session.snapshot().await;
                match &state.selected_file {
                    Some(file) => println!("File: {}", format_file(&render_file(file))),
                    None => println!("No file selected."),
                }
                match &state.validation {
                    Some(result) => println!("{}", format_result(&render_result(result))),
                    None => println!("Not validated yet."),
                }
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => {
                quit = true;
                break;
            }
            ShellCommand::Unknown(word) => {
                println!("unknown command `{}`; type `help` for the list", word)
            }
        }
    }
    // On `quit` pending delays are cancelled; at end of input they run out.
    if quit {
        session.teardown();
    }
    while tasks.join_next().await.is_some() {}
    Ok(())
}
