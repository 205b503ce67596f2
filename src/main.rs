use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pubchat::config::ConfigError;
use pubchat::{AppConfig, Assistant, OllamaClientBuilder, SessionManager, Settings, SettingsUpdate};
use tracing_subscriber::EnvFilter;

/// pubchat - a conversational PubMed search assistant
#[derive(Parser)]
#[command(name = "pubchat")]
#[command(about = "Search PubMed and summarize articles through a chat interface")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum number of articles per search (1-15)
    #[arg(long, global = true, value_name = "N")]
    max_returns: Option<u32>,

    /// Abstracts longer than this many characters are truncated
    #[arg(long, global = true, value_name = "CHARS")]
    max_abstract_len: Option<usize>,

    /// Length bound for summaries, in words
    #[arg(long, global = true, value_name = "WORDS")]
    max_summary_len: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// Run a single turn in a fresh session
    Ask(AskCommand),
    /// List models available on the Ollama server
    Models,
}

/// Ask a single question
#[derive(Parser)]
struct AskCommand {
    /// The message to send
    #[arg(value_name = "TEXT")]
    text: String,
}

/// An error caused by the user's input rather than by the system.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct UserError(String);

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Chat => handle_chat(&cli),
        Commands::Ask(cmd) => handle_ask(&cli, cmd),
        Commands::Models => handle_models(&cli),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Logs go to stderr so chat output on stdout stays clean.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,pubchat=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// User errors are bad input and unusable config files; everything else is
/// internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<UserError>().is_some() || error.downcast_ref::<ConfigError>().is_some()
}

/// Settings overrides given on the command line.
fn flag_overrides(cli: &Cli) -> SettingsUpdate {
    SettingsUpdate {
        max_returns: cli.max_returns,
        max_abstract_len: cli.max_abstract_len,
        max_summary_len: cli.max_summary_len,
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    let overrides = flag_overrides(cli);
    if !overrides.is_empty() {
        config.settings = config.settings.merged(&overrides);
    }
    Ok(config)
}

fn build_manager(config: &AppConfig) -> Result<SessionManager> {
    let assistant = Assistant::from_config(config).context("Failed to set up service clients")?;
    Ok(SessionManager::new(assistant, config.settings))
}

fn handle_ask(cli: &Cli, cmd: &AskCommand) -> Result<()> {
    if cmd.text.trim().is_empty() {
        return Err(UserError("Message cannot be empty".to_string()).into());
    }

    let config = load_config(cli)?;
    let manager = build_manager(&config)?;
    let session = manager.create_session();
    let response = manager.handle_user_turn(session, cmd.text.trim())?;
    println!("{}", response);
    manager.destroy_session(session);
    Ok(())
}

fn handle_models(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let mut builder = OllamaClientBuilder::new()
        .timeout(Duration::from_secs(config.ollama.request_timeout_secs));
    if let Some(url) = &config.ollama.base_url {
        builder = builder.base_url(url);
    }
    let client = builder.build().context("Failed to create Ollama client")?;

    let models = client
        .list_models()
        .with_context(|| format!("Failed to list models from {}", client.base_url()))?;
    if models.is_empty() {
        println!("No models available on {}", client.base_url());
    }
    for model in models {
        println!("{}", model);
    }
    Ok(())
}

fn handle_chat(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let manager = build_manager(&config)?;
    let session = manager.create_session();

    println!("{}", manager.assistant().messages().welcome);
    println!("(commands: /settings, /set <field> <value>, /quit)\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match parse_chat_command(input) {
            None => {
                let response = manager.handle_user_turn(session, input)?;
                println!("\n{}\n", response);
            }
            Some(Ok(ChatCommand::Quit)) => break,
            Some(Ok(ChatCommand::ShowSettings)) => {
                print_settings(&manager.settings(session)?);
            }
            Some(Ok(ChatCommand::Set(update))) => {
                print_settings(&manager.update_settings(session, update)?);
            }
            Some(Err(message)) => println!("{}", message),
        }
    }

    manager.destroy_session(session);
    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("max_returns = {}", settings.max_returns);
    println!("max_abstract_len = {}", settings.max_abstract_len);
    println!("max_summary_len = {}", settings.max_summary_len);
}

/// Slash commands understood by the interactive chat.
#[derive(Debug, PartialEq, Eq)]
enum ChatCommand {
    Quit,
    ShowSettings,
    Set(SettingsUpdate),
}

/// Parses a slash command.
///
/// Returns `None` for ordinary chat text, and `Some(Err(_))` with a usage
/// message for a malformed command.
fn parse_chat_command(input: &str) -> Option<Result<ChatCommand, String>> {
    let rest = input.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();

    let command = match parts.next() {
        Some("quit") | Some("exit") => Ok(ChatCommand::Quit),
        Some("settings") => Ok(ChatCommand::ShowSettings),
        Some("set") => parse_set(parts.next(), parts.next()).map(ChatCommand::Set),
        _ => Err("Unknown command. Try /settings, /set <field> <value> or /quit".to_string()),
    };
    Some(command)
}

fn parse_set(field: Option<&str>, value: Option<&str>) -> Result<SettingsUpdate, String> {
    let usage = "Usage: /set <max_returns|max_abstract_len|max_summary_len> <number>";
    let (Some(field), Some(value)) = (field, value) else {
        return Err(usage.to_string());
    };
    let invalid = |_| format!("'{}' is not a valid number", value);

    let mut update = SettingsUpdate::default();
    match field {
        "max_returns" => update.max_returns = Some(value.parse().map_err(invalid)?),
        "max_abstract_len" => update.max_abstract_len = Some(value.parse().map_err(invalid)?),
        "max_summary_len" => update.max_summary_len = Some(value.parse().map_err(invalid)?),
        _ => return Err(usage.to_string()),
    }
    Ok(update)
}
