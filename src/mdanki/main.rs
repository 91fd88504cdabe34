use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use mdanki::api::{CmdMessage, CmdResult, ConfigAction, MdAnkiApi, MessageLevel};
use mdanki::config::{MdAnkiConfig, KEYS};
use mdanki::error::{MdAnkiError, Result};
use mdanki::model::RenderedCard;
use mdanki::store::anki_connect::AnkiConnect;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod args;
use args::{Cli, Commands};

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but reported errors.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut api = init_api(&cli)?;

    let result = match cli.command {
        Commands::Sync { file, dry_run } => api.sync(&file, dry_run)?,
        Commands::Cards { file } => {
            let result = api.cards(&file)?;
            print_cards(&result.cards);
            result
        }
        Commands::Ids { file } => api.ids(&file)?,
        Commands::Config { key, value } => handle_config(&api, key, value)?,
    };

    print_messages(&result.messages);
    Ok(!result.has_errors())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "mdanki=debug" } else { "mdanki=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn config_dir() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("MDANKI_HOME") {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "mdanki", "mdanki")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| MdAnkiError::Config("Could not determine config dir".to_string()))
}

fn init_api(cli: &Cli) -> Result<MdAnkiApi<AnkiConnect>> {
    let dir = config_dir()?;
    let config = MdAnkiConfig::load(&dir)?;
    let url = cli
        .url
        .clone()
        .unwrap_or_else(|| config.anki_connect_url.clone());
    let store = AnkiConnect::new(url, config.note_model())?;
    Ok(MdAnkiApi::new(store, config, dir))
}

fn handle_config(
    api: &MdAnkiApi<AnkiConnect>,
    key: Option<String>,
    value: Option<String>,
) -> Result<CmdResult> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let result = api.config(action)?;
    if show_all {
        if let Some(config) = &result.config {
            print_config(config);
        }
    }
    Ok(result)
}

fn print_config(config: &MdAnkiConfig) {
    for key in KEYS {
        let value = config.get(key).unwrap_or_default();
        if value.contains('\n') {
            println!("{} = {:?}", key.bold(), value);
        } else {
            println!("{} = {}", key.bold(), value);
        }
    }
}

fn print_cards(cards: &[RenderedCard]) {
    for card in cards {
        let id = if card.id.is_empty() {
            "(new)".yellow().to_string()
        } else {
            card.id.dimmed().to_string()
        };
        println!(
            "{:>5}  {}  {}",
            card.line.to_string().dimmed(),
            card.deck.cyan(),
            id
        );
    }
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}
