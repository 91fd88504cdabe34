use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mdanki")]
#[command(about = "Keep Anki decks in sync with markdown documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AnkiConnect endpoint, overriding the configured one
    #[arg(long, global = true)]
    pub url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assign missing ids, then push every card in the document to Anki
    #[command(alias = "s")]
    Sync {
        /// Markdown document to sync
        file: PathBuf,

        /// Show what would change without writing the document or touching Anki
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// List the cards found in a document
    #[command(alias = "ls")]
    Cards {
        /// Markdown document to read
        file: PathBuf,
    },

    /// Assign ids to cards that have none, without contacting Anki
    Ids {
        /// Markdown document to annotate
        file: PathBuf,
    },

    /// Show or change configuration
    Config {
        /// Configuration key (e.g., default_deck)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
