//! # Configuration
//!
//! Settings live in `config.json` inside the mdanki home directory
//! (`$MDANKI_HOME`, or the OS config dir). A missing file means defaults;
//! missing keys fall back to their defaults individually.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `anki_connect_url` | `http://localhost:8765` | AnkiConnect endpoint |
//! | `model_name` | `MarkdownNote` | Note model cards are created with |
//! | `default_deck` | `Default` | Deck for cards outside any deck heading |
//! | `empty_answers` | `warn` | `allow`, `warn` or `reject` cards with no answer |
//! | `model_css` | small stylesheet | CSS applied to the note model |

use crate::error::{MdAnkiError, Result};
use crate::reconcile::DEFAULT_DECK;
use crate::store::anki_connect::{NoteModel, DEFAULT_URL};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_MODEL_NAME: &str = "MarkdownNote";
const DEFAULT_MODEL_CSS: &str = "pre {\n  background-color: white;\n}\n\n.card {\n  font-size: 1.05em;\n}\n";

pub const KEYS: &[&str] = &[
    "anki_connect_url",
    "model_name",
    "default_deck",
    "empty_answers",
    "model_css",
];

/// What to do with cards whose answer turned out empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyAnswerPolicy {
    Allow,
    #[default]
    Warn,
    Reject,
}

impl fmt::Display for EmptyAnswerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmptyAnswerPolicy::Allow => "allow",
            EmptyAnswerPolicy::Warn => "warn",
            EmptyAnswerPolicy::Reject => "reject",
        };
        f.write_str(name)
    }
}

impl FromStr for EmptyAnswerPolicy {
    type Err = MdAnkiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(EmptyAnswerPolicy::Allow),
            "warn" => Ok(EmptyAnswerPolicy::Warn),
            "reject" => Ok(EmptyAnswerPolicy::Reject),
            other => Err(MdAnkiError::Config(format!(
                "Invalid empty_answers policy '{}' (expected allow, warn or reject)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MdAnkiConfig {
    #[serde(default = "default_url")]
    pub anki_connect_url: String,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default = "default_deck")]
    pub default_deck: String,

    #[serde(default)]
    pub empty_answers: EmptyAnswerPolicy,

    #[serde(default = "default_model_css")]
    pub model_css: String,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_deck() -> String {
    DEFAULT_DECK.to_string()
}

fn default_model_css() -> String {
    DEFAULT_MODEL_CSS.to_string()
}

impl Default for MdAnkiConfig {
    fn default() -> Self {
        Self {
            anki_connect_url: default_url(),
            model_name: default_model_name(),
            default_deck: default_deck(),
            empty_answers: EmptyAnswerPolicy::default(),
            model_css: default_model_css(),
        }
    }
}

impl MdAnkiConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(MdAnkiError::Io)?;
        let config: MdAnkiConfig =
            serde_json::from_str(&content).map_err(MdAnkiError::Serialization)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(MdAnkiError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(MdAnkiError::Serialization)?;
        fs::write(config_path, content).map_err(MdAnkiError::Io)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "anki_connect_url" => Some(self.anki_connect_url.clone()),
            "model_name" => Some(self.model_name.clone()),
            "default_deck" => Some(self.default_deck.clone()),
            "empty_answers" => Some(self.empty_answers.to_string()),
            "model_css" => Some(self.model_css.clone()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let non_empty = |value: &str| {
            if value.trim().is_empty() {
                Err(MdAnkiError::Config(format!("{} cannot be empty", key)))
            } else {
                Ok(value.trim().to_string())
            }
        };
        match key {
            "anki_connect_url" => self.anki_connect_url = non_empty(value)?,
            "model_name" => self.model_name = non_empty(value)?,
            "default_deck" => self.default_deck = non_empty(value)?,
            "empty_answers" => self.empty_answers = value.parse()?,
            "model_css" => self.model_css = value.to_string(),
            _ => return Err(MdAnkiError::Config(format!("Unknown config key: {}", key))),
        }
        Ok(())
    }

    pub fn note_model(&self) -> NoteModel {
        NoteModel {
            name: self.model_name.clone(),
            css: self.model_css.clone(),
        }
    }
}
