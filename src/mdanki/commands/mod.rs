use crate::config::MdAnkiConfig;
use crate::extract::Diagnostic;
use crate::model::{NewId, RenderedCard};
use crate::reconcile::ReconcileReport;

pub mod cards;
pub mod config;
pub mod helpers;
pub mod ids;
pub mod sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub cards: Vec<RenderedCard>,
    pub new_ids: Vec<NewId>,
    pub diagnostics: Vec<Diagnostic>,
    pub report: Option<ReconcileReport>,
    pub config: Option<MdAnkiConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_cards(mut self, cards: Vec<RenderedCard>) -> Self {
        self.cards = cards;
        self
    }

    pub fn with_new_ids(mut self, new_ids: Vec<NewId>) -> Self {
        self.new_ids = new_ids;
        self
    }

    pub fn with_report(mut self, report: ReconcileReport) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_config(mut self, config: MdAnkiConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
