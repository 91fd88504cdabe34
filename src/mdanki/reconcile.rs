//! # Reconciliation
//!
//! Brings the remote collection in line with the cards rendered from a
//! document. For each card, in document order:
//!
//! | remote lookup | same deck? | same fields? | actions                  |
//! |---------------|------------|--------------|--------------------------|
//! | not found     |            |              | create                   |
//! | found         | no         | yes          | relocate                 |
//! | found         | no         | no           | relocate, update fields  |
//! | found         | yes        | yes          | nothing                  |
//! | found         | yes        | no           | update fields            |
//!
//! Running it twice over an unchanged document issues no mutating calls the
//! second time. Lookup violations (duplicate ids, orphaned notes) fail only
//! the card they concern unless [`ReconcileOptions::stop_on_error`] is set.

use crate::error::{MdAnkiError, Result};
use crate::model::{CardHandle, NoteHandle, RemoteCard, RenderedCard};
use crate::store::CardStore;
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, info, warn};

pub const DEFAULT_DECK: &str = "Default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    Relocate { card: CardHandle, deck: String },
    UpdateFields { note: NoteHandle },
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Halt at the first card that fails instead of moving on.
    pub stop_on_error: bool,
    /// Look cards up and plan, but send no mutations.
    pub dry_run: bool,
    /// Deck for cards that sit under no deck heading.
    pub default_deck: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            stop_on_error: false,
            dry_run: false,
            default_deck: DEFAULT_DECK.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct CardFailure {
    pub id: String,
    pub line: usize,
    pub error: MdAnkiError,
}

impl fmt::Display for CardFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card '{}' (line {}): {}", self.id, self.line, self.error)
    }
}

/// Ids of the cards each kind of action was applied to (or, in a dry run,
/// would have been).
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub relocated: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub failures: Vec<CardFailure>,
    /// Cards never attempted because an earlier one failed.
    pub skipped: usize,
}

impl ReconcileReport {
    pub fn mutations(&self) -> usize {
        self.created.len() + self.relocated.len() + self.updated.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, id: &str, actions: &[Action]) {
        if actions.is_empty() {
            self.unchanged.push(id.to_string());
        }
        for action in actions {
            let bucket = match action {
                Action::Create => &mut self.created,
                Action::Relocate { .. } => &mut self.relocated,
                Action::UpdateFields { .. } => &mut self.updated,
            };
            bucket.push(id.to_string());
        }
    }
}

/// Decides what to do with `card` given what the collection holds for its id.
pub fn plan(card: &RenderedCard, remote: Option<&RemoteCard>) -> Vec<Action> {
    let Some(remote) = remote else {
        return vec![Action::Create];
    };

    let mut actions = Vec::new();
    if remote.deck != card.deck {
        actions.push(Action::Relocate {
            card: remote.card,
            deck: card.deck.clone(),
        });
    }
    if remote.question != card.question || remote.answer != card.answer {
        actions.push(Action::UpdateFields { note: remote.note });
    }
    actions
}

pub fn reconcile<S: CardStore>(
    cards: &[RenderedCard],
    store: &mut S,
    options: &ReconcileOptions,
) -> Result<ReconcileReport> {
    if !options.dry_run {
        store.prepare()?;
    }

    let mut report = ReconcileReport::default();
    for (index, card) in cards.iter().enumerate() {
        let card = with_deck(card, &options.default_deck);
        match sync_card(&card, store, options.dry_run) {
            Ok(actions) => {
                debug!(id = %card.id, ?actions, "reconciled card");
                report.record(&card.id, &actions);
            }
            Err(error) => {
                warn!(id = %card.id, line = card.line, %error, "card failed to sync");
                report.failures.push(CardFailure {
                    id: card.id.clone(),
                    line: card.line,
                    error,
                });
                if options.stop_on_error {
                    report.skipped = cards.len() - index - 1;
                    break;
                }
            }
        }
    }

    info!(
        created = report.created.len(),
        relocated = report.relocated.len(),
        updated = report.updated.len(),
        unchanged = report.unchanged.len(),
        failed = report.failures.len(),
        dry_run = options.dry_run,
        "reconciliation finished"
    );
    Ok(report)
}

fn with_deck<'a>(card: &'a RenderedCard, default_deck: &str) -> Cow<'a, RenderedCard> {
    if card.deck.is_empty() {
        let mut card = card.clone();
        card.deck = default_deck.to_string();
        Cow::Owned(card)
    } else {
        Cow::Borrowed(card)
    }
}

fn sync_card<S: CardStore>(
    card: &RenderedCard,
    store: &mut S,
    dry_run: bool,
) -> Result<Vec<Action>> {
    let remote = store.lookup(&card.id)?;
    let actions = plan(card, remote.as_ref());
    if dry_run {
        return Ok(actions);
    }

    for action in &actions {
        match action {
            Action::Create => store.create(&card.deck, &card.question, &card.answer, &card.id)?,
            Action::Relocate { card: handle, deck } => store.relocate(*handle, deck)?,
            Action::UpdateFields { note } => {
                store.update_fields(*note, &card.question, &card.answer)?
            }
        }
    }
    Ok(actions)
}
