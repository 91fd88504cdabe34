use super::CardStore;
use crate::error::{MdAnkiError, Result};
use crate::model::{CardHandle, NoteHandle, RemoteCard};
use std::collections::{BTreeMap, BTreeSet};

/// A mutating call received by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create { id: String, deck: String },
    UpdateFields { note: NoteHandle },
    Relocate { card: CardHandle, deck: String },
}

#[derive(Debug, Clone)]
struct StoredNote {
    id: String,
    question: String,
    answer: String,
    cards: Vec<CardHandle>,
}

/// In-memory collection for testing.
/// Does NOT persist data.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    notes: BTreeMap<NoteHandle, StoredNote>,
    decks: BTreeMap<CardHandle, String>,
    deck_names: BTreeSet<String>,
    next_handle: i64,
    prepared: bool,
    model_css: Option<String>,
    wanted_css: String,
    model_writes: usize,
    calls: Vec<StoreCall>,
    failing_action: Option<&'static str>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call of `action` ("create", "update_fields", "relocate")
    /// fail with a store error.
    pub fn fail_on(&mut self, action: &'static str) {
        self.failing_action = Some(action);
    }

    pub fn calls(&self) -> &[StoreCall] {
        &self.calls
    }

    pub fn mutating_calls(&self) -> usize {
        self.calls.len()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn deck_names(&self) -> Vec<String> {
        self.deck_names.iter().cloned().collect()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Styling the next `prepare` should leave on the note model.
    pub fn set_model_css(&mut self, css: impl Into<String>) {
        self.wanted_css = css.into();
    }

    /// How many times `prepare` created the note model or rewrote its styling.
    pub fn model_writes(&self) -> usize {
        self.model_writes
    }

    /// Adds a note with `card_count` cards in `deck`, bypassing the call log.
    pub fn insert_note(
        &mut self,
        id: &str,
        deck: &str,
        question: &str,
        answer: &str,
        card_count: usize,
    ) -> NoteHandle {
        let note = NoteHandle(self.next_id());
        let cards = (0..card_count)
            .map(|_| {
                let card = CardHandle(self.next_id());
                self.decks.insert(card, deck.to_string());
                card
            })
            .collect();
        self.deck_names.insert(deck.to_string());
        self.notes.insert(
            note,
            StoredNote {
                id: id.to_string(),
                question: question.to_string(),
                answer: answer.to_string(),
                cards,
            },
        );
        note
    }

    fn next_id(&mut self) -> i64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn check(&self, action: &'static str) -> Result<()> {
        match self.failing_action {
            Some(failing) if failing == action => {
                Err(MdAnkiError::store(action, "simulated failure"))
            }
            _ => Ok(()),
        }
    }
}

impl CardStore for InMemoryStore {
    fn prepare(&mut self) -> Result<()> {
        self.check("prepare")?;
        self.prepared = true;
        if self.model_css.as_deref() != Some(self.wanted_css.as_str()) {
            self.model_css = Some(self.wanted_css.clone());
            self.model_writes += 1;
        }
        Ok(())
    }

    fn lookup(&self, id: &str) -> Result<Option<RemoteCard>> {
        self.check("lookup")?;
        let matches: Vec<(&NoteHandle, &StoredNote)> =
            self.notes.iter().filter(|(_, n)| n.id == id).collect();

        let (handle, note) = match matches.as_slice() {
            [] => return Ok(None),
            [single] => *single,
            _ => {
                return Err(MdAnkiError::DuplicateCards {
                    id: id.to_string(),
                    count: matches.len(),
                })
            }
        };

        let card = match note.cards.as_slice() {
            [] => return Err(MdAnkiError::OrphanNote { id: id.to_string() }),
            [card] => *card,
            cards => {
                return Err(MdAnkiError::DuplicateCards {
                    id: id.to_string(),
                    count: cards.len(),
                })
            }
        };

        Ok(Some(RemoteCard {
            note: *handle,
            card,
            id: note.id.clone(),
            question: note.question.clone(),
            answer: note.answer.clone(),
            deck: self.decks.get(&card).cloned().unwrap_or_default(),
        }))
    }

    fn create(&mut self, deck: &str, question: &str, answer: &str, id: &str) -> Result<()> {
        self.check("create")?;
        self.calls.push(StoreCall::Create {
            id: id.to_string(),
            deck: deck.to_string(),
        });
        self.insert_note(id, deck, question, answer, 1);
        Ok(())
    }

    fn update_fields(&mut self, note: NoteHandle, question: &str, answer: &str) -> Result<()> {
        self.check("update_fields")?;
        self.calls.push(StoreCall::UpdateFields { note });
        let stored = self
            .notes
            .get_mut(&note)
            .ok_or_else(|| MdAnkiError::store("update_fields", format!("no note {}", note.0)))?;
        stored.question = question.to_string();
        stored.answer = answer.to_string();
        Ok(())
    }

    fn relocate(&mut self, card: CardHandle, deck: &str) -> Result<()> {
        self.check("relocate")?;
        self.calls.push(StoreCall::Relocate {
            card,
            deck: deck.to_string(),
        });
        let current = self
            .decks
            .get_mut(&card)
            .ok_or_else(|| MdAnkiError::store("relocate", format!("no card {}", card.0)))?;
        *current = deck.to_string();
        self.deck_names.insert(deck.to_string());
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        pub fn with_card(mut self, id: &str, deck: &str, question: &str, answer: &str) -> Self {
            self.store.insert_note(id, deck, question, answer, 1);
            self
        }

        pub fn with_cards(mut self, count: usize, deck: &str) -> Self {
            for i in 0..count {
                let id = format!("card{}", i + 1);
                let question = format!("<h2>Question {}</h2>", i + 1);
                let answer = format!("<p>Answer {}</p>", i + 1);
                self.store.insert_note(&id, deck, &question, &answer, 1);
            }
            self
        }

        /// Two notes sharing `id`.
        pub fn with_duplicate_notes(mut self, id: &str) -> Self {
            self.store.insert_note(id, "Default", "q", "a", 1);
            self.store.insert_note(id, "Default", "q", "a", 1);
            self
        }

        /// A note for `id` that has lost its card.
        pub fn with_orphan_note(mut self, id: &str) -> Self {
            self.store.insert_note(id, "Default", "q", "a", 0);
            self
        }
    }
}
