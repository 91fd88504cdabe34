//! # Remote Store
//!
//! The reconciler talks to the flashcard collection only through the
//! [`CardStore`] trait, so it can run against a live Anki instance or an
//! in-memory fake with the same code.
//!
//! ## Implementations
//!
//! - [`anki_connect::AnkiConnect`]: JSON-over-HTTP client for the AnkiConnect
//!   add-on (protocol version 6).
//! - [`memory::InMemoryStore`]: fake collection for tests, with a log of
//!   every mutating call.
//!
//! ## Contract
//!
//! Every card is addressed by the identifier kept in the markdown document.
//! The collection must hold at most one note per identifier, and that note
//! exactly one card. [`CardStore::lookup`] reports a violation as
//! [`MdAnkiError::DuplicateCards`](crate::error::MdAnkiError::DuplicateCards)
//! or [`MdAnkiError::OrphanNote`](crate::error::MdAnkiError::OrphanNote);
//! neither can be repaired from the document side.

use crate::error::Result;
use crate::model::{CardHandle, NoteHandle, RemoteCard};

pub mod anki_connect;
pub mod memory;

pub trait CardStore {
    /// Makes sure the collection can accept our notes (note model, styling).
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    /// Finds the card carrying `id`, if it exists.
    fn lookup(&self, id: &str) -> Result<Option<RemoteCard>>;

    fn create(&mut self, deck: &str, question: &str, answer: &str, id: &str) -> Result<()>;

    fn update_fields(&mut self, note: NoteHandle, question: &str, answer: &str) -> Result<()>;

    /// Moves a card to `deck`, creating the deck if needed.
    fn relocate(&mut self, card: CardHandle, deck: &str) -> Result<()>;
}
