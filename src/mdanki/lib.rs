//! # mdanki Architecture
//!
//! mdanki keeps an Anki collection in sync with plain markdown documents.
//! Cards are written as headings (questions) followed by their body
//! (answers), grouped into decks by `Deck: ` headings. The only state mdanki
//! persists is a `<!-- id:... -->` comment on each question heading.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (main.rs, args.rs)                               │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Owns store, config, renderer and id generator            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - sync, cards, ids, config                                 │
//! │  - Returns CmdResult with messages, never prints            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Pipeline                                                   │
//! │  tokens → extract → rewrite (ids) → render → reconcile      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Abstract CardStore trait                                 │
//! │  - AnkiConnect (production), InMemoryStore (testing)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pipeline
//!
//! 1. [`tokens`] splits the document into top-level blocks with line numbers.
//! 2. [`extract`] folds the blocks into cards, minting ids for headings that
//!    have none and collecting diagnostics for structural anomalies.
//! 3. [`rewrite`] appends the minted ids to their heading lines, replacing the
//!    document atomically.
//! 4. [`render`] turns each card's blocks into HTML.
//! 5. [`reconcile`] creates, moves or updates remote cards so the collection
//!    matches the document. A second run over an unchanged document sends no
//!    mutations.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code returns regular Rust types and never writes to
//! stdout/stderr or exits the process. Library code logs through `tracing`;
//! the binary decides where that goes.
//!
//! ## Testing Strategy
//!
//! 1. **Pipeline and commands**: unit tests next to the code, using
//!    [`store::memory::InMemoryStore`] in place of Anki.
//! 2. **API**: dispatch tests with a deterministic id generator.
//! 3. **CLI**: `tests/` drives the binary against temporary documents.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod ids;
pub mod model;
pub mod reconcile;
pub mod render;
pub mod rewrite;
pub mod store;
pub mod tokens;
