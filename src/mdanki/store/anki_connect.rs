//! Client for the AnkiConnect add-on.
//!
//! Every request is a JSON object `{action, version, params}` POSTed to the
//! add-on's endpoint; every response is `{result, error}`, where a non-null
//! `error` means the action failed.
//!
//! Notes use a dedicated model with three fields: `Front` and `Back` hold the
//! rendered question and answer, `Id` holds the document identifier that
//! lookups search on.

use super::CardStore;
use crate::error::{MdAnkiError, Result};
use crate::model::{CardHandle, NoteHandle, RemoteCard};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_URL: &str = "http://localhost:8765";
pub const API_VERSION: u32 = 6;

const FRONT: &str = "Front";
const BACK: &str = "Back";
const ID_FIELD: &str = "Id";

/// The note model cards are created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteModel {
    pub name: String,
    pub css: String,
}

pub struct AnkiConnect {
    client: Client,
    url: String,
    model: NoteModel,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NoteInfo {
    #[serde(rename = "noteId")]
    note_id: i64,
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
    #[serde(default)]
    cards: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct FieldValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ModelStyling {
    css: String,
}

#[derive(Debug, Deserialize)]
struct CardInfo {
    #[serde(rename = "deckName")]
    deck_name: String,
}

impl AnkiConnect {
    pub fn new(url: impl Into<String>, model: NoteModel) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MdAnkiError::Api(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            model,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn invoke<T: DeserializeOwned>(&self, action: &str, params: Value) -> Result<T> {
        debug!(action, "anki-connect request");
        let response = self
            .client
            .post(&self.url)
            .json(&request_body(action, params))
            .send()
            .map_err(|e| MdAnkiError::store(action, e.to_string()))?;
        let envelope: Value = response
            .json()
            .map_err(|e| MdAnkiError::store(action, e.to_string()))?;
        decode_response(action, envelope)
    }

    fn note_fields(&self, question: &str, answer: &str) -> Value {
        json!({ FRONT: question, BACK: answer })
    }
}

pub(crate) fn request_body(action: &str, params: Value) -> Value {
    json!({
        "action": action,
        "version": API_VERSION,
        "params": params,
    })
}

pub(crate) fn decode_response<T: DeserializeOwned>(action: &str, envelope: Value) -> Result<T> {
    let envelope: Envelope = serde_json::from_value(envelope)
        .map_err(|e| MdAnkiError::store(action, format!("malformed response: {}", e)))?;
    if let Some(error) = envelope.error {
        return Err(MdAnkiError::store(action, error));
    }
    serde_json::from_value(envelope.result)
        .map_err(|e| MdAnkiError::store(action, format!("unexpected result: {}", e)))
}

/// Search query matching notes whose `Id` field equals `id` exactly.
///
/// `_` is a single-character wildcard in Anki searches and must be escaped.
pub(crate) fn id_query(id: &str) -> String {
    format!("{}:{}", ID_FIELD, id.replace('_', "\\_"))
}

impl CardStore for AnkiConnect {
    fn prepare(&mut self) -> Result<()> {
        let models: Vec<String> = self.invoke("modelNames", json!({}))?;
        if models.iter().any(|m| m == &self.model.name) {
            let styling: ModelStyling =
                self.invoke("modelStyling", json!({ "modelName": self.model.name }))?;
            if styling.css == self.model.css {
                return Ok(());
            }
            info!(model = %self.model.name, "updating note model styling");
            let _: Value = self.invoke(
                "updateModelStyling",
                json!({ "model": { "name": self.model.name, "css": self.model.css } }),
            )?;
            return Ok(());
        }

        info!(model = %self.model.name, "creating note model");
        let _: Value = self.invoke(
            "createModel",
            json!({
                "modelName": self.model.name,
                "inOrderFields": [FRONT, BACK, ID_FIELD],
                "css": self.model.css,
                "isCloze": false,
                "cardTemplates": [{
                    "Name": "Card 1",
                    "Front": "{{Front}}",
                    "Back": "{{Front}}<hr id=answer>{{Back}}",
                }],
            }),
        )?;
        Ok(())
    }

    fn lookup(&self, id: &str) -> Result<Option<RemoteCard>> {
        let notes: Vec<i64> = self.invoke("findNotes", json!({ "query": id_query(id) }))?;
        let note = match notes.as_slice() {
            [] => return Ok(None),
            [note] => *note,
            _ => {
                return Err(MdAnkiError::DuplicateCards {
                    id: id.to_string(),
                    count: notes.len(),
                })
            }
        };

        let infos: Vec<NoteInfo> = self.invoke("notesInfo", json!({ "notes": [note] }))?;
        let mut info = infos
            .into_iter()
            .next()
            .ok_or_else(|| MdAnkiError::store("notesInfo", format!("note {} vanished", note)))?;
        let card = match info.cards.as_slice() {
            [] => return Err(MdAnkiError::OrphanNote { id: id.to_string() }),
            [card] => *card,
            cards => {
                return Err(MdAnkiError::DuplicateCards {
                    id: id.to_string(),
                    count: cards.len(),
                })
            }
        };

        let cards: Vec<CardInfo> = self.invoke("cardsInfo", json!({ "cards": [card] }))?;
        let deck = cards
            .into_iter()
            .next()
            .map(|c| c.deck_name)
            .ok_or_else(|| MdAnkiError::store("cardsInfo", format!("card {} vanished", card)))?;

        let mut field = |name: &str| {
            info.fields
                .remove(name)
                .map(|f| f.value)
                .unwrap_or_default()
        };
        Ok(Some(RemoteCard {
            note: NoteHandle(info.note_id),
            card: CardHandle(card),
            id: id.to_string(),
            question: field(FRONT),
            answer: field(BACK),
            deck,
        }))
    }

    fn create(&mut self, deck: &str, question: &str, answer: &str, id: &str) -> Result<()> {
        let _: Value = self.invoke("createDeck", json!({ "deck": deck }))?;
        let _: Value = self.invoke(
            "addNote",
            json!({
                "note": {
                    "deckName": deck,
                    "modelName": self.model.name,
                    "fields": { FRONT: question, BACK: answer, ID_FIELD: id },
                    "options": { "allowDuplicate": false },
                    "tags": [],
                }
            }),
        )?;
        Ok(())
    }

    fn update_fields(&mut self, note: NoteHandle, question: &str, answer: &str) -> Result<()> {
        let _: Value = self.invoke(
            "updateNoteFields",
            json!({ "note": { "id": note.0, "fields": self.note_fields(question, answer) } }),
        )?;
        Ok(())
    }

    fn relocate(&mut self, card: CardHandle, deck: &str) -> Result<()> {
        let _: Value = self.invoke("changeDeck", json!({ "cards": [card.0], "deck": deck }))?;
        Ok(())
    }
}
