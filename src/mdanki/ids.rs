//! # Identifier Annotations
//!
//! A card's stable id lives in the document itself, as an HTML comment
//! appended to its question heading:
//!
//! ```text
//! ## What does `Rc` stand for? <!-- id:8c1f0d2e6b7a4c3d9e8f7a6b5c4d3e2f -->
//! ```
//!
//! There is no other persisted state. An annotation whose token is not made
//! of ASCII letters, digits, or underscores is ignored, and the heading is
//! treated as a new card.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!-- id:([A-Za-z0-9_]+) -->").expect("valid id pattern"));

static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*<!-- id:[A-Za-z0-9_]+ -->").expect("valid id pattern"));

/// Returns the identifier embedded in `text`, if any.
pub fn embedded_id(text: &str) -> Option<&str> {
    ID_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Removes identifier annotations (and the blanks before them) from `text`.
pub fn strip_annotation(text: &str) -> String {
    ANNOTATION.replace_all(text, "").into_owned()
}

/// The annotation comment for `id`.
pub fn annotation(id: &str) -> String {
    format!("<!-- id:{} -->", id)
}

/// Appends the annotation for `id` to `line`.
pub fn annotate(line: &str, id: &str) -> String {
    format!("{} {}", line, annotation(id))
}

/// Default id generator: 128 random bits as 32 lowercase hex characters.
pub fn random_id() -> String {
    Uuid::new_v4().simple().to_string()
}
