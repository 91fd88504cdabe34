use crate::commands::CmdMessage;
use crate::config::EmptyAnswerPolicy;
use crate::error::{MdAnkiError, Result};
use crate::extract::{extract, Diagnostic, Extraction};
use crate::tokens::tokenize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

pub fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| MdAnkiError::document(path, e))
}

/// Reads, tokenizes and extracts the document at `path`.
///
/// Cards repeating an id already used earlier in the document are dropped.
pub fn extract_document<G>(path: &Path, gen_id: G) -> Result<Extraction>
where
    G: FnMut() -> String,
{
    let markdown = read_document(path)?;
    let blocks = tokenize(&markdown);
    let mut extraction = extract(&blocks, gen_id);
    drop_duplicate_ids(&mut extraction);
    debug!(
        path = %path.display(),
        blocks = blocks.len(),
        cards = extraction.cards.len(),
        new_ids = extraction.new_ids.len(),
        "extracted document"
    );
    Ok(extraction)
}

/// Keeps the first card for each annotated id and reports the others.
///
/// Ids minted during this extraction are not checked; they are written back
/// as they are.
pub fn drop_duplicate_ids(extraction: &mut Extraction) {
    let minted: HashSet<usize> = extraction.new_ids.iter().map(|n| n.line).collect();
    let mut first_lines: HashMap<String, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    extraction.cards.retain(|card| {
        if minted.contains(&card.line) {
            return true;
        }
        match first_lines.get(&card.id).copied() {
            Some(first_line) => {
                duplicates.push(Diagnostic::DuplicateId {
                    line: card.line,
                    id: card.id.clone(),
                    first_line,
                });
                false
            }
            None => {
                first_lines.insert(card.id.clone(), card.line);
                true
            }
        }
    });

    if !duplicates.is_empty() {
        extraction.diagnostics.extend(duplicates);
        extraction.diagnostics.sort_by_key(Diagnostic::line);
    }
}

/// Applies the empty-answer policy to the extraction's diagnostics.
///
/// `Reject` fails when any card has an empty answer, `Allow` drops those
/// diagnostics, and `Warn` keeps them.
pub fn apply_empty_answer_policy(
    extraction: &mut Extraction,
    policy: EmptyAnswerPolicy,
) -> Result<()> {
    let is_empty_answer = |d: &Diagnostic| matches!(d, Diagnostic::EmptyAnswer { .. });
    match policy {
        EmptyAnswerPolicy::Allow => extraction.diagnostics.retain(|d| !is_empty_answer(d)),
        EmptyAnswerPolicy::Warn => {}
        EmptyAnswerPolicy::Reject => {
            let count = extraction
                .diagnostics
                .iter()
                .filter(|&d| is_empty_answer(d))
                .count();
            if count > 0 {
                return Err(MdAnkiError::EmptyAnswers { count });
            }
        }
    }
    Ok(())
}

pub fn diagnostic_messages(diagnostics: &[Diagnostic]) -> Vec<CmdMessage> {
    diagnostics
        .iter()
        .map(|d| CmdMessage::warning(d.to_string()))
        .collect()
}

pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}
