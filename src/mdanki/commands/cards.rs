use crate::commands::helpers::{
    apply_empty_answer_policy, diagnostic_messages, extract_document, plural,
};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::{EmptyAnswerPolicy, MdAnkiConfig};
use crate::error::Result;
use crate::render::{Highlighter, Renderer};
use std::path::Path;

/// Lists the cards in a document without writing anything.
///
/// Cards that have no id yet are listed with an empty id.
pub fn run<H: Highlighter>(
    renderer: &Renderer<H>,
    config: &MdAnkiConfig,
    path: &Path,
) -> Result<CmdResult> {
    let mut extraction = extract_document(path, String::new)?;
    if config.empty_answers == EmptyAnswerPolicy::Allow {
        apply_empty_answer_policy(&mut extraction, EmptyAnswerPolicy::Allow)?;
    }

    let mut cards = renderer.render_cards(&extraction.cards);
    for card in cards.iter_mut().filter(|c| c.deck.is_empty()) {
        card.deck = config.default_deck.clone();
    }

    let mut result = CmdResult::default();
    for message in diagnostic_messages(&extraction.diagnostics) {
        result.add_message(message);
    }
    result.add_message(CmdMessage::info(format!(
        "{} in {}",
        plural(cards.len(), "card"),
        path.display()
    )));
    if !extraction.new_ids.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "{} without an id; run `mdanki ids` to assign them",
            plural(extraction.new_ids.len(), "card")
        )));
    }

    result.diagnostics = extraction.diagnostics;
    Ok(result
        .with_cards(cards)
        .with_new_ids(extraction.new_ids))
}
