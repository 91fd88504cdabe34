use crate::commands::helpers::{
    apply_empty_answer_policy, diagnostic_messages, extract_document, plural,
};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::MdAnkiConfig;
use crate::error::Result;
use crate::reconcile::{reconcile, ReconcileOptions, ReconcileReport};
use crate::render::{Highlighter, Renderer};
use crate::rewrite::{assignments, write_ids};
use crate::store::CardStore;
use std::path::Path;

pub fn run<S, H, G>(
    store: &mut S,
    renderer: &Renderer<H>,
    config: &MdAnkiConfig,
    path: &Path,
    dry_run: bool,
    gen_id: G,
) -> Result<CmdResult>
where
    S: CardStore,
    H: Highlighter,
    G: FnMut() -> String,
{
    let mut extraction = extract_document(path, gen_id)?;
    apply_empty_answer_policy(&mut extraction, config.empty_answers)?;

    let mut result = CmdResult::default();
    for message in diagnostic_messages(&extraction.diagnostics) {
        result.add_message(message);
    }

    if !extraction.new_ids.is_empty() {
        let count = plural(extraction.new_ids.len(), "new id");
        if dry_run {
            result.add_message(CmdMessage::info(format!("Would assign {}", count)));
        } else {
            write_ids(path, &assignments(&extraction.new_ids))?;
            result.add_message(CmdMessage::success(format!(
                "Assigned {} in {}",
                count,
                path.display()
            )));
        }
    }

    if extraction.cards.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "No cards found in {}",
            path.display()
        )));
        result.diagnostics = extraction.diagnostics;
        return Ok(result.with_new_ids(extraction.new_ids));
    }

    let cards = renderer.render_cards(&extraction.cards);
    let options = ReconcileOptions {
        dry_run,
        default_deck: config.default_deck.clone(),
        ..ReconcileOptions::default()
    };
    let report = reconcile(&cards, store, &options)?;

    for failure in &report.failures {
        result.add_message(CmdMessage::error(failure.to_string()));
    }
    result.add_message(summary(&report, cards.len(), dry_run));

    result.diagnostics = extraction.diagnostics;
    Ok(result
        .with_cards(cards)
        .with_new_ids(extraction.new_ids)
        .with_report(report))
}

fn summary(report: &ReconcileReport, total: usize, dry_run: bool) -> CmdMessage {
    let counts = format!(
        "{} created, {} moved, {} updated, {} unchanged",
        report.created.len(),
        report.relocated.len(),
        report.updated.len(),
        report.unchanged.len()
    );
    if dry_run {
        CmdMessage::info(format!("Dry run over {}: {}", plural(total, "card"), counts))
    } else if report.is_success() {
        CmdMessage::success(format!("Synced {}: {}", plural(total, "card"), counts))
    } else {
        CmdMessage::warning(format!(
            "Synced {} with {}: {}",
            plural(total, "card"),
            plural(report.failures.len(), "failure"),
            counts
        ))
    }
}
