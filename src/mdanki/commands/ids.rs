use crate::commands::helpers::{
    apply_empty_answer_policy, diagnostic_messages, extract_document, plural,
};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::MdAnkiConfig;
use crate::error::Result;
use crate::rewrite::{assignments, write_ids};
use std::path::Path;

/// Annotates every card that lacks an id, without contacting the store.
pub fn run<G>(config: &MdAnkiConfig, path: &Path, gen_id: G) -> Result<CmdResult>
where
    G: FnMut() -> String,
{
    let mut extraction = extract_document(path, gen_id)?;
    apply_empty_answer_policy(&mut extraction, config.empty_answers)?;

    let mut result = CmdResult::default();
    for message in diagnostic_messages(&extraction.diagnostics) {
        result.add_message(message);
    }

    if write_ids(path, &assignments(&extraction.new_ids))? {
        result.add_message(CmdMessage::success(format!(
            "Assigned {} in {}",
            plural(extraction.new_ids.len(), "new id"),
            path.display()
        )));
    } else {
        result.add_message(CmdMessage::info("All cards already have ids"));
    }

    result.diagnostics = extraction.diagnostics;
    Ok(result.with_new_ids(extraction.new_ids))
}
