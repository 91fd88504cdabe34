//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for every
//! mdanki operation. It dispatches to `commands/*.rs`, owns the pieces those
//! commands share (store, configuration, renderer, id generator), and returns
//! structured [`CmdResult`]s. It does no printing.
//!
//! `MdAnkiApi<S: CardStore>` is generic over the remote store:
//! - Production: `MdAnkiApi<AnkiConnect>`
//! - Testing: `MdAnkiApi<InMemoryStore>`

use crate::commands;
use crate::config::MdAnkiConfig;
use crate::error::Result;
use crate::ids;
use crate::render::Renderer;
use crate::store::CardStore;
use std::path::{Path, PathBuf};

pub use crate::commands::config::ConfigAction;
pub use crate::commands::{CmdMessage, CmdResult, MessageLevel};

type IdGenerator = Box<dyn FnMut() -> String>;

pub struct MdAnkiApi<S: CardStore> {
    store: S,
    config: MdAnkiConfig,
    config_dir: PathBuf,
    renderer: Renderer,
    gen_id: IdGenerator,
}

impl<S: CardStore> MdAnkiApi<S> {
    pub fn new(store: S, config: MdAnkiConfig, config_dir: PathBuf) -> Self {
        Self {
            store,
            config,
            config_dir,
            renderer: Renderer::new(),
            gen_id: Box::new(ids::random_id),
        }
    }

    /// Replaces the random id generator, e.g. with a deterministic one.
    pub fn with_id_generator(mut self, gen_id: impl FnMut() -> String + 'static) -> Self {
        self.gen_id = Box::new(gen_id);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sync(&mut self, path: &Path, dry_run: bool) -> Result<CmdResult> {
        commands::sync::run(
            &mut self.store,
            &self.renderer,
            &self.config,
            path,
            dry_run,
            &mut self.gen_id,
        )
    }

    pub fn cards(&self, path: &Path) -> Result<CmdResult> {
        commands::cards::run(&self.renderer, &self.config, path)
    }

    pub fn ids(&mut self, path: &Path) -> Result<CmdResult> {
        commands::ids::run(&self.config, path, &mut self.gen_id)
    }

    pub fn config(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.config_dir, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use std::fs;
    use tempfile::tempdir;

    fn api(config_dir: &Path) -> MdAnkiApi<InMemoryStore> {
        let mut n = 0;
        MdAnkiApi::new(
            InMemoryStore::new(),
            MdAnkiConfig::default(),
            config_dir.to_path_buf(),
        )
        .with_id_generator(move || {
            n += 1;
            format!("gen{}", n)
        })
    }

    #[test]
    fn sync_uses_configured_generator_and_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.md");
        fs::write(&path, "# Deck: D\n\n## Q\n\nA\n").unwrap();
        let mut api = api(dir.path());

        api.sync(&path, false).unwrap();

        assert!(fs::read_to_string(&path)
            .unwrap()
            .contains("## Q <!-- id:gen1 -->"));
        assert_eq!(api.store().lookup("gen1").unwrap().unwrap().deck, "D");
    }

    #[test]
    fn ids_then_cards() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.md");
        fs::write(&path, "## Q1\n\nA1\n\n## Q2\n\nA2").unwrap();
        let mut api = api(dir.path());

        api.ids(&path).unwrap();
        let listed = api.cards(&path).unwrap();

        let ids: Vec<&str> = listed.cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["gen1", "gen2"]);
        assert!(listed.new_ids.is_empty());
        assert_eq!(api.store().mutating_calls(), 0);
    }

    #[test]
    fn config_reads_from_config_dir() {
        let dir = tempdir().unwrap();
        let api = api(dir.path());
        api.config(ConfigAction::Set("default_deck".into(), "Inbox".into()))
            .unwrap();

        let shown = api.config(ConfigAction::ShowAll).unwrap();
        assert_eq!(shown.config.unwrap().default_deck, "Inbox");
    }
}
