use crate::commands::{CmdMessage, CmdResult};
use crate::config::MdAnkiConfig;
use crate::error::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(config_dir: &Path, action: ConfigAction) -> Result<CmdResult> {
    match action {
        ConfigAction::ShowAll => {
            let config = MdAnkiConfig::load(config_dir)?;
            Ok(CmdResult::default().with_config(config))
        }
        ConfigAction::ShowKey(key) => {
            let config = MdAnkiConfig::load(config_dir)?;
            let mut result = CmdResult::default();
            match config.get(&key) {
                Some(value) => result.add_message(CmdMessage::info(value)),
                None => {
                    result.add_message(CmdMessage::error(format!("Unknown config key: {}", key)))
                }
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let mut config = MdAnkiConfig::load(config_dir)?;
            if let Err(e) = config.set(&key, &value) {
                let mut result = CmdResult::default();
                result.add_message(CmdMessage::error(e.to_string()));
                return Ok(result);
            }
            config.save(config_dir)?;
            let shown = config.get(&key).unwrap_or(value);
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!("{} set to {}", key, shown)));
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::config::EmptyAnswerPolicy;
    use tempfile::tempdir;

    #[test]
    fn show_all_returns_defaults() {
        let dir = tempdir().unwrap();
        let result = run(dir.path(), ConfigAction::ShowAll).unwrap();
        assert_eq!(result.config, Some(MdAnkiConfig::default()));
    }

    #[test]
    fn set_persists_value() {
        let dir = tempdir().unwrap();

        let result = run(
            dir.path(),
            ConfigAction::Set("empty_answers".into(), "REJECT".into()),
        )
        .unwrap();

        assert_eq!(result.messages[0].content, "empty_answers set to reject");
        let loaded = MdAnkiConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.empty_answers, EmptyAnswerPolicy::Reject);

        let shown = run(dir.path(), ConfigAction::ShowKey("empty_answers".into())).unwrap();
        assert_eq!(shown.messages[0].content, "reject");
    }

    #[test]
    fn unknown_key_is_reported() {
        let dir = tempdir().unwrap();

        let shown = run(dir.path(), ConfigAction::ShowKey("colour".into())).unwrap();
        assert_eq!(shown.messages[0].level, MessageLevel::Error);

        let set = run(dir.path(), ConfigAction::Set("colour".into(), "red".into())).unwrap();
        assert!(set.has_errors());
        assert!(!dir.path().join("config.json").exists());
    }
}
