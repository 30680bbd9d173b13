use crate::commands::{CmdMessage, CmdResult};
use crate::config::TrainerConfig;
use crate::error::Result;
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run<S: KeyValueStore>(store: &mut OpeningStore<S>, action: ConfigAction) -> Result<CmdResult> {
    let mut config = TrainerConfig::load(store.kv())?;
    let mut result = CmdResult::default();

    match action {
        ConfigAction::ShowAll => {
            for key in TrainerConfig::KEYS {
                result.add_message(CmdMessage::info(format!("{}: {}", key, config.get(key)?)));
            }
        }
        ConfigAction::ShowKey(key) => {
            result.add_message(CmdMessage::info(format!("{}: {}", key, config.get(&key)?)));
        }
        ConfigAction::Set(key, value) => {
            config.set(&key, &value)?;
            config.save(store.kv_mut())?;
            result.add_message(CmdMessage::success(format!(
                "{} set to {}",
                key,
                config.get(&key)?
            )));
        }
    }

    Ok(result.with_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::THEME_KEY;
    use crate::store::memory::fixtures::StoreFixture;

    #[test]
    fn show_lists_every_key() {
        let mut store = StoreFixture::new().store;
        let result = run(&mut store, ConfigAction::ShowAll).unwrap();
        assert_eq!(result.messages.len(), TrainerConfig::KEYS.len());
        assert_eq!(result.messages[0].content, "boardTheme: blue");
    }

    #[test]
    fn set_persists() {
        let mut store = StoreFixture::new().store;
        run(
            &mut store,
            ConfigAction::Set(THEME_KEY.into(), "green".into()),
        )
        .unwrap();
        let result = run(&mut store, ConfigAction::ShowKey(THEME_KEY.into())).unwrap();
        assert_eq!(result.config.unwrap().board_theme, "green");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut store = StoreFixture::new().store;
        assert!(run(&mut store, ConfigAction::ShowKey("volume".into())).is_err());
    }
}
