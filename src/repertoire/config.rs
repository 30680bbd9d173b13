use crate::error::{RepertoireError, Result};
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};

pub const THEME_KEY: &str = "boardTheme";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const CLICK_TO_MOVE_KEY: &str = "clickToMove";

const DEFAULT_THEME: &str = "blue";

/// Board preferences, stored next to the openings as plain string values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrainerConfig {
    #[serde(default = "default_theme")]
    pub board_theme: String,

    #[serde(default)]
    pub dark_mode: bool,

    /// Select a piece, then its target square, instead of dragging.
    #[serde(default = "default_click_to_move")]
    pub click_to_move: bool,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_click_to_move() -> bool {
    true
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            board_theme: default_theme(),
            dark_mode: false,
            click_to_move: default_click_to_move(),
        }
    }
}

impl TrainerConfig {
    pub const KEYS: [&'static str; 3] = [THEME_KEY, DARK_MODE_KEY, CLICK_TO_MOVE_KEY];

    /// Reads every preference, falling back to defaults for missing or
    /// unreadable values.
    pub fn load<S: KeyValueStore>(kv: &S) -> Result<Self> {
        let mut config = Self::default();
        if let Some(theme) = kv.get(THEME_KEY)?.filter(|t| !t.trim().is_empty()) {
            config.board_theme = theme;
        }
        if let Some(dark) = kv.get(DARK_MODE_KEY)?.and_then(|v| parse_bool(&v)) {
            config.dark_mode = dark;
        }
        if let Some(click) = kv.get(CLICK_TO_MOVE_KEY)?.and_then(|v| parse_bool(&v)) {
            config.click_to_move = click;
        }
        Ok(config)
    }

    pub fn save<S: KeyValueStore>(&self, kv: &mut S) -> Result<()> {
        kv.set(THEME_KEY, self.board_theme.clone())?;
        kv.set(DARK_MODE_KEY, self.dark_mode.to_string())?;
        kv.set(CLICK_TO_MOVE_KEY, self.click_to_move.to_string())?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            THEME_KEY => Ok(self.board_theme.clone()),
            DARK_MODE_KEY => Ok(self.dark_mode.to_string()),
            CLICK_TO_MOVE_KEY => Ok(self.click_to_move.to_string()),
            other => Err(unknown_key(other)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            THEME_KEY => {
                let theme = value.trim();
                if theme.is_empty() {
                    return Err(RepertoireError::Validation(
                        "Board theme cannot be empty".into(),
                    ));
                }
                self.board_theme = theme.to_string();
            }
            DARK_MODE_KEY => self.dark_mode = require_bool(key, value)?,
            CLICK_TO_MOVE_KEY => self.click_to_move = require_bool(key, value)?,
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn require_bool(key: &str, value: &str) -> Result<bool> {
    parse_bool(value).ok_or_else(|| {
        RepertoireError::Validation(format!("{} expects true or false, got '{}'", key, value))
    })
}

fn unknown_key(key: &str) -> RepertoireError {
    RepertoireError::Validation(format!(
        "Unknown config key '{}'. Available: {}",
        key,
        TrainerConfig::KEYS.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn defaults_when_store_is_empty() {
        let config = TrainerConfig::load(&InMemoryStore::new()).unwrap();
        assert_eq!(config, TrainerConfig::default());
        assert_eq!(config.board_theme, "blue");
        assert!(config.click_to_move);
        assert!(!config.dark_mode);
    }

    #[test]
    fn save_then_load() {
        let mut kv = InMemoryStore::new();
        let mut config = TrainerConfig::default();
        config.set(THEME_KEY, "green").unwrap();
        config.set(DARK_MODE_KEY, "yes").unwrap();
        config.save(&mut kv).unwrap();

        assert_eq!(kv.get(DARK_MODE_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(TrainerConfig::load(&kv).unwrap(), config);
    }

    #[test]
    fn garbage_values_fall_back() {
        let mut kv = InMemoryStore::new();
        kv.set(CLICK_TO_MOVE_KEY, "maybe".into()).unwrap();
        assert!(TrainerConfig::load(&kv).unwrap().click_to_move);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_bools() {
        let mut config = TrainerConfig::default();
        assert!(config.set("fontSize", "12").is_err());
        assert!(config.set(DARK_MODE_KEY, "dim").is_err());
        assert!(config.get("fontSize").is_err());
    }
}
