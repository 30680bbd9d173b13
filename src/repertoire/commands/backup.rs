use crate::commands::{CmdMessage, CmdResult};
use crate::config::{TrainerConfig, CLICK_TO_MOVE_KEY, DARK_MODE_KEY, THEME_KEY};
use crate::error::{RepertoireError, Result};
use crate::model::StoredOpening;
use crate::store::openings::{OpeningStore, OPENINGS_KEY};
use crate::store::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

pub const BACKUP_VERSION: &str = "1.0";

/// Portable snapshot of every opening plus the board preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub openings: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_to_move: Option<bool>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
}

/// Default file name for a backup taken on `now`'s date.
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("chess-openings-backup-{}.json", now.format("%Y-%m-%d"))
}

pub fn export<S: KeyValueStore>(store: &OpeningStore<S>, now: DateTime<Utc>) -> Result<CmdResult> {
    let openings = match store.kv().get(OPENINGS_KEY)? {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)?,
        _ => Value::Object(Default::default()),
    };
    let count = openings.as_object().map_or(0, |o| o.len());
    let config = TrainerConfig::load(store.kv())?;

    let backup = Backup {
        openings,
        theme: Some(config.board_theme),
        dark_mode: Some(config.dark_mode),
        click_to_move: Some(config.click_to_move),
        version: Some(BACKUP_VERSION.to_string()),
        export_date: Some(now),
    };
    let json = serde_json::to_string_pretty(&backup)?;
    info!(count, "backup exported");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Exported {} opening(s).",
        count
    )));
    Ok(result.with_backup(json))
}

/// Replaces every opening, and any preference present in the document, with
/// the contents of a backup.
pub fn import<S: KeyValueStore>(store: &mut OpeningStore<S>, content: &str) -> Result<CmdResult> {
    let backup: Backup = serde_json::from_str(content)
        .map_err(|e| RepertoireError::Parse(format!("Invalid backup file format: {}", e)))?;
    if !backup.openings.is_object() {
        return Err(RepertoireError::Parse(
            "Invalid backup file format: openings must be an object".into(),
        ));
    }
    let parsed: BTreeMap<String, StoredOpening> = serde_json::from_value(backup.openings.clone())
        .map_err(|e| RepertoireError::Parse(format!("Invalid backup file format: {}", e)))?;

    store.ensure_capacity()?;

    let serialized = serde_json::to_string(&backup.openings)?;
    let kv = store.kv_mut();
    kv.set(OPENINGS_KEY, serialized)?;
    if let Some(theme) = backup.theme {
        kv.set(THEME_KEY, theme)?;
    }
    if let Some(dark) = backup.dark_mode {
        kv.set(DARK_MODE_KEY, dark.to_string())?;
    }
    if let Some(click) = backup.click_to_move {
        kv.set(CLICK_TO_MOVE_KEY, click.to_string())?;
    }
    info!(count = parsed.len(), "backup imported");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Successfully imported {} opening(s)!",
        parsed.len()
    )));
    let quota = store.quota()?;
    if quota.is_warning() {
        result.add_message(CmdMessage::warning(quota.message()));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;
    use crate::scheduler::compute_next_review;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn export_then_import_reproduces_records() {
        let mut source = StoreFixture::new()
            .with_categorized("Italian", "Open Games", Color::White, "e4 e5 Nf3 Nc6 Bc4")
            .with_opening("Caro-Kann", Color::Black, "e4 c6")
            .store;
        let reviewed = compute_next_review(&source.get("Italian").unwrap(), true, Utc::now());
        source.save("Italian", reviewed).unwrap();

        let exported = export(&source, Utc::now()).unwrap().backup.unwrap();
        let mut target = OpeningStore::new(InMemoryStore::new());
        import(&mut target, &exported).unwrap();

        assert_eq!(target.openings().unwrap(), source.openings().unwrap());
    }

    #[test]
    fn export_carries_defaults_and_version() {
        let store = StoreFixture::new().store;
        let json = export(&store, Utc::now()).unwrap().backup.unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["theme"], "blue");
        assert_eq!(value["clickToMove"], true);
        assert_eq!(value["darkMode"], false);
        assert!(value["openings"].as_object().unwrap().is_empty());
    }

    #[test]
    fn import_applies_settings() {
        let mut store = StoreFixture::new().store;
        import(
            &mut store,
            r#"{"openings": {}, "theme": "brown", "darkMode": true}"#,
        )
        .unwrap();
        let config = TrainerConfig::load(store.kv()).unwrap();
        assert_eq!(config.board_theme, "brown");
        assert!(config.dark_mode);
        assert!(config.click_to_move);
    }

    #[test]
    fn import_rejects_bad_shapes_without_writing() {
        let mut store = StoreFixture::new()
            .with_opening("Italian", Color::White, "e4 e5")
            .store;
        for bad in [
            "not json",
            r#"{"theme": "blue"}"#,
            r#"{"openings": [1, 2]}"#,
            r#"{"openings": {"x": 5}}"#,
        ] {
            let err = import(&mut store, bad).unwrap_err();
            assert!(matches!(err, RepertoireError::Parse(_)), "{bad}");
        }
        assert!(store.contains("Italian").unwrap());
    }

    #[test]
    fn file_name_uses_date() {
        let date = DateTime::parse_from_rfc3339("2024-03-05T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(backup_file_name(date), "chess-openings-backup-2024-03-05.json");
    }
}
