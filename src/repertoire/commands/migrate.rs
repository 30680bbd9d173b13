use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::openings::{OpeningMap, OpeningStore};
use crate::store::KeyValueStore;
use tracing::{info, warn};

/// Rewrites stored lines in canonical shape, filling in the side played, the
/// first move and the category where older saves lack them.
pub fn run<S: KeyValueStore>(store: &mut OpeningStore<S>) -> Result<CmdResult> {
    let raw = store.raw_openings()?;
    let mut result = CmdResult::default();
    let mut migrated = OpeningMap::new();
    let mut backfilled = 0;
    let mut dropped = 0;

    for (key, stored) in raw {
        let needs_backfill = stored.needs_backfill();
        match stored.normalize(&key) {
            Some(record) => {
                if needs_backfill {
                    backfilled += 1;
                }
                migrated.insert(key, record);
            }
            None => {
                warn!(key = %key, "dropping opening with no moves");
                dropped += 1;
            }
        }
    }

    if backfilled == 0 && dropped == 0 {
        result.add_message(CmdMessage::info("All openings are up to date."));
        return Ok(result);
    }

    store.replace_all(&migrated)?;
    info!(backfilled, dropped, "openings migrated");
    result.add_message(CmdMessage::success(format!(
        "Migrated {} opening(s).",
        backfilled
    )));
    if dropped > 0 {
        result.add_message(CmdMessage::warning(format!(
            "Removed {} opening(s) with no moves.",
            dropped
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, DEFAULT_CATEGORY};
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::openings::OPENINGS_KEY;

    #[test]
    fn backfills_legacy_records() {
        let mut store = StoreFixture::new().store;
        store
            .kv_mut()
            .set(
                OPENINGS_KEY,
                r#"{
                    "French": {"name": "French", "moves": ["e4", "e6"]},
                    "Dutch": {"name": "Dutch", "moves": ["f5"], "category": ""},
                    "Empty": {"name": "Empty", "moves": []}
                }"#
                .into(),
            )
            .unwrap();

        let result = run(&mut store).unwrap();
        assert_eq!(result.messages[0].content, "Migrated 2 opening(s).");

        let raw = store.raw_openings().unwrap();
        assert_eq!(raw.len(), 2);
        assert!(raw.values().all(|r| !r.needs_backfill()));

        let dutch = store.get("Dutch").unwrap();
        assert_eq!(dutch.playing_as, Color::Black);
        assert_eq!(dutch.first_move, "f5");
        assert_eq!(dutch.category, DEFAULT_CATEGORY);
        assert_eq!(store.get("French").unwrap().playing_as, Color::White);
    }

    #[test]
    fn canonical_store_is_left_alone() {
        let mut store = StoreFixture::new()
            .with_opening("Italian", Color::White, "e4 e5")
            .store;
        let result = run(&mut store).unwrap();
        assert_eq!(result.messages[0].content, "All openings are up to date.");
    }
}
