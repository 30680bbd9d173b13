use crate::commands::{CmdMessage, CmdResult, ListedOpening};
use crate::error::Result;
use crate::model::{normalize_category, Color};
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use chrono::Utc;
use tracing::info;

/// Fields to change. `None` leaves a field as it is, except the category:
/// an explicitly empty category resets to the default.
#[derive(Debug, Clone, Default)]
pub struct OpeningUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub playing_as: Option<Color>,
}

pub fn run<S: KeyValueStore>(
    store: &mut OpeningStore<S>,
    key: &str,
    update: OpeningUpdate,
) -> Result<CmdResult> {
    let mut record = store.get(key)?;

    if let Some(name) = update.name.as_deref().map(str::trim) {
        if !name.is_empty() {
            record.name = name.to_string();
        }
    }
    if let Some(category) = update.category.as_deref() {
        record.category = normalize_category(Some(category));
    }
    if let Some(color) = update.playing_as {
        record.playing_as = color;
    }

    store.save(key, record.clone())?;
    info!(key = %key, "opening updated");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success("Opening info updated!"));
    Ok(result.with_affected_openings(vec![ListedOpening::new(key, record, Utc::now())]))
}
