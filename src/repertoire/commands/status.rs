use crate::commands::{CmdMessage, CmdResult, StoreStatus};
use crate::error::Result;
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use chrono::{DateTime, Utc};

pub fn run<S: KeyValueStore>(store: &OpeningStore<S>, now: DateTime<Utc>) -> Result<CmdResult> {
    let openings = store.openings()?;
    let due = openings.values().filter(|r| r.is_due(now)).count();
    let quota = store.quota()?;

    let mut result = CmdResult::default();
    if quota.is_warning() {
        result.add_message(CmdMessage::warning(quota.message()));
    }
    Ok(result.with_status(StoreStatus {
        total: openings.len(),
        due,
        quota,
    }))
}
