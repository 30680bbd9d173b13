use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use tracing::{info, warn};

/// Marks every line as never reviewed, so all of them become due.
pub fn reset<S: KeyValueStore>(store: &mut OpeningStore<S>) -> Result<CmdResult> {
    let mut openings = store.openings()?;
    for record in openings.values_mut() {
        record.reset_progress();
    }
    store.replace_all(&openings)?;
    info!(count = openings.len(), "review progress reset");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(
        "Progress reset! All openings are now available for review.",
    ));
    Ok(result)
}

/// Deletes every opening and every setting.
pub fn wipe<S: KeyValueStore>(store: &mut OpeningStore<S>) -> Result<CmdResult> {
    store.kv_mut().clear()?;
    warn!("all data deleted");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success("All data has been deleted."));
    Ok(result)
}
