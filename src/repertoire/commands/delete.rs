use crate::commands::{CmdMessage, CmdResult, ListedOpening};
use crate::error::Result;
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use chrono::Utc;
use tracing::info;

pub fn run<S: KeyValueStore>(store: &mut OpeningStore<S>, keys: &[String]) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let now = Utc::now();

    for key in keys {
        let record = store.remove(key)?;
        info!(key = %key, "opening deleted");
        result.add_message(CmdMessage::success(format!("Opening \"{}\" deleted.", key)));
        result
            .affected_openings
            .push(ListedOpening::new(key.clone(), record, now));
    }

    Ok(result)
}
