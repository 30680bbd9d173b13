use crate::commands::{CmdResult, ListedOpening};
use crate::error::Result;
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use chrono::Utc;

pub fn run<S: KeyValueStore>(store: &OpeningStore<S>, keys: &[String]) -> Result<CmdResult> {
    let now = Utc::now();
    let listed = keys
        .iter()
        .map(|key| Ok(ListedOpening::new(key.clone(), store.get(key)?, now)))
        .collect::<Result<Vec<_>>>()?;
    Ok(CmdResult::default().with_listed_openings(listed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;
    use crate::store::memory::fixtures::StoreFixture;

    #[test]
    fn shows_requested_lines_in_order() {
        let store = StoreFixture::new()
            .with_opening("a", Color::White, "e4")
            .with_opening("b", Color::White, "d4")
            .store;
        let result = run(&store, &["b".into(), "a".into()]).unwrap();
        let keys: Vec<_> = result.listed_openings.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(result.listed_openings[0].due);
    }

    #[test]
    fn unknown_key_fails() {
        let store = StoreFixture::new().store;
        assert!(run(&store, &["nope".into()]).is_err());
    }
}
