use crate::commands::{CmdMessage, CmdResult, ListedOpening};
use crate::error::Result;
use crate::facets::{filter_records, OpeningFilter};
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use chrono::Utc;

/// Lists saved lines narrowed by `filter`, then by a case-insensitive search
/// over name and category.
pub fn run<S: KeyValueStore>(
    store: &OpeningStore<S>,
    filter: &OpeningFilter,
    search: Option<&str>,
    due_only: bool,
) -> Result<CmdResult> {
    let openings = store.openings()?;
    let now = Utc::now();
    let term = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let listed: Vec<ListedOpening> = filter_records(&openings, filter)
        .into_iter()
        .filter(|(_, record)| match &term {
            Some(term) => {
                record.name.to_lowercase().contains(term)
                    || record.category.to_lowercase().contains(term)
            }
            None => true,
        })
        .map(|(key, record)| ListedOpening::new(key, record, now))
        .filter(|listed| !due_only || listed.due)
        .collect();

    let mut result = CmdResult::default();
    if openings.is_empty() {
        result.add_message(CmdMessage::info("No saved openings yet."));
    } else if listed.is_empty() {
        result.add_message(CmdMessage::info("No openings match your search."));
    }
    Ok(result.with_listed_openings(listed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;
    use crate::store::memory::fixtures::StoreFixture;
    use chrono::Duration;

    fn fixture() -> StoreFixture {
        StoreFixture::new()
            .with_categorized("Italian", "Open Games", Color::White, "e4 e5 Nf3 Nc6 Bc4")
            .with_categorized("Sicilian Najdorf", "Sicilian", Color::Black, "e4 c5")
            .with_opening("London", Color::White, "d4 d5 Bf4")
    }

    #[test]
    fn empty_store_says_so() {
        let store = StoreFixture::new().store;
        let result = run(&store, &OpeningFilter::default(), None, false).unwrap();
        assert!(result.listed_openings.is_empty());
        assert_eq!(result.messages[0].content, "No saved openings yet.");
    }

    #[test]
    fn search_matches_name_or_category() {
        let store = fixture().store;
        let result = run(&store, &OpeningFilter::default(), Some("SICIL"), false).unwrap();
        assert_eq!(result.listed_openings.len(), 1);

        let result = run(&store, &OpeningFilter::default(), Some("open"), false).unwrap();
        assert_eq!(result.listed_openings[0].key, "Italian");

        let result = run(&store, &OpeningFilter::default(), Some("grob"), false).unwrap();
        assert!(result.listed_openings.is_empty());
        assert_eq!(result.messages[0].content, "No openings match your search.");
    }

    #[test]
    fn filter_and_due_only() {
        let future = Utc::now() + Duration::days(3);
        let store = fixture()
            .with_scheduled("Later", "c4 e5", future)
            .store;

        let filter = OpeningFilter {
            first_move: Some("e4".into()),
            ..Default::default()
        };
        let result = run(&store, &filter, None, false).unwrap();
        assert_eq!(result.listed_openings.len(), 2);

        let result = run(&store, &OpeningFilter::default(), None, true).unwrap();
        assert_eq!(result.listed_openings.len(), 3);
        assert!(result.listed_openings.iter().all(|o| o.key != "Later"));
    }
}
