use crate::commands::CmdResult;
use crate::error::Result;
use crate::facets::build_facets;
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;

pub fn run<S: KeyValueStore>(store: &OpeningStore<S>) -> Result<CmdResult> {
    let openings = store.openings()?;
    Ok(CmdResult::default().with_facets(build_facets(openings.values())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;
    use crate::store::memory::fixtures::StoreFixture;

    #[test]
    fn collects_distinct_values() {
        let store = StoreFixture::new()
            .with_categorized("Italian", "Open Games", Color::White, "e4 e5")
            .with_categorized("Scotch", "Open Games", Color::White, "e4 e5 Nf3 Nc6 d4")
            .with_opening("Slav", Color::Black, "d4 d5 c4 c6")
            .store;
        let facets = run(&store).unwrap().facets.unwrap();
        assert_eq!(facets.categories.len(), 2);
        assert_eq!(facets.first_moves.len(), 2);
    }
}
