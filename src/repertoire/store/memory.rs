use super::KeyValueStore;
use crate::error::Result;
use std::collections::BTreeMap;

/// In-memory storage for testing and development.
/// Does NOT persist data.
#[derive(Default)]
pub struct InMemoryStore {
    entries: BTreeMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Color, OpeningRecord};
    use crate::store::openings::OpeningStore;

    pub fn line(moves: &str) -> Vec<String> {
        moves.split_whitespace().map(str::to_string).collect()
    }

    pub struct StoreFixture {
        pub store: OpeningStore<InMemoryStore>,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: OpeningStore::new(InMemoryStore::new()),
            }
        }

        pub fn with_opening(mut self, name: &str, playing_as: Color, moves: &str) -> Self {
            let record = OpeningRecord::new(name, None, playing_as, line(moves)).unwrap();
            self.store.save(name, record).unwrap();
            self
        }

        pub fn with_categorized(
            mut self,
            name: &str,
            category: &str,
            playing_as: Color,
            moves: &str,
        ) -> Self {
            let record =
                OpeningRecord::new(name, Some(category.to_string()), playing_as, line(moves))
                    .unwrap();
            self.store.save(name, record).unwrap();
            self
        }

        pub fn with_scheduled(
            mut self,
            name: &str,
            moves: &str,
            next_review: chrono::DateTime<chrono::Utc>,
        ) -> Self {
            let mut record = OpeningRecord::new(name, None, Color::White, line(moves)).unwrap();
            record.next_review = Some(next_review);
            self.store.save(name, record).unwrap();
            self
        }
    }
}
