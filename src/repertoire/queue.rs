use crate::model::OpeningRecord;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A record captured together with its store key when a queue is built.
///
/// The queue owns these snapshots; later store writes do not reach them.
#[derive(Debug, Clone, PartialEq)]
pub struct DueEntry {
    pub key: String,
    pub record: OpeningRecord,
}

impl DueEntry {
    pub fn new(key: impl Into<String>, record: OpeningRecord) -> Self {
        Self {
            key: key.into(),
            record,
        }
    }
}

/// Where the queue's randomness comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueueSeed {
    #[default]
    Entropy,
    Fixed(u64),
}

impl QueueSeed {
    pub fn rng(self) -> ChaCha8Rng {
        match self {
            QueueSeed::Entropy => ChaCha8Rng::from_entropy(),
            QueueSeed::Fixed(seed) => ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

/// Collects every record due at `now` and shuffles them.
///
/// Records without a `next_review` are always due. Input order matters for
/// reproducibility: the same input with the same seed yields the same queue.
pub fn build_due_queue<'a, I, R>(records: I, now: DateTime<Utc>, rng: &mut R) -> Vec<DueEntry>
where
    I: IntoIterator<Item = (&'a String, &'a OpeningRecord)>,
    R: Rng + ?Sized,
{
    let mut queue: Vec<DueEntry> = records
        .into_iter()
        .filter(|(_, record)| record.is_due(now))
        .map(|(key, record)| DueEntry::new(key.clone(), record.clone()))
        .collect();

    shuffle_entries(&mut queue, rng);
    queue
}

/// Uniform Fisher–Yates shuffle.
pub fn shuffle_entries<R: Rng + ?Sized>(entries: &mut [DueEntry], rng: &mut R) {
    entries.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn record(name: &str, next: Option<DateTime<Utc>>) -> OpeningRecord {
        let mut rec =
            OpeningRecord::new(name, None, Color::White, vec!["e4".into(), "e5".into()]).unwrap();
        rec.next_review = next;
        rec
    }

    fn library() -> BTreeMap<String, OpeningRecord> {
        let mut map = BTreeMap::new();
        map.insert("never".into(), record("never", None));
        map.insert(
            "past".into(),
            record("past", Some(now() - Duration::days(2))),
        );
        map.insert("exact".into(), record("exact", Some(now())));
        map.insert(
            "future".into(),
            record("future", Some(now() + Duration::hours(1))),
        );
        map
    }

    #[test]
    fn includes_due_and_excludes_future() {
        let mut rng = QueueSeed::Fixed(7).rng();
        let queue = build_due_queue(&library(), now(), &mut rng);
        let mut keys: Vec<_> = queue.iter().map(|e| e.key.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["exact", "never", "past"]);
    }

    #[test]
    fn fixed_seed_reproduces_order() {
        let mut map = BTreeMap::new();
        for i in 0..20 {
            map.insert(format!("op{:02}", i), record(&format!("op{}", i), None));
        }
        let first = build_due_queue(&map, now(), &mut QueueSeed::Fixed(42).rng());
        let second = build_due_queue(&map, now(), &mut QueueSeed::Fixed(42).rng());
        assert_eq!(first, second);
        assert_eq!(first.len(), 20);
    }

    #[test]
    fn queue_is_a_snapshot() {
        let mut map = library();
        let queue = build_due_queue(&map, now(), &mut QueueSeed::Fixed(1).rng());
        map.get_mut("never").unwrap().category = "Changed".into();
        let entry = queue.iter().find(|e| e.key == "never").unwrap();
        assert_eq!(entry.record.category, "Uncategorized");
    }
}
