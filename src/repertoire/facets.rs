use crate::model::{Color, OpeningRecord};
use std::collections::BTreeSet;

/// Distinct values a practice or learn run can be narrowed by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub categories: BTreeSet<String>,
    pub first_moves: BTreeSet<String>,
    pub colors: BTreeSet<Color>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpeningFilter {
    pub color: Option<Color>,
    pub category: Option<String>,
    pub first_move: Option<String>,
}

impl OpeningFilter {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.category.is_none() && self.first_move.is_none()
    }

    pub fn matches(&self, record: &OpeningRecord) -> bool {
        if let Some(color) = self.color {
            if record.playing_as != color {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &record.category != category {
                return false;
            }
        }
        if let Some(first_move) = &self.first_move {
            if &record.first_move != first_move {
                return false;
            }
        }
        true
    }
}

pub fn build_facets<'a, I>(records: I) -> Facets
where
    I: IntoIterator<Item = &'a OpeningRecord>,
{
    let mut facets = Facets {
        colors: Color::ALL.into_iter().collect(),
        ..Facets::default()
    };

    for record in records {
        if !record.category.is_empty() {
            facets.categories.insert(record.category.clone());
        }
        if !record.first_move.is_empty() {
            facets.first_moves.insert(record.first_move.clone());
        }
    }

    facets
}

/// Keeps the `(key, record)` pairs accepted by every criterion in `filter`,
/// preserving input order.
pub fn filter_records<'a, I>(records: I, filter: &OpeningFilter) -> Vec<(String, OpeningRecord)>
where
    I: IntoIterator<Item = (&'a String, &'a OpeningRecord)>,
{
    records
        .into_iter()
        .filter(|(_, record)| filter.matches(record))
        .map(|(key, record)| (key.clone(), record.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoredOpening;
    use std::collections::BTreeMap;

    fn library() -> BTreeMap<String, OpeningRecord> {
        let raw = r#"{
            "italian": {"name": "Italian", "category": "Open Games", "playingAs": "white",
                        "moves": ["e4", "e5", "Nf3", "Nc6", "Bc4"]},
            "sicilian": {"name": "Sicilian", "playingAs": "black", "moves": ["e4", "c5"]},
            "qgd": {"name": "QGD", "category": "", "playingAs": "black",
                    "moves": ["d4", "d5", "c4", "e6"]}
        }"#;
        let stored: BTreeMap<String, StoredOpening> = serde_json::from_str(raw).unwrap();
        stored
            .into_iter()
            .filter_map(|(k, s)| s.normalize(&k).map(|r| (k, r)))
            .collect()
    }

    #[test]
    fn facets_apply_fallbacks() {
        let lib = library();
        let facets = build_facets(lib.values());
        assert_eq!(
            facets.categories.iter().collect::<Vec<_>>(),
            vec!["Open Games", "Uncategorized"]
        );
        assert_eq!(
            facets.first_moves.iter().collect::<Vec<_>>(),
            vec!["d4", "e4"]
        );
        assert_eq!(facets.colors.len(), 2);
    }

    #[test]
    fn absent_criteria_pass_everything() {
        let lib = library();
        let all = filter_records(&lib, &OpeningFilter::default());
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn criteria_are_anded() {
        let lib = library();
        let filter = OpeningFilter {
            color: Some(Color::Black),
            first_move: Some("e4".into()),
            ..Default::default()
        };
        let hits = filter_records(&lib, &filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "sicilian");
    }

    #[test]
    fn category_matches_after_fallback() {
        let lib = library();
        let filter = OpeningFilter {
            category: Some("Uncategorized".into()),
            ..Default::default()
        };
        let keys: Vec<_> = filter_records(&lib, &filter)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["qgd", "sicilian"]);
    }
}
