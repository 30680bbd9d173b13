use crate::error::{RepertoireError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// First moves that are almost always White's. Records saved without a side
/// are assumed to be Black repertoire when their first move is not one of these.
const WHITE_FIRST_MOVES: &[&str] = &[
    "e4", "d4", "c4", "Nf3", "g3", "b3", "f4", "Nc3", "e3", "d3", "c3", "Nf6", "g4", "b4",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    /// Even plies belong to White, odd plies to Black.
    pub fn owns_ply(self, ply: usize) -> bool {
        match self {
            Color::White => ply % 2 == 0,
            Color::Black => ply % 2 == 1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = RepertoireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            other => Err(RepertoireError::Validation(format!(
                "Unknown color '{}', expected white or black",
                other
            ))),
        }
    }
}

/// One memorized line, in its canonical in-memory shape.
///
/// Every record read from storage goes through [`StoredOpening::normalize`], so
/// code working with an `OpeningRecord` never needs field fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningRecord {
    pub name: String,
    pub category: String,
    pub playing_as: Color,
    pub first_move: String,
    pub moves: Vec<String>,
    pub review_count: u32,
    pub difficulty: f64,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
}

impl OpeningRecord {
    pub fn new(
        name: impl Into<String>,
        category: Option<String>,
        playing_as: Color,
        moves: Vec<String>,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(RepertoireError::Validation(
                "Please enter a variation name!".into(),
            ));
        }
        let first_move = moves
            .first()
            .cloned()
            .ok_or_else(|| RepertoireError::Validation("Please make some moves first!".into()))?;

        Ok(Self {
            name,
            category: normalize_category(category.as_deref()),
            playing_as,
            first_move,
            moves,
            review_count: 0,
            difficulty: 0.0,
            last_reviewed: None,
            next_review: None,
            created_at: Some(Utc::now()),
            pgn: None,
            fen: None,
        })
    }

    /// Number of plies the trainee plays in this line.
    pub fn user_ply_count(&self) -> usize {
        (0..self.moves.len())
            .filter(|&ply| self.playing_as.owns_ply(ply))
            .count()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review {
            None => true,
            Some(next) => next <= now,
        }
    }

    /// Clears all scheduling state so the record is due immediately.
    pub fn reset_progress(&mut self) {
        self.review_count = 0;
        self.difficulty = 0.0;
        self.last_reviewed = None;
        self.next_review = None;
    }
}

pub fn normalize_category(category: Option<&str>) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

/// Infers the side a record was saved for when the field is missing.
pub fn infer_playing_as(moves: &[String]) -> Color {
    match moves.first() {
        Some(first) if !WHITE_FIRST_MOVES.contains(&first.as_str()) => Color::Black,
        _ => Color::White,
    }
}

/// Lenient shape of a record as it may appear in storage or in a backup file.
///
/// Older saves lack `playingAs`, `firstMove` or `category`, and review fields
/// may be null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredOpening {
    pub name: Option<String>,
    pub category: Option<String>,
    pub playing_as: Option<Color>,
    pub first_move: Option<String>,
    pub moves: Vec<String>,
    pub review_count: Option<u32>,
    pub difficulty: Option<f64>,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub pgn: Option<String>,
    pub fen: Option<String>,
}

impl StoredOpening {
    /// Produces the canonical record, or `None` when the record has no moves.
    pub fn normalize(self, key: &str) -> Option<OpeningRecord> {
        let first = self.moves.first()?.clone();
        let playing_as = self
            .playing_as
            .unwrap_or_else(|| infer_playing_as(&self.moves));
        let first_move = self.first_move.filter(|m| !m.is_empty()).unwrap_or(first);
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| key.to_string());

        Some(OpeningRecord {
            name,
            category: normalize_category(self.category.as_deref()),
            playing_as,
            first_move,
            moves: self.moves,
            review_count: self.review_count.unwrap_or(0),
            difficulty: self.difficulty.unwrap_or(0.0).clamp(0.0, 1.0),
            last_reviewed: self.last_reviewed,
            next_review: self.next_review,
            created_at: self.created_at,
            pgn: self.pgn,
            fen: self.fen,
        })
    }

    /// True when normalization would fill in a missing field.
    pub fn needs_backfill(&self) -> bool {
        self.playing_as.is_none()
            || self.first_move.as_deref().map_or(true, str::is_empty)
            || self.category.as_deref().map_or(true, |c| c.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(list: &[&str]) -> Vec<String> {
        list.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn new_record_requires_name_and_moves() {
        let err = OpeningRecord::new("  ", None, Color::White, moves(&["e4"])).unwrap_err();
        assert!(matches!(err, RepertoireError::Validation(_)));

        let err = OpeningRecord::new("Italian", None, Color::White, vec![]).unwrap_err();
        assert!(matches!(err, RepertoireError::Validation(_)));
    }

    #[test]
    fn new_record_fills_defaults() {
        let rec = OpeningRecord::new("Italian", None, Color::White, moves(&["e4", "e5"])).unwrap();
        assert_eq!(rec.category, DEFAULT_CATEGORY);
        assert_eq!(rec.first_move, "e4");
        assert_eq!(rec.review_count, 0);
        assert!(rec.next_review.is_none());
    }

    #[test]
    fn user_ply_count_follows_parity() {
        let mut rec = OpeningRecord::new(
            "Ruy",
            None,
            Color::White,
            moves(&["e4", "e5", "Nf3", "Nc6", "Bb5"]),
        )
        .unwrap();
        assert_eq!(rec.user_ply_count(), 3);
        rec.playing_as = Color::Black;
        assert_eq!(rec.user_ply_count(), 2);
    }

    #[test]
    fn normalize_backfills_missing_fields() {
        let stored: StoredOpening =
            serde_json::from_str(r#"{"moves": ["e5", "Nf3"], "reviewCount": null}"#).unwrap();
        assert!(stored.needs_backfill());

        let rec = stored.normalize("legacy").unwrap();
        assert_eq!(rec.name, "legacy");
        assert_eq!(rec.category, DEFAULT_CATEGORY);
        assert_eq!(rec.first_move, "e5");
        assert_eq!(rec.playing_as, Color::Black);
        assert_eq!(rec.review_count, 0);
    }

    #[test]
    fn normalize_rejects_empty_lines() {
        let stored = StoredOpening::default();
        assert!(stored.normalize("empty").is_none());
    }

    #[test]
    fn color_parsing() {
        assert_eq!("White".parse::<Color>().unwrap(), Color::White);
        assert_eq!("b".parse::<Color>().unwrap(), Color::Black);
        assert!("green".parse::<Color>().is_err());
    }
}
