use crate::commands::helpers::replay_line;
use crate::commands::{CmdMessage, CmdResult, ListedOpening};
use crate::error::{RepertoireError, Result};
use crate::model::{Color, OpeningRecord};
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use chrono::Utc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub name: String,
    pub category: Option<String>,
    pub playing_as: Color,
    pub moves: Vec<String>,
    /// Replace an existing line with the same name.
    pub overwrite: bool,
}

pub fn run<S: KeyValueStore>(store: &mut OpeningStore<S>, request: SaveRequest) -> Result<CmdResult> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(RepertoireError::Validation(
            "Please enter a variation name!".into(),
        ));
    }
    if request.moves.is_empty() {
        return Err(RepertoireError::Validation(
            "Please make some moves first!".into(),
        ));
    }
    if !request.overwrite && store.contains(&name)? {
        return Err(RepertoireError::Validation(format!(
            "An opening named \"{}\" already exists. Use --force to overwrite it.",
            name
        )));
    }

    let replayed = replay_line(&request.moves)?;
    let mut record =
        OpeningRecord::new(name.clone(), request.category, request.playing_as, replayed.moves)?;
    if record.user_ply_count() == 0 {
        return Err(RepertoireError::Validation(format!(
            "This line has no moves for {} to play.",
            record.playing_as
        )));
    }
    record.pgn = Some(replayed.pgn);
    record.fen = Some(replayed.fen);

    store.save(&name, record.clone())?;
    info!(key = %name, plies = record.moves.len(), "opening saved");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Opening \"{}\" saved successfully!",
        name
    )));
    let quota = store.quota()?;
    if quota.is_warning() {
        result.add_message(CmdMessage::warning(quota.message()));
    }
    Ok(result.with_affected_openings(vec![ListedOpening::new(name, record, Utc::now())]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_CATEGORY;
    use crate::store::memory::fixtures::{line, StoreFixture};

    fn request(name: &str, moves: &str) -> SaveRequest {
        SaveRequest {
            name: name.into(),
            category: None,
            playing_as: Color::White,
            moves: line(moves),
            overwrite: false,
        }
    }

    #[test]
    fn saves_with_defaults() {
        let mut store = StoreFixture::new().store;
        run(&mut store, request("Italian", "e4 e5 Nf3 Nc6 Bc4")).unwrap();

        let saved = store.get("Italian").unwrap();
        assert_eq!(saved.category, DEFAULT_CATEGORY);
        assert_eq!(saved.first_move, "e4");
        assert_eq!(saved.review_count, 0);
        assert_eq!(saved.pgn.as_deref(), Some("1. e4 e5 2. Nf3 Nc6 3. Bc4"));
        assert!(saved.next_review.is_none());
    }

    #[test]
    fn rejects_empty_name_and_line() {
        let mut store = StoreFixture::new().store;
        let err = run(&mut store, request(" ", "e4")).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a variation name!");

        let err = run(&mut store, request("Empty", "")).unwrap_err();
        assert_eq!(err.to_string(), "Please make some moves first!");
        assert!(store.openings().unwrap().is_empty());
    }

    #[test]
    fn overwrite_requires_flag() {
        let mut store = StoreFixture::new()
            .with_opening("Italian", Color::White, "e4 e5")
            .store;
        assert!(run(&mut store, request("Italian", "d4 d5")).is_err());
        assert_eq!(store.get("Italian").unwrap().first_move, "e4");

        let mut req = request("Italian", "d4 d5");
        req.overwrite = true;
        run(&mut store, req).unwrap();
        assert_eq!(store.get("Italian").unwrap().first_move, "d4");
    }

    #[test]
    fn black_line_needs_a_black_move() {
        let mut store = StoreFixture::new().store;
        let mut req = request("Bare", "e4");
        req.playing_as = Color::Black;
        let err = run(&mut store, req).unwrap_err();
        assert_eq!(err.to_string(), "This line has no moves for black to play.");
        assert!(!store.contains("Bare").unwrap());
    }

    #[test]
    fn illegal_line_is_not_saved() {
        let mut store = StoreFixture::new().store;
        let err = run(&mut store, request("Bad", "e4 e4")).unwrap_err();
        assert!(matches!(err, RepertoireError::Parse(_)));
        assert!(!store.contains("Bad").unwrap());
    }
}
