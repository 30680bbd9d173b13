//! PGN import.
//!
//! Each game in a PGN file becomes one line. Headers name and categorize it;
//! the movetext is stripped of comments, variations and annotations, and every
//! remaining token is checked on a board. Tokens the board rejects are dropped,
//! so a damaged game still imports whatever prefix of it makes sense.

use crate::commands::{CmdMessage, CmdResult, ListedOpening};
use crate::error::{RepertoireError, Result};
use crate::model::{Color, OpeningRecord};
use crate::rules::{ChessBoard, RulesEngine};
use crate::store::openings::OpeningStore;
use crate::store::KeyValueStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

const MAX_ERROR_SAMPLES: usize = 3;
const RESULT_TOKENS: &[&str] = &["1-0", "0-1", "1/2-1/2", "*"];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGame {
    pub name: String,
    pub category: String,
    pub playing_as: Color,
    pub moves: Vec<String>,
}

impl ParsedGame {
    /// Imported lines are due at once and start out as hard.
    pub fn into_record(self, now: DateTime<Utc>) -> OpeningRecord {
        let first_move = self.moves.first().cloned().unwrap_or_default();
        OpeningRecord {
            name: self.name,
            category: self.category,
            playing_as: self.playing_as,
            first_move,
            moves: self.moves,
            review_count: 0,
            difficulty: 1.0,
            last_reviewed: None,
            next_review: Some(now),
            created_at: Some(now),
            pgn: None,
            fen: None,
        }
    }
}

pub fn run<S: KeyValueStore>(
    store: &mut OpeningStore<S>,
    text: &str,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    store.ensure_capacity()?;

    let games = split_games(text);
    if games.is_empty() {
        return Err(RepertoireError::Parse(
            "No valid games found in PGN file".into(),
        ));
    }

    let mut openings = store.openings()?;
    let mut result = CmdResult::default();
    let mut errors = Vec::new();
    let mut skipped = 0;

    for (index, game) in games.iter().enumerate() {
        match parse_game(game, now) {
            Ok(parsed) => {
                let key = format!("{}_{}", parsed.name, Uuid::new_v4());
                let record = parsed.into_record(now);
                debug!(key = %key, plies = record.moves.len(), "imported game");
                result
                    .affected_openings
                    .push(ListedOpening::new(key.clone(), record.clone(), now));
                openings.insert(key, record);
            }
            Err(e) => {
                skipped += 1;
                if errors.len() < MAX_ERROR_SAMPLES {
                    errors.push(format!("Game {}: {}", index + 1, e));
                }
            }
        }
    }

    let imported = result.affected_openings.len();
    if imported > 0 {
        store.replace_all(&openings)?;
    }
    info!(imported, skipped, "pgn import finished");

    let quota = store.quota()?;
    if quota.is_warning() {
        result.add_message(CmdMessage::warning(format!(
            "Imported {} opening(s) but {}",
            imported,
            quota.message()
        )));
        return Ok(result);
    }

    let mut summary = format!("Imported {} opening(s)", imported);
    if skipped > 0 {
        summary.push_str(&format!(", skipped {}", skipped));
    }
    result.add_message(CmdMessage::success(summary));
    for error in errors {
        result.add_message(CmdMessage::warning(error));
    }
    Ok(result)
}

/// Splits a PGN file into games at every blank line followed by a header.
pub fn split_games(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n");
    let mut games = Vec::new();
    let mut rest = text.as_str();
    while let Some(pos) = rest.find("\n\n[") {
        games.push(rest[..pos].to_string());
        rest = &rest[pos + 2..];
    }
    games.push(rest.to_string());
    games.retain(|g| !g.trim().is_empty());
    games
}

/// Parses a `[Key "Value"]` header line.
fn parse_header(line: &str) -> Option<(String, String)> {
    let inner = line.trim().strip_prefix('[')?;
    let key_end = inner.find(char::is_whitespace)?;
    let key = &inner[..key_end];
    let after_key = inner[key_end..].trim_start().strip_prefix('"')?;
    let value_end = after_key.find('"')?;
    let value = &after_key[..value_end];
    if key.is_empty() || value.is_empty() || !after_key[value_end + 1..].starts_with(']') {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

pub fn parse_game(text: &str, now: DateTime<Utc>) -> Result<ParsedGame> {
    let mut headers = BTreeMap::new();
    let mut movetext = String::new();

    for line in text.lines() {
        if let Some((key, value)) = parse_header(line) {
            headers.insert(key, value);
        } else if !line.trim().is_empty() && !line.starts_with('[') {
            movetext.push(' ');
            movetext.push_str(line);
            movetext.push('\n');
        }
    }

    let header = |key: &str| headers.get(key).cloned();
    let name = header("Variation")
        .or_else(|| header("Opening"))
        .or_else(|| header("Event"))
        .unwrap_or_else(|| format!("Opening {}", now.timestamp_millis()));
    let category = match header("ECO") {
        Some(eco) => format!(
            "{} - {}",
            eco,
            header("Opening").unwrap_or_else(|| "Unknown".into())
        ),
        None => header("Opening").unwrap_or_else(|| "Imported".into()),
    };
    let mentions_user = |key: &str| {
        header(key).is_some_and(|v| {
            let v = v.to_lowercase();
            v.contains("player") || v.contains("user")
        })
    };
    let playing_as = if mentions_user("Black") {
        Color::Black
    } else {
        Color::White
    };

    if movetext.trim().is_empty() {
        return Err(RepertoireError::Parse("No moves found in game".into()));
    }
    let tokens = clean_movetext(&movetext);
    if tokens.is_empty() {
        return Err(RepertoireError::Parse(
            "No valid moves after parsing".into(),
        ));
    }

    let mut board = ChessBoard::new();
    let mut moves = Vec::new();
    for token in &tokens {
        let played = board.play_san(token, true).or_else(|| {
            let stripped: String = token.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            board.play_san(&stripped, true)
        });
        match played {
            Some(san) => moves.push(san),
            None => debug!(token = %token, "dropping unplayable token"),
        }
    }

    if moves.is_empty() {
        return Err(RepertoireError::Parse("No valid chess moves found".into()));
    }
    if !(0..moves.len()).any(|ply| playing_as.owns_ply(ply)) {
        return Err(RepertoireError::Parse(format!(
            "No moves for {} in this game",
            playing_as
        )));
    }

    Ok(ParsedGame {
        name,
        category,
        playing_as,
        moves,
    })
}

/// Reduces movetext to bare move tokens.
pub fn clean_movetext(text: &str) -> Vec<String> {
    let mut cleaned = String::with_capacity(text.len());
    let mut brace = false;
    let mut paren_depth = 0usize;
    let mut line_comment = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if line_comment {
            if c == '\n' {
                line_comment = false;
                cleaned.push(' ');
            }
            continue;
        }
        if brace {
            if c == '}' {
                brace = false;
            }
            continue;
        }
        match c {
            '{' => brace = true,
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            _ if paren_depth > 0 => {}
            ';' => line_comment = true,
            '$' => {
                while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                    chars.next();
                }
            }
            '!' | '?' | '+' | '#' => {}
            _ => cleaned.push(c),
        }
    }

    cleaned
        .split_whitespace()
        .map(strip_move_number)
        .filter(|t| !t.is_empty() && !RESULT_TOKENS.contains(t))
        .map(str::to_string)
        .collect()
}

/// `12.e4` to `e4`, `3...` to nothing.
fn strip_move_number(token: &str) -> &str {
    let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && token[digits..].starts_with('.') {
        token[digits..].trim_start_matches('.')
    } else {
        token
    }
}
