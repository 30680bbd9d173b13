use crate::error::{RepertoireError, Result};
use crate::rules::{ChessBoard, RulesEngine};

/// A line replayed on a board: canonical SAN plus the resulting position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedLine {
    pub moves: Vec<String>,
    pub pgn: String,
    pub fen: String,
}

/// Plays `moves` from the starting position, accepting loose notation, and
/// returns them in canonical SAN. The first illegal move aborts the replay.
pub fn replay_line(moves: &[String]) -> Result<ReplayedLine> {
    let mut board = ChessBoard::new();
    let mut canonical = Vec::with_capacity(moves.len());
    for (ply, mv) in moves.iter().enumerate() {
        let san = board.play_san(mv, true).ok_or_else(|| {
            RepertoireError::Parse(format!("Illegal move '{}' at ply {}", mv, ply + 1))
        })?;
        canonical.push(san);
    }
    Ok(ReplayedLine {
        pgn: movetext(&canonical),
        fen: board.fen(),
        moves: canonical,
    })
}

/// Numbered PGN movetext: `1. e4 e5 2. Nf3`.
pub fn movetext(moves: &[String]) -> String {
    moves
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits free text into move tokens. Commas and whitespace both separate.
pub fn tokenize_moves(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::line;

    #[test]
    fn replay_canonicalizes_loose_notation() {
        let replayed = replay_line(&line("1.e4 e7e5 Nf3 Nc6 Bc4 Bc5 0-0")).unwrap();
        assert_eq!(replayed.moves, line("e4 e5 Nf3 Nc6 Bc4 Bc5 O-O"));
        assert_eq!(replayed.pgn, "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O");
        assert!(replayed.fen.contains(" b "));
    }

    #[test]
    fn replay_reports_first_illegal_ply() {
        let err = replay_line(&line("e4 e5 Ke3")).unwrap_err();
        assert!(err.to_string().contains("ply 3"));
    }

    #[test]
    fn tokenize_accepts_commas() {
        assert_eq!(tokenize_moves("e4, e5  Nf3"), line("e4 e5 Nf3"));
    }
}
