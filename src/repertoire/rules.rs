//! Board state and move legality.
//!
//! Drill sessions never reason about chess themselves. They hand candidate moves
//! to a [`RulesEngine`] and compare the SAN it reports against the recorded line.
//! [`ChessBoard`] is the production engine, backed by the `chess` crate's legal
//! move generator.

use crate::model::Color;
use chess::{Board, BoardStatus, ChessMove, File, MoveGen, Piece, Rank, Square};
use std::str::FromStr;

pub trait RulesEngine {
    /// Back to the standard starting position with an empty history.
    fn reset(&mut self);

    /// Plays a move given by squares (`"e2"`, `"e4"`). Returns its SAN, or
    /// `None` when the move is illegal. The position is unchanged on `None`.
    fn play_squares(&mut self, from: &str, to: &str, promotion: Option<char>) -> Option<String>;

    /// Plays a move written in SAN. Lenient parsing also accepts move numbers,
    /// annotation glyphs, `0-0` castling and coordinate notation (`e2e4`).
    fn play_san(&mut self, text: &str, lenient: bool) -> Option<String>;

    /// Takes back the last move, returning its SAN.
    fn undo(&mut self) -> Option<String>;

    fn turn(&self) -> Color;

    fn is_check(&self) -> bool;

    fn is_checkmate(&self) -> bool;

    fn is_draw(&self) -> bool;

    fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    fn fen(&self) -> String;

    /// SAN of every move played since the last reset.
    fn history(&self) -> Vec<String>;
}

/// Strips check, mate and annotation suffixes so `Nf3+` and `Nf3` compare equal.
pub fn san_core(san: &str) -> &str {
    san.trim()
        .trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'))
}

#[derive(Debug, Clone, Default)]
pub struct ChessBoard {
    board: Board,
    played: Vec<(Board, String)>,
}

impl ChessBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn apply(&mut self, mv: ChessMove) -> String {
        let san = san_for(&self.board, mv);
        let next = self.board.make_move_new(mv);
        self.played.push((self.board, san.clone()));
        self.board = next;
        san
    }

    fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board).collect()
    }

    fn find_coordinate(&self, text: &str) -> Option<ChessMove> {
        let text = text.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return None;
        }
        let from = Square::from_str(&text[0..2]).ok()?;
        let to = Square::from_str(&text[2..4]).ok()?;
        let promotion = self.promotion_for(from, to, text.chars().nth(4))?;
        let mv = ChessMove::new(from, to, promotion);
        self.legal_moves().into_iter().find(|m| *m == mv)
    }

    /// Promotion piece for a move given by squares. The choice only counts
    /// for a pawn reaching the last rank, where it defaults to a queen. The
    /// outer `None` means the choice is not a piece.
    fn promotion_for(&self, from: Square, to: Square, choice: Option<char>) -> Option<Option<Piece>> {
        let promotes = self.board.piece_on(from) == Some(Piece::Pawn)
            && matches!(to.get_rank(), Rank::First | Rank::Eighth);
        match (promotes, choice) {
            (false, _) => Some(None),
            (true, Some(c)) => promotion_piece(c).map(Some),
            (true, None) => Some(Some(Piece::Queen)),
        }
    }

    fn find_san(&self, san: &str) -> Option<ChessMove> {
        let clean = san_core(san);
        let legal = self.legal_moves();

        if clean == "O-O" || clean == "O-O-O" {
            let kingside = clean == "O-O";
            return legal.into_iter().find(|m| {
                self.board.piece_on(m.get_source()) == Some(Piece::King)
                    && castle_side(*m) == Some(kingside)
            });
        }

        let (piece, rest) = match clean.chars().next()? {
            'K' => (Piece::King, &clean[1..]),
            'Q' => (Piece::Queen, &clean[1..]),
            'R' => (Piece::Rook, &clean[1..]),
            'B' => (Piece::Bishop, &clean[1..]),
            'N' => (Piece::Knight, &clean[1..]),
            c if c.is_ascii_lowercase() => (Piece::Pawn, clean),
            _ => return None,
        };

        let (rest, promotion) = match rest.find('=') {
            Some(pos) => {
                let promo = rest[pos + 1..].chars().next().and_then(promotion_piece)?;
                (&rest[..pos], Some(promo))
            }
            None => (rest, None),
        };

        let rest: String = rest.chars().filter(|c| *c != 'x').collect();
        if rest.len() < 2 || !rest.is_ascii() {
            return None;
        }
        let dest = Square::from_str(&rest[rest.len() - 2..]).ok()?;
        let disambig = &rest[..rest.len() - 2];

        let candidates: Vec<ChessMove> = legal
            .into_iter()
            .filter(|m| {
                m.get_dest() == dest
                    && self.board.piece_on(m.get_source()) == Some(piece)
                    && m.get_promotion() == promotion
                    && matches_disambiguation(m.get_source(), disambig)
            })
            .collect();

        match candidates.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

impl RulesEngine for ChessBoard {
    fn reset(&mut self) {
        self.board = Board::default();
        self.played.clear();
    }

    fn play_squares(&mut self, from: &str, to: &str, promotion: Option<char>) -> Option<String> {
        let from = Square::from_str(from.trim()).ok()?;
        let to = Square::from_str(to.trim()).ok()?;
        let promotion = self.promotion_for(from, to, promotion)?;
        let mv = ChessMove::new(from, to, promotion);
        if !self.board.legal(mv) {
            return None;
        }
        Some(self.apply(mv))
    }

    fn play_san(&mut self, text: &str, lenient: bool) -> Option<String> {
        let mv = if lenient {
            let token = lenient_token(text);
            self.find_san(&token)
                .or_else(|| self.find_san(&with_promotion_sign(&token)?))
                .or_else(|| self.find_coordinate(&token))?
        } else {
            self.find_san(text)?
        };
        Some(self.apply(mv))
    }

    fn undo(&mut self) -> Option<String> {
        let (previous, san) = self.played.pop()?;
        self.board = previous;
        Some(san)
    }

    fn turn(&self) -> Color {
        match self.board.side_to_move() {
            chess::Color::White => Color::White,
            chess::Color::Black => Color::Black,
        }
    }

    fn is_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    fn is_draw(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate || insufficient_material(&self.board)
    }

    fn fen(&self) -> String {
        self.board.to_string()
    }

    fn history(&self) -> Vec<String> {
        self.played.iter().map(|(_, san)| san.clone()).collect()
    }
}

fn promotion_piece(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        _ => None,
    }
}

fn piece_letter(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "",
        Piece::Knight => "N",
        Piece::Bishop => "B",
        Piece::Rook => "R",
        Piece::Queen => "Q",
        Piece::King => "K",
    }
}

fn file_char(file: File) -> char {
    (b'a' + file.to_index() as u8) as char
}

fn rank_char(rank: Rank) -> char {
    (b'1' + rank.to_index() as u8) as char
}

/// `Some(true)` for a kingside castle, `Some(false)` for queenside.
fn castle_side(mv: ChessMove) -> Option<bool> {
    let from = mv.get_source().get_file().to_index();
    let to = mv.get_dest().get_file().to_index();
    match to as isize - from as isize {
        2 => Some(true),
        -2 => Some(false),
        _ => None,
    }
}

fn matches_disambiguation(source: Square, hint: &str) -> bool {
    hint.chars().all(|c| match c {
        'a'..='h' => file_char(source.get_file()) == c,
        '1'..='8' => rank_char(source.get_rank()) == c,
        _ => false,
    })
}

/// Standard algebraic notation for a legal `mv` on `board`.
fn san_for(board: &Board, mv: ChessMove) -> String {
    let source = mv.get_source();
    let dest = mv.get_dest();
    let piece = board.piece_on(source).unwrap_or(Piece::Pawn);

    let mut san = String::new();
    match (piece, castle_side(mv)) {
        (Piece::King, Some(true)) => san.push_str("O-O"),
        (Piece::King, Some(false)) => san.push_str("O-O-O"),
        _ => {
            let capture =
                board.piece_on(dest).is_some() || (piece == Piece::Pawn && source.get_file() != dest.get_file());
            san.push_str(piece_letter(piece));

            if piece == Piece::Pawn {
                if capture {
                    san.push(file_char(source.get_file()));
                }
            } else {
                let rivals: Vec<Square> = MoveGen::new_legal(board)
                    .filter(|m| {
                        m.get_dest() == dest
                            && m.get_source() != source
                            && board.piece_on(m.get_source()) == Some(piece)
                    })
                    .map(|m| m.get_source())
                    .collect();
                if !rivals.is_empty() {
                    let same_file = rivals.iter().any(|s| s.get_file() == source.get_file());
                    let same_rank = rivals.iter().any(|s| s.get_rank() == source.get_rank());
                    if !same_file {
                        san.push(file_char(source.get_file()));
                    } else if !same_rank {
                        san.push(rank_char(source.get_rank()));
                    } else {
                        san.push(file_char(source.get_file()));
                        san.push(rank_char(source.get_rank()));
                    }
                }
            }

            if capture {
                san.push('x');
            }
            san.push(file_char(dest.get_file()));
            san.push(rank_char(dest.get_rank()));

            if let Some(promo) = mv.get_promotion() {
                san.push('=');
                san.push_str(piece_letter(promo));
            }
        }
    }

    let after = board.make_move_new(mv);
    match after.status() {
        BoardStatus::Checkmate => san.push('#'),
        _ if after.checkers().popcnt() > 0 => san.push('+'),
        _ => {}
    }
    san
}

/// Strips move numbers and annotations and normalizes zero-castling.
fn lenient_token(text: &str) -> String {
    let token = text.trim();
    let token = match token.rfind('.') {
        Some(pos) => &token[pos + 1..],
        None => token,
    };
    let token = san_core(token);
    match token {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        other => other.to_string(),
    }
}

/// `bxa8Q` becomes `bxa8=Q`. `None` when the token has no bare promotion.
fn with_promotion_sign(token: &str) -> Option<String> {
    if token.contains('=') {
        return None;
    }
    let mut chars = token.chars().rev();
    let piece = chars.next().filter(|c| "QRBNqrbn".contains(*c))?;
    chars.next().filter(|c| matches!(*c, '1' | '8'))?;
    let head = &token[..token.len() - piece.len_utf8()];
    Some(format!("{}={}", head, piece.to_ascii_uppercase()))
}

/// Bare kings, or a king and a single minor piece against a bare king.
fn insufficient_material(board: &Board) -> bool {
    let pieces = board.combined().popcnt();
    if pieces == 2 {
        return true;
    }
    if pieces == 3 {
        let minors = (*board.pieces(Piece::Knight) | *board.pieces(Piece::Bishop)).popcnt();
        return minors == 1;
    }
    false
}
