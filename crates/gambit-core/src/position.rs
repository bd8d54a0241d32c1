//! Immutable position snapshots with FEN and EPD serialization.

use std::fmt;
use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position as _, Rank, Role, Square};

use crate::error::PositionError;

/// The FEN string for the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A complete board state: placement, side to move, castling rights,
/// en passant target, and both move clocks.
///
/// Positions are never mutated. Applying a move produces a new one, so a
/// history can keep every step it has visited.
#[derive(Clone)]
pub struct Position {
    chess: Chess,
    /// Cached FEN; the EPD key is a prefix of it.
    fen: String,
    epd_len: usize,
}

impl Position {
    /// Return the standard starting position.
    pub fn starting_position() -> Position {
        Position::from_chess(Chess::default())
    }

    pub(crate) fn from_chess(chess: Chess) -> Position {
        let fen = Fen::from_position(&chess, EnPassantMode::Legal).to_string();
        let epd_len = epd_prefix_len(&fen);
        Position { chess, fen, epd_len }
    }

    pub(crate) fn chess(&self) -> &Chess {
        &self.chess
    }

    /// Full FEN, including halfmove clock and fullmove number.
    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// The squares-only key: placement, side to move, castling, en passant.
    ///
    /// Two positions with the same key are the same position for repetition
    /// and opening lookup, regardless of their move clocks.
    pub fn epd(&self) -> &str {
        &self.fen[..self.epd_len]
    }

    /// The side to move.
    pub fn side_to_move(&self) -> Color {
        self.chess.turn()
    }

    /// Return `true` if the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.chess.is_check()
    }

    /// Number of pieces of both colors on the board.
    pub fn piece_count(&self) -> usize {
        self.chess.board().occupied().count()
    }

    /// Halfmove clock for the fifty-move rule.
    pub fn halfmove_clock(&self) -> u32 {
        self.chess.halfmoves()
    }

    /// Fullmove number (starts at 1, incremented after Black moves).
    pub fn fullmove_number(&self) -> u32 {
        self.chess.fullmoves().get()
    }

    /// The FEN character of the piece on `sq`, uppercase for White.
    pub fn piece_char(&self, sq: Square) -> Option<char> {
        self.chess.board().piece_at(sq).map(|piece| piece.char())
    }

    pub(crate) fn is_pawn_on(&self, sq: Square) -> bool {
        self.chess
            .board()
            .piece_at(sq)
            .is_some_and(|piece| piece.role == Role::Pawn && piece.color == self.chess.turn())
    }

    pub(crate) fn is_last_rank_for_mover(&self, sq: Square) -> bool {
        match self.chess.turn() {
            Color::White => sq.rank() == Rank::Eighth,
            Color::Black => sq.rank() == Rank::First,
        }
    }

    /// Wrapper for pretty-printing the board as an 8x8 grid.
    pub fn pretty(&self, orientation: Color) -> PrettyPosition<'_> {
        PrettyPosition {
            position: self,
            orientation,
        }
    }
}

/// Byte length of the first four FEN fields.
fn epd_prefix_len(fen: &str) -> usize {
    fen.match_indices(' ')
        .nth(3)
        .map_or(fen.len(), |(index, _)| index)
}

impl Default for Position {
    fn default() -> Self {
        Position::starting_position()
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(fen: &str) -> Result<Position, PositionError> {
        let trimmed = fen.trim();
        let parsed: Fen = trimmed.parse().map_err(|e| PositionError::MalformedFen {
            fen: trimmed.to_string(),
            reason: format!("{e}"),
        })?;
        let chess: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| PositionError::IllegalPosition {
                fen: trimmed.to_string(),
                reason: format!("{e}"),
            })?;
        Ok(Position::from_chess(chess))
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.fen == other.fen
    }
}

impl Eq for Position {}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(\"{}\")", self.fen)
    }
}

/// Board grid seen from one side.
pub struct PrettyPosition<'a> {
    position: &'a Position,
    orientation: Color,
}

impl fmt::Display for PrettyPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let white_view = self.orientation == Color::White;
        let ranks: Vec<u32> = if white_view {
            (0..8).rev().collect()
        } else {
            (0..8).collect()
        };
        let files: Vec<u32> = if white_view {
            (0..8).collect()
        } else {
            (0..8).rev().collect()
        };

        for &rank in &ranks {
            write!(f, "{}  ", rank + 1)?;
            for (i, &file) in files.iter().enumerate() {
                let sq = Square::from_coords(shakmaty::File::new(file), Rank::new(rank));
                let c = self.position.piece_char(sq).unwrap_or('.');
                if i < 7 {
                    write!(f, "{c} ")?;
                } else {
                    write!(f, "{c}")?;
                }
            }
            writeln!(f)?;
        }
        if white_view {
            write!(f, "   a b c d e f g h")
        } else {
            write!(f, "   h g f e d c b a")
        }
    }
}
