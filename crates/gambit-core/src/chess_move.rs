//! Move input: an origin/destination pair with an optional promotion piece.

use std::fmt;
use std::str::FromStr;

use shakmaty::{Role, Square};

use crate::error::ParseMoveError;
use crate::position::Position;

/// The piece a pawn promotes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionPiece {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl PromotionPiece {
    /// All promotion pieces in index order.
    /// Convert to the oracle's piece role.
    pub const fn role(self) -> Role {
        match self {
            PromotionPiece::Knight => Role::Knight,
            PromotionPiece::Bishop => Role::Bishop,
            PromotionPiece::Rook => Role::Rook,
            PromotionPiece::Queen => Role::Queen,
        }
    }

    /// Return the lowercase long-algebraic character for this promotion.
    pub const fn uci_char(self) -> char {
        match self {
            PromotionPiece::Knight => 'n',
            PromotionPiece::Bishop => 'b',
            PromotionPiece::Rook => 'r',
            PromotionPiece::Queen => 'q',
        }
    }

    /// Parse a promotion character, either case.
    pub fn from_char(c: char) -> Option<PromotionPiece> {
        match c.to_ascii_lowercase() {
            'n' => Some(PromotionPiece::Knight),
            'b' => Some(PromotionPiece::Bishop),
            'r' => Some(PromotionPiece::Rook),
            'q' => Some(PromotionPiece::Queen),
            _ => None,
        }
    }

    pub(crate) fn from_role(role: Role) -> Option<PromotionPiece> {
        match role {
            Role::Knight => Some(PromotionPiece::Knight),
            Role::Bishop => Some(PromotionPiece::Bishop),
            Role::Rook => Some(PromotionPiece::Rook),
            Role::Queen => Some(PromotionPiece::Queen),
            _ => None,
        }
    }
}

/// A move as entered on the board.
///
/// Castling is written as the king's own step (`e1g1`, `e8c8`), the way a
/// piece is dragged on a board.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    origin: Square,
    dest: Square,
    promotion: Option<PromotionPiece>,
}

impl Move {
    /// Create a move without promotion.
    pub const fn new(origin: Square, dest: Square) -> Move {
        Move {
            origin,
            dest,
            promotion: None,
        }
    }

    /// Create a promotion move.
    pub const fn with_promotion(origin: Square, dest: Square, promo: PromotionPiece) -> Move {
        Move {
            origin,
            dest,
            promotion: Some(promo),
        }
    }

    /// The origin square.
    pub const fn origin(self) -> Square {
        self.origin
    }

    /// The destination square.
    pub const fn dest(self) -> Square {
        self.dest
    }

    /// The promotion piece, if any.
    pub const fn promotion(self) -> Option<PromotionPiece> {
        self.promotion
    }

    /// Return `true` if a promotion piece is attached.
    pub const fn is_promotion(self) -> bool {
        self.promotion.is_some()
    }

    /// Return `true` if this is a pawn move onto its last rank in `position`.
    ///
    /// Such a move is only legal with a promotion piece attached.
    pub fn reaches_last_rank(self, position: &Position) -> bool {
        position.is_pawn_on(self.origin) && position.is_last_rank_for_mover(self.dest)
    }

    /// Return this move with `promo` attached if it is a promotion that lacks one.
    ///
    /// Used by callers that apply a default-piece policy; the engine itself
    /// never guesses.
    pub fn or_promote(self, position: &Position, promo: PromotionPiece) -> Move {
        if self.promotion.is_none() && self.reaches_last_rank(position) {
            Move::with_promotion(self.origin, self.dest, promo)
        } else {
            self
        }
    }

    /// Return the compact long-algebraic string (`e2e4`, `e7e8q`).
    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.promotion {
            Some(promo) => write!(f, "{}{}{}", self.origin, self.dest, promo.uci_char()),
            None => write!(f, "{}{}", self.origin, self.dest),
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self})")
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Move, ParseMoveError> {
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(ParseMoveError::BadLength {
                length: s.chars().count(),
            });
        }

        let parse_square = |text: &str| {
            text.parse::<Square>()
                .map_err(|_| ParseMoveError::InvalidSquare {
                    found: text.to_string(),
                })
        };
        let origin = parse_square(&s[0..2])?;
        let dest = parse_square(&s[2..4])?;

        let promotion = match s[4..].chars().next() {
            Some(c) => Some(
                PromotionPiece::from_char(c)
                    .ok_or(ParseMoveError::InvalidPromotion { character: c })?,
            ),
            None => None,
        };

        Ok(Move {
            origin,
            dest,
            promotion,
        })
    }
}

/// Split a space-separated long-algebraic line (`"e2e4 e7e5 g1f3"`) into moves.
pub fn parse_uci_line(line: &str) -> Result<Vec<Move>, ParseMoveError> {
    line.split_whitespace().map(str::parse).collect()
}
