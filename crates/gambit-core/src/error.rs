//! Error types for move input, position parsing, and notation.

use shakmaty::Square;

use crate::chess_move::Move;
use crate::status::Termination;

/// Why a move could not be applied to a position.
///
/// Every variant is an ordinary outcome of speculative input: the position is
/// left as it was and the caller simply re-prompts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The origin square is empty.
    #[error("no piece on {origin}")]
    NoPieceOnOrigin {
        /// The empty origin square.
        origin: Square,
    },
    /// The piece on the origin square belongs to the side not on move.
    #[error("piece on {origin} does not belong to the side to move")]
    WrongSideToMove {
        /// The origin square.
        origin: Square,
    },
    /// A pawn move to the last rank was submitted without a promotion piece.
    #[error("move {mv} reaches the last rank and needs a promotion piece")]
    PromotionRequired {
        /// The incomplete move.
        mv: Move,
    },
    /// The move is not among the legal moves of the position.
    #[error("illegal move: {mv}")]
    IllegalMove {
        /// The rejected move.
        mv: Move,
    },
    /// The position is already decided; no further moves are accepted.
    #[error("game over: {reason}")]
    GameOver {
        /// Why the game ended.
        reason: Termination,
    },
}

/// Errors from parsing compact long-algebraic move text such as `e2e4` or `a7a8q`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseMoveError {
    /// The text is not 4 or 5 characters long.
    #[error("expected 4 or 5 characters, found {length}")]
    BadLength {
        /// Length of the rejected text.
        length: usize,
    },
    /// One of the two squares is not a valid algebraic square.
    #[error("invalid square: \"{found}\"")]
    InvalidSquare {
        /// The rejected square text.
        found: String,
    },
    /// The fifth character is not one of `n`, `b`, `r`, `q`.
    #[error("invalid promotion piece: '{character}'")]
    InvalidPromotion {
        /// The rejected character.
        character: char,
    },
}

/// Errors from parsing a FEN string into a position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// The text is not syntactically valid FEN.
    #[error("malformed FEN \"{fen}\": {reason}")]
    MalformedFen {
        /// The rejected FEN text.
        fen: String,
        /// Parser message.
        reason: String,
    },
    /// The FEN parses but describes an impossible position.
    #[error("illegal position \"{fen}\": {reason}")]
    IllegalPosition {
        /// The rejected FEN text.
        fen: String,
        /// Validation message.
        reason: String,
    },
}

/// Errors from resolving a SAN token against a position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    /// The token is not syntactically valid SAN.
    #[error("not a SAN move: \"{token}\"")]
    Unparsable {
        /// The rejected token.
        token: String,
    },
    /// The token is valid SAN but matches no legal move, or several.
    #[error("SAN move \"{token}\" is illegal or ambiguous here")]
    Unresolved {
        /// The rejected token.
        token: String,
    },
}
