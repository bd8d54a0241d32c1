//! Game-over classification.

use std::fmt;

/// Why a game is over.
///
/// Declaration order is precedence order: when several apply to the same
/// position, the earliest variant is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    Checkmate,
    Stalemate,
    ThreefoldRepetition,
    InsufficientMaterial,
    FiftyMoveRule,
}

impl Termination {
    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Termination::Checkmate => "Checkmate",
            Termination::Stalemate => "Draw, Stalemate",
            Termination::ThreefoldRepetition => "Draw, Threefold Repetition",
            Termination::InsufficientMaterial => "Draw, Insufficient Material",
            Termination::FiftyMoveRule => "Draw, Fifty-Move Rule",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether play can continue from a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameStatus {
    #[default]
    Ongoing,
    Over(Termination),
}

impl GameStatus {
    /// Return `true` if the game has ended.
    pub const fn is_over(self) -> bool {
        matches!(self, GameStatus::Over(_))
    }

    /// The termination reason, or `None` while the game is ongoing.
    pub const fn reason(self) -> Option<Termination> {
        match self {
            GameStatus::Ongoing => None,
            GameStatus::Over(reason) => Some(reason),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Ongoing => f.write_str("Ongoing"),
            GameStatus::Over(reason) => write!(f, "{reason}"),
        }
    }
}
