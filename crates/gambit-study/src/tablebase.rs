//! Endgame tablebase response types and result interpretation.

use std::fmt;

use gambit_core::{Color, Position};
use serde::{Deserialize, Serialize};

/// Pieces on board at or below which a position is looked up.
pub const TABLEBASE_MAX_PIECES: usize = 7;

/// Outcome category from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Win,
    SyzygyWin,
    MaybeWin,
    CursedWin,
    Draw,
    Loss,
    SyzygyLoss,
    MaybeLoss,
    BlessedLoss,
    #[serde(other)]
    Unknown,
}

impl Category {
    /// Return `true` for any winning category.
    pub const fn is_win(self) -> bool {
        matches!(
            self,
            Category::Win | Category::SyzygyWin | Category::MaybeWin | Category::CursedWin
        )
    }

    /// Return `true` for any losing category.
    pub const fn is_loss(self) -> bool {
        matches!(
            self,
            Category::Loss | Category::SyzygyLoss | Category::MaybeLoss | Category::BlessedLoss
        )
    }
}

/// A tablebase verdict translated to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablebaseResult {
    WhiteWins,
    BlackWins,
    Draw,
    Unknown,
}

impl fmt::Display for TablebaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TablebaseResult::WhiteWins => "White wins",
            TablebaseResult::BlackWins => "Black wins",
            TablebaseResult::Draw => "Draw",
            TablebaseResult::Unknown => "Unknown",
        })
    }
}

/// Translate a side-to-move category into a result for one color.
pub fn result_for(category: Category, side_to_move: Color) -> TablebaseResult {
    let winner = if category.is_win() {
        side_to_move
    } else if category.is_loss() {
        side_to_move.other()
    } else if category == Category::Draw {
        return TablebaseResult::Draw;
    } else {
        return TablebaseResult::Unknown;
    };
    match winner {
        Color::White => TablebaseResult::WhiteWins,
        Color::Black => TablebaseResult::BlackWins,
    }
}

/// One candidate move in a tablebase response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablebaseMove {
    pub uci: String,
    pub san: String,
    pub dtz: Option<i32>,
    #[serde(default)]
    pub precise_dtz: Option<i32>,
    #[serde(default)]
    pub dtm: Option<i32>,
    pub category: Category,
}

/// Tablebase response for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablebaseEntry {
    pub dtz: Option<i32>,
    #[serde(default)]
    pub precise_dtz: Option<i32>,
    #[serde(default)]
    pub dtm: Option<i32>,
    #[serde(default)]
    pub checkmate: bool,
    #[serde(default)]
    pub stalemate: bool,
    #[serde(default)]
    pub insufficient_material: bool,
    pub category: Category,
    #[serde(default)]
    pub moves: Vec<TablebaseMove>,
}

impl TablebaseEntry {
    /// Parse a JSON tablebase response.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Return `true` if `position` is small enough to look up.
pub fn is_probeable(position: &Position) -> bool {
    position.piece_count() <= TABLEBASE_MAX_PIECES
}

/// Query-string form of a FEN: spaces become underscores.
pub fn query_key(position: &Position) -> String {
    position.fen().replace(' ', "_")
}
