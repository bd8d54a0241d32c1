//! Study-board state on top of `gambit-core`: the move history with its
//! browse cursor, opening explorer, puzzle trainer and lookup bookkeeping.

mod error;
mod history;
mod lookup;
mod openings;
mod puzzles;
mod tablebase;

pub use error::{DatasetError, LoadError, PuzzleError};
pub use history::MoveHistory;
pub use lookup::{LookupCache, LookupTicket};
pub use openings::{ChessPhase, Continuation, LineInfo, Opening, OpeningBook, ReachedOpening};
pub use puzzles::{Puzzle, PuzzleProgress, PuzzleRecord, PuzzleSession, PuzzleSet};
pub use tablebase::{
    Category, TABLEBASE_MAX_PIECES, TablebaseEntry, TablebaseMove, TablebaseResult, is_probeable,
    query_key, result_for,
};
