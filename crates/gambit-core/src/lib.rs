//! Core chess types for the study board: positions, move input, and the
//! position engine that decides legality and game-over state.

mod chess_move;
mod engine;
mod error;
mod notation;
mod position;
mod status;

pub use chess_move::{Move, PromotionPiece, parse_uci_line};
pub use engine::{
    Destinations, FIFTY_MOVE_PLIES, PlayedMove, PositionEngine, REPETITION_LIMIT, replay,
};
pub use error::{MoveError, NotationError, ParseMoveError, PositionError};
pub use notation::{MoveRow, move_rows, movetext, parse_movetext};
pub use position::{Position, PrettyPosition, STARTING_FEN};
pub use status::{GameStatus, Termination};

pub use shakmaty::{Color, Square};
