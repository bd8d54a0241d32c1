//! Shell errors.

use gambit_core::{MoveError, ParseMoveError};
use gambit_study::{LoadError, PuzzleError};

/// Errors that can occur while handling a shell command.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// A command was given without its required argument.
    #[error("{command}: missing argument")]
    MissingArgument {
        /// The command name.
        command: &'static str,
    },

    /// A move argument is not long-algebraic move text.
    #[error("invalid move \"{text}\": {source}")]
    InvalidMove {
        /// The move text that failed to parse.
        text: String,
        /// Parser error.
        source: ParseMoveError,
    },

    /// A `goto` target is neither a ply index nor `start`/`end`.
    #[error("invalid ply: {value}")]
    InvalidPly {
        /// The text that failed to parse.
        value: String,
    },

    /// A `goto` ply is outside the committed history.
    #[error("ply {ply} is out of range (history has {len} moves)")]
    PlyOutOfRange {
        /// The requested ply.
        ply: isize,
        /// Number of committed moves.
        len: usize,
    },

    /// `undo` at the start position or `redo` at the tip.
    #[error("nothing to {action}")]
    NothingTo {
        /// The navigation that could not move.
        action: &'static str,
    },

    /// `set` named an option the session does not have.
    #[error("unknown option: {name}")]
    UnknownOption {
        /// The option name.
        name: String,
    },

    /// `set` gave a value the option does not accept.
    #[error("invalid value for {name}: {value}")]
    InvalidOptionValue {
        /// The option name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The line is not a known command.
    #[error("unknown command: {name}")]
    UnknownCommand {
        /// First word of the line.
        name: String,
    },

    /// A tablebase response was given for a position with too many pieces.
    #[error("position has {pieces} pieces; tablebases cover at most {max}")]
    NotProbeable {
        /// Pieces on the board.
        pieces: usize,
        /// Largest probeable piece count.
        max: usize,
    },

    /// A tablebase response is not valid JSON for a tablebase result.
    #[error("invalid tablebase response: {source}")]
    Tablebase {
        /// Underlying parser error.
        source: serde_json::Error,
    },

    /// `hint` without an active puzzle.
    #[error("no puzzle in progress")]
    NoPuzzle,

    /// The board refused a move.
    #[error(transparent)]
    Move(#[from] MoveError),

    /// A move sequence could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A puzzle could not be selected or started.
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),

    /// An I/O error occurred while reading input or writing output.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
