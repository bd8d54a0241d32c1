//! Error types for history loads and study datasets.

use gambit_core::{MoveError, NotationError, ParseMoveError};

/// A move sequence could not be loaded. The history is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// A token is not valid long-algebraic move text.
    #[error("ply {ply}: cannot read \"{token}\": {source}")]
    BadToken {
        /// Zero-based ply index of the token.
        ply: usize,
        /// The offending token.
        token: String,
        /// Parser error.
        source: ParseMoveError,
    },
    /// A SAN token does not resolve to a legal move.
    #[error("ply {ply}: {source}")]
    BadNotation {
        /// Zero-based ply index of the token.
        ply: usize,
        /// Resolution error.
        source: NotationError,
    },
    /// A move is well-formed but cannot be played at its point in the line.
    #[error("ply {ply}: cannot play \"{token}\": {source}")]
    Rejected {
        /// Zero-based ply index of the move.
        ply: usize,
        /// The offending move text.
        token: String,
        /// Why the move was refused.
        source: MoveError,
    },
}

impl LoadError {
    /// Zero-based ply index where the load stopped.
    pub fn ply(&self) -> usize {
        match self {
            LoadError::BadToken { ply, .. }
            | LoadError::BadNotation { ply, .. }
            | LoadError::Rejected { ply, .. } => *ply,
        }
    }
}

/// Errors from reading an opening or puzzle dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The dataset has no header row.
    #[error("dataset is empty")]
    Empty,
    /// A required column is absent from the header.
    #[error("missing column \"{column}\"")]
    MissingColumn {
        /// Name of the absent column.
        column: &'static str,
    },
    /// A row lacks a value for a required column.
    #[error("row {row}: missing value for \"{column}\"")]
    MissingField {
        /// One-based data row number.
        row: usize,
        /// Name of the empty column.
        column: &'static str,
    },
    /// A row's move line does not replay from the start position.
    #[error("row {row} ({name}): {source}")]
    BadLine {
        /// One-based data row number, or record index.
        row: usize,
        /// Opening name or puzzle id.
        name: String,
        /// Why the line failed.
        source: LoadError,
    },
    /// The JSON document does not match the record layout.
    #[error("invalid JSON: {source}")]
    Json {
        /// Underlying parser error.
        #[from]
        source: serde_json::Error,
    },
    /// The dataset file could not be read.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// A puzzle could not be selected or started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    /// No puzzle has the requested id.
    #[error("no puzzle with id \"{id}\"")]
    UnknownId {
        /// The requested id.
        id: String,
    },
    /// No puzzle carries the requested theme.
    #[error("no puzzle with theme \"{theme}\"")]
    NoMatch {
        /// The requested theme.
        theme: String,
    },
    /// The puzzle set is empty.
    #[error("no puzzles loaded")]
    Empty,
    /// The puzzle line does not play from the board's start position.
    #[error("cannot set up puzzle: {source}")]
    Load {
        /// Why the line failed.
        #[from]
        source: LoadError,
    },
}
