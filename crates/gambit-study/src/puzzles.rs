//! Tactics puzzles: a JSON dataset, random selection by theme, and progress
//! tracking against a study board's history.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use gambit_core::{Move, ParseMoveError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DatasetError, LoadError, PuzzleError};
use crate::history::MoveHistory;

const BUILTIN_JSON: &str = include_str!("../data/puzzles.json");

/// A puzzle as stored in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub id: String,
    /// Space-separated theme tags.
    #[serde(default)]
    pub themes: String,
    /// Movetext leading to the puzzle position.
    pub pgn: String,
    /// Solution moves in long algebraic notation, replies included.
    pub solution: Vec<String>,
}

/// A validated puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    id: String,
    themes: Vec<String>,
    pgn: String,
    initial: Vec<Move>,
    solution: Vec<Move>,
    solution_sans: Vec<String>,
}

impl Puzzle {
    /// Check that the record's movetext and solution replay from the
    /// standard start position.
    pub fn from_record(record: PuzzleRecord) -> Result<Puzzle, LoadError> {
        let mut history = MoveHistory::new();
        history.load_pgn(&record.pgn)?;
        let initial = history.moves();

        for (i, token) in record.solution.iter().enumerate() {
            let ply = initial.len() + i;
            let mv = token
                .parse::<Move>()
                .map_err(|source: ParseMoveError| LoadError::BadToken {
                    ply,
                    token: token.clone(),
                    source,
                })?;
            history
                .play_move(mv)
                .map_err(|source| LoadError::Rejected {
                    ply,
                    token: token.clone(),
                    source,
                })?;
        }

        let solution = history.moves().split_off(initial.len());
        let solution_sans = history
            .sans()
            .into_iter()
            .skip(initial.len())
            .map(str::to_string)
            .collect();
        Ok(Puzzle {
            id: record.id,
            themes: record.themes.split_whitespace().map(str::to_string).collect(),
            pgn: record.pgn,
            initial,
            solution,
            solution_sans,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    pub fn has_theme(&self, theme: &str) -> bool {
        self.themes.iter().any(|t| t == theme)
    }

    /// Movetext leading to the puzzle position.
    pub fn pgn(&self) -> &str {
        &self.pgn
    }

    /// Moves leading to the puzzle position.
    pub fn initial_moves(&self) -> &[Move] {
        &self.initial
    }

    pub fn solution(&self) -> &[Move] {
        &self.solution
    }

    /// The solution in SAN, from the puzzle position.
    pub fn solution_san(&self) -> &[String] {
        &self.solution_sans
    }
}

/// A collection of puzzles.
#[derive(Debug, Clone, Default)]
pub struct PuzzleSet {
    puzzles: Vec<Puzzle>,
}

impl PuzzleSet {
    /// The embedded puzzle set.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_JSON).unwrap_or_default()
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse a JSON array of records, validating every puzzle.
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let records: Vec<PuzzleRecord> = serde_json::from_str(json)?;
        let puzzles = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let name = record.id.clone();
                Puzzle::from_record(record).map_err(|source| DatasetError::BadLine {
                    row: i + 1,
                    name,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(puzzles = puzzles.len(), "loaded puzzle set");
        Ok(PuzzleSet { puzzles })
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    pub fn by_id(&self, id: &str) -> Result<&Puzzle, PuzzleError> {
        self.puzzles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PuzzleError::UnknownId { id: id.to_string() })
    }

    /// Every theme tag in the set, sorted.
    pub fn themes(&self) -> Vec<&str> {
        self.puzzles
            .iter()
            .flat_map(|p| p.themes.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn filter_by_theme(&self, theme: &str) -> Vec<&Puzzle> {
        self.puzzles.iter().filter(|p| p.has_theme(theme)).collect()
    }

    /// A uniformly random puzzle, restricted to `theme` when given.
    pub fn random<R: Rng + ?Sized>(&self, theme: Option<&str>, rng: &mut R) -> Option<&Puzzle> {
        let candidates: Vec<&Puzzle> = match theme {
            Some(theme) => self.filter_by_theme(theme),
            None => self.puzzles.iter().collect(),
        };
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}

/// How far a history has followed a puzzle's solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleProgress {
    /// The committed line left the puzzle.
    Diverged,
    /// `matched` solution moves have been played.
    InProgress { matched: usize },
    Solved,
}

/// A puzzle being worked on a study board.
#[derive(Debug, Clone)]
pub struct PuzzleSession {
    puzzle: Puzzle,
}

impl PuzzleSession {
    /// Load the puzzle position into `history` and start tracking.
    pub fn start(puzzle: &Puzzle, history: &mut MoveHistory) -> Result<Self, PuzzleError> {
        history.load_sequence(&puzzle.initial)?;
        debug!(id = %puzzle.id, "puzzle started");
        Ok(PuzzleSession {
            puzzle: puzzle.clone(),
        })
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    /// Compare the committed line of `history` with the puzzle.
    pub fn progress(&self, history: &MoveHistory) -> PuzzleProgress {
        let committed = history.moves();
        let initial = &self.puzzle.initial;
        if committed.len() < initial.len() || committed[..initial.len()] != initial[..] {
            return PuzzleProgress::Diverged;
        }
        let played = &committed[initial.len()..];
        let solution = &self.puzzle.solution;
        if played.len() > solution.len() || solution[..played.len()] != *played {
            return PuzzleProgress::Diverged;
        }
        if played.len() == solution.len() {
            PuzzleProgress::Solved
        } else {
            PuzzleProgress::InProgress {
                matched: played.len(),
            }
        }
    }

    /// The next solution move, if the puzzle is still being followed.
    pub fn expected_move(&self, history: &MoveHistory) -> Option<Move> {
        match self.progress(history) {
            PuzzleProgress::InProgress { matched } => Some(self.puzzle.solution[matched]),
            _ => None,
        }
    }

    /// The opponent's scripted reply, when it is the opponent's turn.
    pub fn opponent_reply(&self, history: &MoveHistory) -> Option<Move> {
        match self.progress(history) {
            PuzzleProgress::InProgress { matched } if matched % 2 == 1 => {
                Some(self.puzzle.solution[matched])
            }
            _ => None,
        }
    }

    pub fn solution_san(&self) -> &[String] {
        self.puzzle.solution_san()
    }

    pub fn is_solved(&self, history: &MoveHistory) -> bool {
        self.progress(history) == PuzzleProgress::Solved
    }
}
