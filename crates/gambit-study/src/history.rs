//! Linear move history with a browse cursor.
//!
//! The history owns every position it has reached. Navigation (undo, redo,
//! jumping to a ply) only moves the cursor; the single destructive edit is
//! playing a move while viewing an earlier ply, which drops everything after
//! the cursor before appending.

use std::collections::HashMap;
use std::iter;

use gambit_core::{
    Color, Destinations, GameStatus, Move, MoveError, PlayedMove, Position, PositionEngine,
    movetext, parse_movetext, replay,
};
use tracing::debug;

use crate::error::LoadError;
use crate::lookup::LookupTicket;

#[derive(Debug, Clone)]
struct Step {
    played: PlayedMove,
    /// How often this step's position has occurred in the line up to this ply.
    occurrences: u32,
}

/// The move history of one study board.
///
/// Ply indices are zero-based; index `i` holds the move that produced the
/// `i+1`-th position. A cursor of `None` views the start position.
#[derive(Debug, Clone)]
pub struct MoveHistory {
    engine: PositionEngine,
    start: Position,
    steps: Vec<Step>,
    cursor: Option<usize>,
    /// Occurrences per EPD key over the whole committed line, start included.
    occurrences: HashMap<String, u32>,
    /// Bumped by every change of the viewed state.
    generation: u64,
}

impl MoveHistory {
    /// An empty history from the standard starting position.
    pub fn new() -> Self {
        MoveHistory::from_position(Position::starting_position())
    }

    /// An empty history from an arbitrary position.
    pub fn from_position(start: Position) -> Self {
        let occurrences = HashMap::from([(start.epd().to_string(), 1)]);
        MoveHistory {
            engine: PositionEngine::new(),
            start,
            steps: Vec::new(),
            cursor: None,
            occurrences,
            generation: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// The position the history starts from.
    pub fn start_position(&self) -> &Position {
        &self.start
    }

    /// The position currently viewed.
    pub fn position(&self) -> &Position {
        self.position_at(self.cursor)
    }

    /// The position after ply `ply`, or the start position for `None`.
    ///
    /// `ply` must be within the history.
    fn position_at(&self, ply: Option<usize>) -> &Position {
        match ply {
            Some(i) => self.steps[i].played.position(),
            None => &self.start,
        }
    }

    /// Number of committed moves.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Return `true` if no move has been committed.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Viewed ply, or `None` for the start position.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Viewed ply as a signed index in `-1..len`, `-1` being the start position.
    pub fn viewed_index(&self) -> isize {
        self.cursor.map_or(-1, |i| i as isize)
    }

    /// Index of the latest move, or `None` if the history is empty.
    pub fn tip(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }

    /// Return `true` if the latest position is viewed.
    pub fn is_at_tip(&self) -> bool {
        self.cursor == self.tip()
    }

    /// Return `true` if there is an earlier position to step back to.
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    /// Return `true` if there is a later position to step forward to.
    pub fn can_redo(&self) -> bool {
        !self.is_at_tip()
    }

    /// Every committed move, independent of the cursor.
    pub fn played(&self) -> impl ExactSizeIterator<Item = &PlayedMove> {
        self.steps.iter().map(|step| &step.played)
    }

    /// Committed moves as board input.
    pub fn moves(&self) -> Vec<Move> {
        self.played().map(PlayedMove::mv).collect()
    }

    /// Moves from the start position up to the cursor.
    pub fn viewed_moves(&self) -> Vec<Move> {
        let upto = self.cursor.map_or(0, |i| i + 1);
        self.played().take(upto).map(PlayedMove::mv).collect()
    }

    /// Committed moves in SAN.
    pub fn sans(&self) -> Vec<&str> {
        self.played().map(PlayedMove::san).collect()
    }

    /// The move that produced the viewed position.
    pub fn last_move(&self) -> Option<&PlayedMove> {
        self.cursor.map(|i| &self.steps[i].played)
    }

    /// Numbered movetext of the full committed line (`1. e4 e5 2. Nf3`).
    ///
    /// Browsing does not shorten it.
    pub fn notation(&self) -> String {
        movetext(&self.sans(), self.first_ply())
    }

    /// Ply number of the first move, counted from the standard start.
    fn first_ply(&self) -> usize {
        let moves_before = (self.start.fullmove_number() as usize).saturating_sub(1) * 2;
        match self.start.side_to_move() {
            Color::White => moves_before,
            Color::Black => moves_before + 1,
        }
    }

    /// The side to move in the viewed position.
    pub fn side_to_move(&self) -> Color {
        self.position().side_to_move()
    }

    /// Return `true` if the side to move is in check in the viewed position.
    pub fn is_check(&self) -> bool {
        self.engine.is_in_check(self.position())
    }

    /// How often the viewed position has occurred in the line up to the cursor.
    pub fn occurrences(&self) -> u32 {
        match self.cursor {
            Some(i) => self.steps[i].occurrences,
            None => 1,
        }
    }

    /// Game-over state of the viewed position.
    pub fn status(&self) -> GameStatus {
        self.engine.status(self.position(), self.occurrences())
    }

    /// Legal destinations from the viewed position; empty once the game is over.
    pub fn destinations(&self) -> Destinations {
        self.engine
            .legal_destinations(self.position(), self.occurrences())
    }

    /// The start position followed by each position up to the cursor, with
    /// the ply that produced it (`-1` for the start).
    pub fn viewed_line(&self) -> impl DoubleEndedIterator<Item = (isize, &Position)> {
        let upto = self.cursor.map_or(0, |i| i + 1);
        iter::once((-1, &self.start)).chain(
            self.steps[..upto]
                .iter()
                .enumerate()
                .map(|(i, step)| (i as isize, step.played.position())),
        )
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    /// Play `mv` from the viewed position.
    ///
    /// Moves after the cursor are discarded first. A viewed position that is
    /// already over accepts no move. On failure nothing changes.
    pub fn play_move(&mut self, mv: Move) -> Result<&PlayedMove, MoveError> {
        if let GameStatus::Over(reason) = self.status() {
            debug!(mv = %mv, reason = %reason, "move rejected after game end");
            return Err(MoveError::GameOver { reason });
        }
        let played = match self.engine.apply_move(self.position(), mv) {
            Ok(played) => played,
            Err(e) => {
                debug!(mv = %mv, error = %e, "move rejected");
                return Err(e);
            }
        };

        let keep = self.cursor.map_or(0, |i| i + 1);
        if keep < self.steps.len() {
            debug!(dropped = self.steps.len() - keep, "branching discards later moves");
            self.truncate(keep);
        }
        self.commit(played);
        self.cursor = self.tip();
        self.touch();
        Ok(&self.steps[self.steps.len() - 1].played)
    }

    /// Step back one ply. Returns `false` at the start position.
    pub fn undo(&mut self) -> bool {
        match self.cursor {
            None => false,
            Some(i) => {
                self.cursor = i.checked_sub(1);
                self.touch();
                true
            }
        }
    }

    /// Step forward one ply. Returns `false` at the tip.
    pub fn redo(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i + 1);
        if next >= self.steps.len() {
            return false;
        }
        self.cursor = Some(next);
        self.touch();
        true
    }

    /// View ply `index` (`-1` for the start position).
    ///
    /// Out-of-range indices are ignored and return `false`.
    pub fn go_to_index(&mut self, index: isize) -> bool {
        let target = match index {
            -1 => None,
            i if i >= 0 && (i as usize) < self.steps.len() => Some(i as usize),
            _ => return false,
        };
        if target != self.cursor {
            self.cursor = target;
            self.touch();
        }
        true
    }

    /// View the start position.
    pub fn go_to_start(&mut self) {
        self.go_to_index(-1);
    }

    /// View the latest position.
    pub fn go_to_end(&mut self) {
        if self.cursor != self.tip() {
            self.cursor = self.tip();
            self.touch();
        }
    }

    /// Replace the history with `moves` played from the start position.
    ///
    /// All or nothing: if any move fails, the history is left untouched.
    pub fn load_sequence(&mut self, moves: &[Move]) -> Result<(), LoadError> {
        let played = replay(&self.engine, &self.start, moves).map_err(|(ply, source)| {
            LoadError::Rejected {
                ply,
                token: moves[ply].to_string(),
                source,
            }
        });
        match played {
            Ok(played) => {
                self.replace(played);
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "load rejected");
                Err(e)
            }
        }
    }

    /// Load a space-separated long-algebraic line (`"e2e4 e7e5 g1f3"`).
    pub fn load_uci(&mut self, line: &str) -> Result<(), LoadError> {
        let moves = line
            .split_whitespace()
            .enumerate()
            .map(|(ply, token)| {
                token.parse::<Move>().map_err(|source| LoadError::BadToken {
                    ply,
                    token: token.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>();
        match moves {
            Ok(moves) => self.load_sequence(&moves),
            Err(e) => {
                debug!(error = %e, "load rejected");
                Err(e)
            }
        }
    }

    /// Load PGN movetext (`"1. e4 e5 2. Nf3"`, tags and comments allowed).
    pub fn load_pgn(&mut self, pgn: &str) -> Result<(), LoadError> {
        match self.resolve_pgn(pgn) {
            Ok(played) => {
                self.replace(played);
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "load rejected");
                Err(e)
            }
        }
    }

    fn resolve_pgn(&self, pgn: &str) -> Result<Vec<PlayedMove>, LoadError> {
        let mut played: Vec<PlayedMove> = Vec::new();
        for (ply, token) in parse_movetext(pgn).into_iter().enumerate() {
            let from = played.last().map_or(&self.start, PlayedMove::position);
            let mv = self
                .engine
                .parse_san(from, &token)
                .map_err(|source| LoadError::BadNotation { ply, source })?;
            let next = self
                .engine
                .apply_move(from, mv)
                .map_err(|source| LoadError::Rejected { ply, token, source })?;
            played.push(next);
        }
        Ok(played)
    }

    /// Clear every move and view the start position.
    pub fn reset(&mut self) {
        self.replace(Vec::new());
    }

    /// Issue a ticket for an external lookup keyed by the viewed position.
    pub fn ticket(&self) -> LookupTicket {
        LookupTicket::new(self.generation, self.position().fen())
    }

    /// Return `true` if nothing has changed since `ticket` was issued.
    pub fn accepts(&self, ticket: &LookupTicket) -> bool {
        ticket.generation() == self.generation && ticket.key() == self.position().fen()
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn replace(&mut self, played: Vec<PlayedMove>) {
        self.steps.clear();
        self.occurrences.clear();
        self.occurrences.insert(self.start.epd().to_string(), 1);
        for p in played {
            self.commit(p);
        }
        self.cursor = self.tip();
        self.touch();
    }

    fn commit(&mut self, played: PlayedMove) {
        let count = self
            .occurrences
            .entry(played.position().epd().to_string())
            .or_insert(0);
        *count += 1;
        let occurrences = *count;
        self.steps.push(Step {
            played,
            occurrences,
        });
    }

    fn truncate(&mut self, len: usize) {
        for step in self.steps.drain(len..) {
            let epd = step.played.position().epd();
            if let Some(count) = self.occurrences.get_mut(epd) {
                *count -= 1;
                if *count == 0 {
                    self.occurrences.remove(epd);
                }
            }
        }
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Default for MoveHistory {
    fn default() -> Self {
        MoveHistory::new()
    }
}
