//! Position engine: move legality, application, and terminal detection.
//!
//! All rule knowledge comes from the `shakmaty` rules engine. This module
//! translates board input into its vocabulary and back, and owns the few
//! policies layered on top (promotion must be explicit, game-over
//! precedence, empty destinations once the game is over).

use std::collections::{BTreeMap, BTreeSet};

use shakmaty::san::San;
use shakmaty::{File, Move as OracleMove, Position as _, Square};
use tracing::trace;

use crate::chess_move::{Move, PromotionPiece};
use crate::error::{MoveError, NotationError};
use crate::position::Position;
use crate::status::{GameStatus, Termination};

/// Occurrence count at which a position is drawn by repetition.
pub const REPETITION_LIMIT: u32 = 3;

/// Halfmove clock value at which the fifty-move rule ends the game.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Legal destination squares per origin square.
pub type Destinations = BTreeMap<Square, BTreeSet<Square>>;

/// A move that has been applied: the input, its SAN, and the resulting position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    mv: Move,
    san: String,
    position: Position,
}

impl PlayedMove {
    /// The move as entered.
    pub fn mv(&self) -> Move {
        self.mv
    }

    /// Standard algebraic notation, with `+` or `#` suffix.
    pub fn san(&self) -> &str {
        &self.san
    }

    /// The position after the move.
    pub fn position(&self) -> &Position {
        &self.position
    }
}

/// Stateless adapter over the rules engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionEngine;

impl PositionEngine {
    pub fn new() -> Self {
        PositionEngine
    }

    /// Apply `mv` to `position`.
    ///
    /// A last-rank pawn move without a promotion piece is rejected with
    /// [`MoveError::PromotionRequired`]; the engine never picks one.
    pub fn apply_move(&self, position: &Position, mv: Move) -> Result<PlayedMove, MoveError> {
        let chess = position.chess();
        let piece = chess
            .board()
            .piece_at(mv.origin())
            .ok_or(MoveError::NoPieceOnOrigin {
                origin: mv.origin(),
            })?;
        if piece.color != chess.turn() {
            return Err(MoveError::WrongSideToMove {
                origin: mv.origin(),
            });
        }
        if mv.promotion().is_none() && mv.reaches_last_rank(position) {
            return Err(MoveError::PromotionRequired { mv });
        }

        let legal = chess
            .legal_moves()
            .into_iter()
            .find(|candidate| matches_input(candidate, mv))
            .ok_or(MoveError::IllegalMove { mv })?;

        let san = San::from_move(chess, legal.clone());
        let after = chess
            .clone()
            .play(legal)
            .map_err(|_| MoveError::IllegalMove { mv })?;

        let suffix = if after.is_checkmate() {
            "#"
        } else if after.is_check() {
            "+"
        } else {
            ""
        };
        let played = PlayedMove {
            mv,
            san: format!("{san}{suffix}"),
            position: Position::from_chess(after),
        };
        trace!(mv = %mv, san = %played.san, "move applied");
        Ok(played)
    }

    /// Resolve a SAN token (`Nf3`, `exd5`, `O-O`, `e8=Q+`) to a board move.
    ///
    /// Check and annotation suffixes (`+`, `#`, `!`, `?`) are ignored.
    pub fn parse_san(&self, position: &Position, token: &str) -> Result<Move, NotationError> {
        let bare = token.trim_end_matches(['+', '#', '!', '?']);
        let san: San = bare.parse().map_err(|_| NotationError::Unparsable {
            token: token.to_string(),
        })?;
        let legal = san
            .to_move(position.chess())
            .map_err(|_| NotationError::Unresolved {
                token: token.to_string(),
            })?;
        to_input(&legal).ok_or_else(|| NotationError::Unresolved {
            token: token.to_string(),
        })
    }

    /// Legal destinations grouped by origin square.
    ///
    /// `occurrences` is how many times the position has been reached in the
    /// current line; once the game is over the mapping is empty.
    pub fn legal_destinations(&self, position: &Position, occurrences: u32) -> Destinations {
        let mut dests = Destinations::new();
        if self.status(position, occurrences).is_over() {
            return dests;
        }
        for legal in position.chess().legal_moves() {
            if let Some(input) = to_input(&legal) {
                dests.entry(input.origin()).or_default().insert(input.dest());
            }
        }
        dests
    }

    /// Return `true` if the side to move is in check.
    pub fn is_in_check(&self, position: &Position) -> bool {
        position.is_check()
    }

    /// Classify `position`, checking reasons in precedence order.
    pub fn status(&self, position: &Position, occurrences: u32) -> GameStatus {
        let chess = position.chess();
        let reason = if chess.is_checkmate() {
            Some(Termination::Checkmate)
        } else if chess.is_stalemate() {
            Some(Termination::Stalemate)
        } else if occurrences >= REPETITION_LIMIT {
            Some(Termination::ThreefoldRepetition)
        } else if chess.is_insufficient_material() {
            Some(Termination::InsufficientMaterial)
        } else if chess.halfmoves() >= FIFTY_MOVE_PLIES {
            Some(Termination::FiftyMoveRule)
        } else {
            None
        };
        reason.map_or(GameStatus::Ongoing, GameStatus::Over)
    }

    /// Standard algebraic notation of `mv` from `position` without applying it.
    pub fn san(&self, position: &Position, mv: Move) -> Result<String, MoveError> {
        self.apply_move(position, mv).map(|played| played.san)
    }
}

/// The square the king lands on when castling with the rook on `rook`.
fn castle_king_dest(rook: Square) -> Square {
    if rook.file() == File::H {
        Square::from_coords(File::G, rook.rank())
    } else {
        Square::from_coords(File::C, rook.rank())
    }
}

/// Translate an oracle move into board input.
fn to_input(legal: &OracleMove) -> Option<Move> {
    match legal {
        OracleMove::Normal {
            from,
            to,
            promotion: Some(role),
            ..
        } => Some(Move::with_promotion(
            *from,
            *to,
            PromotionPiece::from_role(*role)?,
        )),
        OracleMove::Normal { from, to, .. } | OracleMove::EnPassant { from, to } => {
            Some(Move::new(*from, *to))
        }
        OracleMove::Castle { king, rook } => Some(Move::new(*king, castle_king_dest(*rook))),
        OracleMove::Put { .. } => None,
    }
}

fn matches_input(legal: &OracleMove, mv: Move) -> bool {
    to_input(legal) == Some(mv)
}

/// Apply a sequence of moves from `start`, stopping at the first failure.
///
/// On failure, returns the index of the offending move with its error.
pub fn replay(
    engine: &PositionEngine,
    start: &Position,
    moves: &[Move],
) -> Result<Vec<PlayedMove>, (usize, MoveError)> {
    let mut played = Vec::with_capacity(moves.len());
    for (index, &mv) in moves.iter().enumerate() {
        let from = played.last().map_or(start, |p: &PlayedMove| &p.position);
        let next = engine.apply_move(from, mv).map_err(|e| (index, e))?;
        played.push(next);
    }
    Ok(played)
}

#[cfg(test)]
mod tests {
    use shakmaty::{Color, Square};

    use super::{PositionEngine, replay};
    use crate::chess_move::{Move, PromotionPiece, parse_uci_line};
    use crate::error::{MoveError, NotationError};
    use crate::position::Position;
    use crate::status::{GameStatus, Termination};

    const STALEMATE_BARE_BISHOP_FEN: &str = "6Bk/5K2/8/8/8/8/8/8 b - - 0 1";

    fn play_line(line: &str) -> Position {
        let engine = PositionEngine::new();
        let moves = parse_uci_line(line).unwrap();
        let played = replay(&engine, &Position::starting_position(), &moves).unwrap();
        played.last().unwrap().position().clone()
    }

    #[test]
    fn apply_pawn_push() {
        let engine = PositionEngine::new();
        let start = Position::starting_position();
        let played = engine
            .apply_move(&start, Move::new(Square::E2, Square::E4))
            .unwrap();
        assert_eq!(played.san(), "e4");
        assert_eq!(played.position().side_to_move(), Color::Black);
        assert_eq!(
            played.position().fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn reject_empty_origin() {
        let engine = PositionEngine::new();
        let start = Position::starting_position();
        let err = engine
            .apply_move(&start, Move::new(Square::E4, Square::E5))
            .unwrap_err();
        assert_eq!(err, MoveError::NoPieceOnOrigin { origin: Square::E4 });
    }

    #[test]
    fn reject_wrong_side() {
        let engine = PositionEngine::new();
        let start = Position::starting_position();
        let err = engine
            .apply_move(&start, Move::new(Square::E7, Square::E5))
            .unwrap_err();
        assert!(matches!(err, MoveError::WrongSideToMove { .. }));
    }

    #[test]
    fn reject_illegal_destination() {
        let engine = PositionEngine::new();
        let start = Position::starting_position();
        let err = engine
            .apply_move(&start, Move::new(Square::E2, Square::E5))
            .unwrap_err();
        assert!(matches!(err, MoveError::IllegalMove { .. }));
    }

    #[test]
    fn reject_promotion_on_ordinary_move() {
        let engine = PositionEngine::new();
        let start = Position::starting_position();
        let mv = Move::with_promotion(Square::E2, Square::E4, PromotionPiece::Queen);
        assert!(matches!(
            engine.apply_move(&start, mv),
            Err(MoveError::IllegalMove { .. })
        ));
    }

    #[test]
    fn promotion_needs_explicit_piece() {
        let engine = PositionEngine::new();
        let pos: Position = "8/P7/8/8/8/8/8/2k4K w - - 0 1".parse().unwrap();
        let err = engine
            .apply_move(&pos, Move::new(Square::A7, Square::A8))
            .unwrap_err();
        assert!(matches!(err, MoveError::PromotionRequired { .. }));

        let played = engine
            .apply_move(
                &pos,
                Move::with_promotion(Square::A7, Square::A8, PromotionPiece::Queen),
            )
            .unwrap();
        assert_eq!(played.san(), "a8=Q");
        assert_eq!(played.position().piece_char(Square::A8), Some('Q'));
        assert_eq!(engine.status(played.position(), 1), GameStatus::Ongoing);
    }

    #[test]
    fn underpromotion_with_check_suffix() {
        let engine = PositionEngine::new();
        // A knight on a8 covers c7.
        let pos: Position = "8/P1k5/8/8/8/8/8/7K w - - 0 1".parse().unwrap();
        let played = engine
            .apply_move(
                &pos,
                Move::with_promotion(Square::A7, Square::A8, PromotionPiece::Knight),
            )
            .unwrap();
        assert_eq!(played.san(), "a8=N+");
    }

    #[test]
    fn castling_uses_king_destination() {
        let engine = PositionEngine::new();
        let pos = play_line("e2e4 e7e5 g1f3 b8c6 f1c4 g8f6");
        let dests = engine.legal_destinations(&pos, 1);
        assert!(dests[&Square::E1].contains(&Square::G1));

        let played = engine
            .apply_move(&pos, Move::new(Square::E1, Square::G1))
            .unwrap();
        assert_eq!(played.san(), "O-O");
        assert_eq!(played.position().piece_char(Square::F1), Some('R'));
    }

    #[test]
    fn en_passant_capture() {
        let engine = PositionEngine::new();
        let pos = play_line("e2e4 a7a6 e4e5 d7d5");
        let played = engine
            .apply_move(&pos, Move::new(Square::E5, Square::D6))
            .unwrap();
        assert_eq!(played.san(), "exd6");
        assert_eq!(played.position().piece_char(Square::D5), None);
    }

    #[test]
    fn destinations_from_start() {
        let engine = PositionEngine::new();
        let dests = engine.legal_destinations(&Position::starting_position(), 1);
        let total: usize = dests.values().map(|d| d.len()).sum();
        assert_eq!(total, 20);
        assert_eq!(dests.len(), 10);
        assert!(dests[&Square::G1].contains(&Square::F3));
    }

    #[test]
    fn destinations_respect_pins() {
        let engine = PositionEngine::new();
        // Knight on e2 is pinned against the king on e1 by the rook on e8.
        let pos: Position = "4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1".parse().unwrap();
        let dests = engine.legal_destinations(&pos, 1);
        assert!(!dests.contains_key(&Square::E2));
    }

    #[test]
    fn destinations_never_leave_king_in_check() {
        let engine = PositionEngine::new();
        let pos = play_line("e2e4 f7f6 d2d4 g7g5");
        let dests = engine.legal_destinations(&pos, 1);
        for (&origin, targets) in &dests {
            for &dest in targets {
                let mv = Move::new(origin, dest).or_promote(&pos, PromotionPiece::Queen);
                let after = engine.apply_move(&pos, mv).unwrap();
                // A position where the side not to move is in check fails validation.
                assert!(
                    after.position().fen().parse::<Position>().is_ok(),
                    "{mv} leaves the mover in check"
                );
            }
        }
    }

    #[test]
    fn destinations_empty_when_over() {
        let engine = PositionEngine::new();
        let mated = play_line("f2f3 e7e5 g2g4 d8h4");
        assert!(engine.legal_destinations(&mated, 1).is_empty());

        let start = Position::starting_position();
        assert!(engine.legal_destinations(&start, 3).is_empty());
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let engine = PositionEngine::new();
        let mated = play_line("f2f3 e7e5 g2g4 d8h4");
        assert!(engine.is_in_check(&mated));
        assert_eq!(
            engine.status(&mated, 1),
            GameStatus::Over(Termination::Checkmate)
        );
    }

    #[test]
    fn mate_san_has_hash_suffix() {
        let engine = PositionEngine::new();
        let pos = play_line("f2f3 e7e5 g2g4");
        assert_eq!(
            engine.san(&pos, Move::new(Square::D8, Square::H4)).unwrap(),
            "Qh4#"
        );
    }

    #[test]
    fn stalemate_outranks_insufficient_material() {
        let engine = PositionEngine::new();
        let pos: Position = STALEMATE_BARE_BISHOP_FEN.parse().unwrap();
        assert_eq!(
            engine.status(&pos, 1),
            GameStatus::Over(Termination::Stalemate)
        );
    }

    #[test]
    fn repetition_outranks_insufficient_material() {
        let engine = PositionEngine::new();
        let pos: Position = "8/8/8/3k4/8/3K4/8/8 w - - 0 1".parse().unwrap();
        assert_eq!(
            engine.status(&pos, 1),
            GameStatus::Over(Termination::InsufficientMaterial)
        );
        assert_eq!(
            engine.status(&pos, 3),
            GameStatus::Over(Termination::ThreefoldRepetition)
        );
    }

    #[test]
    fn fifty_move_rule() {
        let engine = PositionEngine::new();
        let pos: Position = "8/8/8/3k4/8/3K4/4R3/8 w - - 100 80".parse().unwrap();
        assert_eq!(
            engine.status(&pos, 1),
            GameStatus::Over(Termination::FiftyMoveRule)
        );
    }

    #[test]
    fn parse_san_tokens() {
        let engine = PositionEngine::new();
        let start = Position::starting_position();
        assert_eq!(
            engine.parse_san(&start, "Nf3").unwrap(),
            Move::new(Square::G1, Square::F3)
        );
        assert_eq!(
            engine.parse_san(&start, "e4!?").unwrap(),
            Move::new(Square::E2, Square::E4)
        );
        assert!(matches!(
            engine.parse_san(&start, "Zz9"),
            Err(NotationError::Unparsable { .. })
        ));
        assert!(matches!(
            engine.parse_san(&start, "Nd4"),
            Err(NotationError::Unresolved { .. })
        ));
    }

    #[test]
    fn parse_san_castle_and_promotion() {
        let engine = PositionEngine::new();
        let pos = play_line("e2e4 e7e5 g1f3 b8c6 f1c4 g8f6");
        assert_eq!(
            engine.parse_san(&pos, "O-O").unwrap(),
            Move::new(Square::E1, Square::G1)
        );

        let pos: Position = "8/P7/8/8/8/8/8/2k4K w - - 0 1".parse().unwrap();
        assert_eq!(
            engine.parse_san(&pos, "a8=R").unwrap(),
            Move::with_promotion(Square::A7, Square::A8, PromotionPiece::Rook)
        );
    }

    #[test]
    fn replay_reports_failing_index() {
        let engine = PositionEngine::new();
        let moves = parse_uci_line("e2e4 e7e5 e1e3").unwrap();
        let err = replay(&engine, &Position::starting_position(), &moves).unwrap_err();
        assert_eq!(err.0, 2);
    }
}
