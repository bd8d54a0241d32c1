//! The interactive study session: one board, its history, and the opening and
//! puzzle datasets, driven by line commands.

use std::io::{BufRead, Write};

use gambit_core::{Color, Move, move_rows};
use gambit_study::{
    LookupCache, MoveHistory, OpeningBook, PuzzleError, PuzzleProgress, PuzzleSession, PuzzleSet,
    TABLEBASE_MAX_PIECES, TablebaseEntry, is_probeable, query_key, result_for,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::command::{Command, GotoTarget, parse_command};
use crate::config::SessionConfig;
use crate::error::ShellError;

const HELP: &str = "\
commands:
  <uci> | move <uci>        play a move (e2e4, e7e8q)
  undo | redo               step back or forward
  goto <ply|start|end>      view a ply (-1 is the start position)
  load <uci...>             replace the moves with a long-algebraic line
  pgn <movetext>            replace the moves with SAN movetext
  reset                     clear the board
  show | fen | moves        print the board, its FEN, or the move list
  dests | status            legal destinations, game state
  openings | next           openings reached, book continuations
  search <text>             find openings by code or name
  puzzle [theme] | hint     start a puzzle, show the next move
  tablebase <json>          record a tablebase answer for the viewed position
  set <name> <value>        promotion, orientation, locale
  quit";

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A study board session.
pub struct StudySession {
    history: MoveHistory,
    book: OpeningBook,
    puzzles: PuzzleSet,
    puzzle: Option<PuzzleSession>,
    config: SessionConfig,
    rng: StdRng,
    /// Tablebase answers keyed by FEN.
    tablebase: LookupCache<String, TablebaseEntry>,
}

impl StudySession {
    /// Create a session with the given datasets and a randomly seeded
    /// puzzle picker.
    pub fn new(book: OpeningBook, puzzles: PuzzleSet) -> Self {
        Self::with_rng(book, puzzles, StdRng::from_os_rng())
    }

    pub fn with_rng(book: OpeningBook, puzzles: PuzzleSet, rng: StdRng) -> Self {
        Self {
            history: MoveHistory::new(),
            book,
            puzzles,
            puzzle: None,
            config: SessionConfig::default(),
            rng,
            tablebase: LookupCache::new(),
        }
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// Command failures are reported on `out`; only I/O errors end the loop.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<(), ShellError> {
        for line in input.lines() {
            let line = line?;
            let cmd = match parse_command(&line) {
                Ok(Some(cmd)) => cmd,
                Ok(None) => continue,
                Err(e) => {
                    warn!(line = %line.trim(), error = %e, "command parse error");
                    writeln!(out, "error: {e}")?;
                    continue;
                }
            };
            debug!(cmd = ?cmd, "received command");

            match self.execute(cmd, &mut out) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(ShellError::Io { source }) => return Err(source.into()),
                Err(e) => {
                    debug!(error = %e, "command failed");
                    writeln!(out, "error: {e}")?;
                }
            }
            out.flush()?;
        }
        info!("gambit shutting down");
        Ok(())
    }

    /// Execute one command, writing its output to `out`.
    pub fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<Flow, ShellError> {
        match cmd {
            Command::Move(mv) => self.handle_move(mv, out)?,
            Command::Undo => {
                if !self.history.undo() {
                    return Err(ShellError::NothingTo { action: "undo" });
                }
                self.print_view(out)?;
            }
            Command::Redo => {
                if !self.history.redo() {
                    return Err(ShellError::NothingTo { action: "redo" });
                }
                self.print_view(out)?;
            }
            Command::Goto(target) => self.handle_goto(target, out)?,
            Command::Load(line) => {
                self.history.load_uci(&line)?;
                self.puzzle = None;
                writeln!(out, "{}", self.history.notation())?;
            }
            Command::Pgn(text) => {
                self.history.load_pgn(&text)?;
                self.puzzle = None;
                writeln!(out, "{}", self.history.notation())?;
            }
            Command::Reset => {
                self.history.reset();
                self.puzzle = None;
                writeln!(out, "start position")?;
            }
            Command::Show => self.print_board(out)?,
            Command::Fen => writeln!(out, "{}", self.history.position().fen())?,
            Command::Moves => self.print_moves(out)?,
            Command::Dests => self.print_dests(out)?,
            Command::Status => self.print_status(out)?,
            Command::Openings => self.print_reached(out)?,
            Command::Next => self.print_continuations(out)?,
            Command::Search(query) => self.print_search(&query, out)?,
            Command::Puzzle(theme) => self.handle_puzzle(theme, out)?,
            Command::Hint => self.handle_hint(out)?,
            Command::Tablebase(json) => self.handle_tablebase(&json, out)?,
            Command::Set(option) => {
                debug!(option = ?option, "session option changed");
                self.config.apply(option);
                writeln!(out, "ok")?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn handle_move<W: Write>(&mut self, mv: Move, out: &mut W) -> Result<(), ShellError> {
        let mv = match self.config.promotion {
            Some(piece) => mv.or_promote(self.history.position(), piece),
            None => mv,
        };
        self.play(mv, out)?;

        let status = self.history.status();
        if status.is_over() {
            writeln!(out, "{status}")?;
        }

        let Some(session) = &self.puzzle else {
            return Ok(());
        };
        let reply = match session.progress(&self.history) {
            PuzzleProgress::Solved => {
                writeln!(out, "puzzle solved")?;
                None
            }
            PuzzleProgress::Diverged => {
                writeln!(out, "not the solution; undo to try again")?;
                None
            }
            PuzzleProgress::InProgress { .. } => session.opponent_reply(&self.history),
        };
        if let Some(reply) = reply {
            self.play(reply, out)?;
        }
        Ok(())
    }

    fn play<W: Write>(&mut self, mv: Move, out: &mut W) -> Result<(), ShellError> {
        let ply = self.history.viewed_index() + 1;
        let played = self.history.play_move(mv)?;
        writeln!(out, "{}", ply_label(ply, played.san()))?;
        Ok(())
    }

    fn handle_goto<W: Write>(&mut self, target: GotoTarget, out: &mut W) -> Result<(), ShellError> {
        match target {
            GotoTarget::Start => self.history.go_to_start(),
            GotoTarget::End => self.history.go_to_end(),
            GotoTarget::Ply(ply) => {
                if !self.history.go_to_index(ply) {
                    return Err(ShellError::PlyOutOfRange {
                        ply,
                        len: self.history.len(),
                    });
                }
            }
        }
        self.print_view(out)
    }

    fn handle_puzzle<W: Write>(
        &mut self,
        theme: Option<String>,
        out: &mut W,
    ) -> Result<(), ShellError> {
        let puzzle = match theme {
            Some(theme) => self
                .puzzles
                .random(Some(&theme), &mut self.rng)
                .ok_or(PuzzleError::NoMatch { theme })?,
            None => self
                .puzzles
                .random(None, &mut self.rng)
                .ok_or(PuzzleError::Empty)?,
        };
        let session = PuzzleSession::start(puzzle, &mut self.history)?;
        info!(id = %puzzle.id(), "puzzle loaded");

        writeln!(out, "puzzle {} [{}]", puzzle.id(), puzzle.themes().join(" "))?;
        writeln!(out, "{}", self.history.notation())?;
        self.puzzle = Some(session);
        self.print_board(out)
    }

    fn handle_hint<W: Write>(&mut self, out: &mut W) -> Result<(), ShellError> {
        let session = self.puzzle.as_ref().ok_or(ShellError::NoPuzzle)?;
        match session.progress(&self.history) {
            PuzzleProgress::InProgress { matched } => {
                writeln!(out, "hint: {}", session.solution_san()[matched])?;
            }
            PuzzleProgress::Solved => writeln!(out, "puzzle already solved")?,
            PuzzleProgress::Diverged => {
                writeln!(out, "off the solution line; undo to try again")?;
            }
        }
        Ok(())
    }

    fn handle_tablebase<W: Write>(&mut self, json: &str, out: &mut W) -> Result<(), ShellError> {
        let pieces = self.history.position().piece_count();
        if !is_probeable(self.history.position()) {
            return Err(ShellError::NotProbeable {
                pieces,
                max: TABLEBASE_MAX_PIECES,
            });
        }
        let ticket = self.history.ticket();
        let entry =
            TablebaseEntry::from_json(json).map_err(|source| ShellError::Tablebase { source })?;

        let side = self.history.side_to_move();
        let Some(entry) = self.tablebase.resolve(&self.history, &ticket, entry) else {
            return Ok(());
        };
        writeln!(out, "tablebase: {}", result_for(entry.category, side))?;
        // Move categories are from the opponent's point of view.
        for mv in &entry.moves {
            writeln!(out, "  {}: {}", mv.san, result_for(mv.category, side.other()))?;
        }
        Ok(())
    }

    fn print_view<W: Write>(&self, out: &mut W) -> Result<(), ShellError> {
        match self.history.last_move() {
            Some(last) => writeln!(
                out,
                "viewing {}",
                ply_label(self.history.viewed_index(), last.san())
            )?,
            None => writeln!(out, "viewing start position")?,
        }
        Ok(())
    }

    fn print_board<W: Write>(&self, out: &mut W) -> Result<(), ShellError> {
        let position = self.history.position();
        writeln!(out, "{}", position.pretty(self.config.orientation))?;
        writeln!(out, "{} to move", color_name(position.side_to_move()))?;
        Ok(())
    }

    fn print_moves<W: Write>(&self, out: &mut W) -> Result<(), ShellError> {
        let sans = self.history.sans();
        if sans.is_empty() {
            writeln!(out, "no moves")?;
            return Ok(());
        }
        let viewed = self.history.viewed_index();
        let mark = |ply: usize, san: &str| {
            if ply as isize == viewed {
                format!("[{san}]")
            } else {
                san.to_string()
            }
        };
        for row in move_rows(&sans) {
            let white = mark(row.white_ply(), row.white);
            match row.black {
                Some(black) => writeln!(
                    out,
                    "{}. {} {}",
                    row.number,
                    white,
                    mark(row.black_ply(), black)
                )?,
                None => writeln!(out, "{}. {}", row.number, white)?,
            }
        }
        Ok(())
    }

    fn print_dests<W: Write>(&self, out: &mut W) -> Result<(), ShellError> {
        let dests = self.history.destinations();
        if dests.is_empty() {
            writeln!(out, "no legal moves")?;
        }
        for (from, targets) in &dests {
            let targets: Vec<String> = targets.iter().map(ToString::to_string).collect();
            writeln!(out, "{from}: {}", targets.join(" "))?;
        }
        Ok(())
    }

    fn print_status<W: Write>(&self, out: &mut W) -> Result<(), ShellError> {
        let position = self.history.position();
        writeln!(out, "status: {}", self.history.status())?;
        writeln!(out, "to move: {}", color_name(position.side_to_move()))?;
        if self.history.is_check() {
            writeln!(out, "check")?;
        }
        writeln!(
            out,
            "ply: {} of {}",
            self.history.viewed_index() + 1,
            self.history.len()
        )?;
        writeln!(out, "phase: {}", self.book.phase(&self.history).label())?;
        if is_probeable(position) {
            let key = position.fen().to_string();
            match self.tablebase.get(&key) {
                Some(entry) => writeln!(
                    out,
                    "tablebase: {}",
                    result_for(entry.category, position.side_to_move())
                )?,
                None => writeln!(out, "tablebase key: {}", query_key(position))?,
            }
        }
        Ok(())
    }

    fn print_reached<W: Write>(&self, out: &mut W) -> Result<(), ShellError> {
        let reached = self.book.reached(&self.history);
        if reached.is_empty() {
            writeln!(out, "no named opening")?;
        }
        for hit in reached {
            writeln!(
                out,
                "{} {} (ply {})",
                hit.opening.eco(),
                hit.opening.localized_name(&self.config.locale),
                hit.ply
            )?;
        }
        Ok(())
    }

    fn print_continuations<W: Write>(&self, out: &mut W) -> Result<(), ShellError> {
        let next = self.book.continuations(&self.history.viewed_moves());
        if next.is_empty() {
            writeln!(out, "no book moves")?;
        }
        for continuation in next {
            let names: Vec<String> = continuation
                .openings
                .iter()
                .map(|line| {
                    format!(
                        "{} (+{})",
                        line.opening.localized_name(&self.config.locale),
                        line.remaining
                    )
                })
                .collect();
            writeln!(out, "{}: {}", continuation.san, names.join(", "))?;
        }
        Ok(())
    }

    fn print_search<W: Write>(&self, query: &str, out: &mut W) -> Result<(), ShellError> {
        let found = self.book.search(query, &self.config.locale);
        if found.is_empty() {
            writeln!(out, "no openings match \"{query}\"")?;
        }
        for opening in found {
            writeln!(
                out,
                "{} {}: {}",
                opening.eco(),
                opening.localized_name(&self.config.locale),
                opening.movetext()
            )?;
        }
        Ok(())
    }
}

/// `1. e4` for White's plies, `1... e5` for Black's.
fn ply_label(ply: isize, san: &str) -> String {
    let number = ply / 2 + 1;
    if ply % 2 == 0 {
        format!("{number}. {san}")
    } else {
        format!("{number}... {san}")
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

#[cfg(test)]
mod tests {
    use gambit_core::Position;
    use gambit_study::{MoveHistory, OpeningBook, PuzzleSet};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{Flow, StudySession, ply_label};
    use crate::command::parse_command;
    use crate::error::ShellError;

    fn session() -> StudySession {
        StudySession::with_rng(
            OpeningBook::builtin(),
            PuzzleSet::builtin(),
            StdRng::seed_from_u64(1),
        )
    }

    fn exec(session: &mut StudySession, line: &str) -> Result<String, ShellError> {
        let cmd = parse_command(line)?.unwrap();
        let mut out = Vec::new();
        session.execute(cmd, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn labels() {
        assert_eq!(ply_label(0, "e4"), "1. e4");
        assert_eq!(ply_label(1, "e5"), "1... e5");
        assert_eq!(ply_label(4, "Bc4"), "3. Bc4");
    }

    #[test]
    fn move_and_navigate() {
        let mut s = session();
        assert_eq!(exec(&mut s, "e2e4").unwrap(), "1. e4\n");
        assert_eq!(exec(&mut s, "e7e5").unwrap(), "1... e5\n");
        assert_eq!(exec(&mut s, "undo").unwrap(), "viewing 1. e4\n");
        assert_eq!(exec(&mut s, "undo").unwrap(), "viewing start position\n");
        assert!(matches!(
            exec(&mut s, "undo"),
            Err(ShellError::NothingTo { action: "undo" })
        ));
        assert_eq!(exec(&mut s, "goto end").unwrap(), "viewing 1... e5\n");
        assert!(matches!(
            exec(&mut s, "goto 5"),
            Err(ShellError::PlyOutOfRange { ply: 5, len: 2 })
        ));
    }

    #[test]
    fn promotion_policy_fills_in_piece() {
        let mut s = session();
        exec(&mut s, "load a2a4 b7b5 a4b5 a7a6 b5a6 c8b7 a6b7 b8c6").unwrap();
        assert!(exec(&mut s, "b7a8").unwrap().starts_with("5. bxa8=Q"));

        exec(&mut s, "undo").unwrap();
        exec(&mut s, "set promotion none").unwrap();
        assert!(matches!(exec(&mut s, "b7a8"), Err(ShellError::Move(_))));
        assert!(exec(&mut s, "b7a8n").unwrap().starts_with("5. bxa8=N"));
    }

    #[test]
    fn moves_marks_viewed_ply() {
        let mut s = session();
        exec(&mut s, "pgn 1. e4 e5 2. Nf3").unwrap();
        exec(&mut s, "goto 1").unwrap();
        assert_eq!(exec(&mut s, "moves").unwrap(), "1. e4 [e5]\n2. Nf3\n");
    }

    #[test]
    fn openings_use_locale() {
        let mut s = session();
        exec(&mut s, "load e2e4 e7e5 g1f3 b8c6 f1c4").unwrap();
        assert!(exec(&mut s, "openings").unwrap().starts_with("C50 Italian Game (ply 4)"));
        exec(&mut s, "set locale ko").unwrap();
        assert!(exec(&mut s, "openings").unwrap().starts_with("C50 이탈리안 게임 (ply 4)"));
    }

    #[test]
    fn next_lists_book_moves() {
        let mut s = session();
        exec(&mut s, "load e2e4 e7e5 g1f3 b8c6").unwrap();
        let next = exec(&mut s, "next").unwrap();
        let first = next.lines().next().unwrap();
        assert!(first.starts_with("Bb5: "), "got {first}");
    }

    #[test]
    fn puzzle_flow_with_reply() {
        let mut s = session();
        exec(&mut s, "puzzle sacrifice").unwrap();
        assert_eq!(exec(&mut s, "hint").unwrap(), "hint: Bxf7+\n");
        assert_eq!(exec(&mut s, "c4f7").unwrap(), "6. Bxf7+\n6... Ke7\n");
        let out = exec(&mut s, "c3d5").unwrap();
        assert_eq!(out, "7. Nd5#\nCheckmate\npuzzle solved\n");
    }

    #[test]
    fn puzzle_without_match() {
        let mut s = session();
        assert!(matches!(
            exec(&mut s, "puzzle nosuchtheme"),
            Err(ShellError::Puzzle(_))
        ));
        assert!(matches!(exec(&mut s, "hint"), Err(ShellError::NoPuzzle)));
    }

    #[test]
    fn tablebase_response_is_applied_and_cached() {
        let mut s = session();
        assert!(matches!(
            exec(&mut s, r#"tb {"category": "win"}"#),
            Err(ShellError::NotProbeable { pieces: 32, .. })
        ));

        let position: Position = "8/8/8/3k4/8/3K4/4P3/8 b - - 0 1".parse().unwrap();
        s.history = MoveHistory::from_position(position);
        assert!(exec(&mut s, "status").unwrap().contains("tablebase key: 8/8/8/3k4/8/3K4/4P3/8_b_-_-_0_1"));

        let json = r#"{"dtz": 0, "category": "draw", "moves": [
            {"uci": "d5e5", "san": "Ke5", "dtz": 0, "category": "draw"},
            {"uci": "d5c5", "san": "Kc5", "dtz": 20, "category": "win"}
        ]}"#;
        assert_eq!(
            exec(&mut s, &format!("tablebase {json}")).unwrap(),
            "tablebase: Draw\n  Ke5: Draw\n  Kc5: White wins\n"
        );
        assert!(exec(&mut s, "status").unwrap().contains("tablebase: Draw\n"));
        assert!(matches!(
            exec(&mut s, "tb {"),
            Err(ShellError::Tablebase { .. })
        ));
    }

    #[test]
    fn quit_stops() {
        let mut s = session();
        let mut out = Vec::new();
        let flow = s
            .execute(parse_command("quit").unwrap().unwrap(), &mut out)
            .unwrap();
        assert_eq!(flow, Flow::Quit);
    }
}
