//! Named opening lines: TSV import, continuations from a committed line, and
//! the openings a viewed line passes through.
//!
//! The TSV needs `eco`, `name` and `uci` columns. Localized names come from
//! `name_<locale>` or `name:<locale>` columns, e.g. `name_ko`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use gambit_core::{Move, Position, Square, movetext};
use tracing::{debug, warn};

use crate::error::DatasetError;
use crate::history::MoveHistory;

const BUILTIN_TSV: &str = include_str!("../data/openings.tsv");

/// One named opening line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opening {
    eco: String,
    name: String,
    localized: HashMap<String, String>,
    line: Vec<Move>,
    sans: Vec<String>,
    epd: String,
}

impl Opening {
    /// ECO classification code, e.g. `C50`.
    pub fn eco(&self) -> &str {
        &self.eco
    }

    /// English name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name in `locale`, falling back to the English name.
    pub fn localized_name(&self, locale: &str) -> &str {
        self.localized
            .get(locale)
            .map_or(self.name.as_str(), String::as_str)
    }

    /// The line from the standard start position.
    pub fn line(&self) -> &[Move] {
        &self.line
    }

    /// The line in SAN.
    pub fn sans(&self) -> &[String] {
        &self.sans
    }

    /// Number of plies in the line.
    pub fn move_count(&self) -> usize {
        self.line.len()
    }

    /// EPD of the position the line reaches.
    pub fn epd(&self) -> &str {
        &self.epd
    }

    /// The line as numbered movetext.
    pub fn movetext(&self) -> String {
        movetext(&self.sans, 0)
    }
}

/// An opening that continues with a given move, and how far it still goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo<'a> {
    pub opening: &'a Opening,
    /// Plies left in the line after the committed moves.
    pub remaining: usize,
}

/// A candidate next move and the openings it leads into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation<'a> {
    pub mv: Move,
    pub san: &'a str,
    pub openings: Vec<LineInfo<'a>>,
}

/// An opening whose final position occurs in the viewed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachedOpening<'a> {
    pub opening: &'a Opening,
    /// Ply at which the position occurred, `-1` for the start position.
    pub ply: isize,
}

/// Broad stage of the game shown on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChessPhase {
    Opening,
    Middlegame,
    Endgame,
}

impl ChessPhase {
    /// Piece count (kings included) at or below which the game is an endgame.
    pub const ENDGAME_PIECES: usize = 8;

    /// Classify from the piece count and whether book continuations exist.
    pub fn classify(piece_count: usize, has_continuations: bool) -> ChessPhase {
        if piece_count <= Self::ENDGAME_PIECES {
            ChessPhase::Endgame
        } else if has_continuations {
            ChessPhase::Opening
        } else {
            ChessPhase::Middlegame
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChessPhase::Opening => "Opening",
            ChessPhase::Middlegame => "Middlegame",
            ChessPhase::Endgame => "Endgame",
        }
    }
}

/// A collection of named opening lines indexed by final position.
#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    openings: Vec<Opening>,
    by_epd: HashMap<String, usize>,
}

impl OpeningBook {
    /// The embedded opening table.
    pub fn builtin() -> Self {
        Self::from_tsv_str(BUILTIN_TSV).unwrap_or_default()
    }

    pub fn from_tsv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let data = fs::read_to_string(path)?;
        Self::from_tsv_str(&data)
    }

    /// Parse a TSV table. Every line must replay from the standard start.
    pub fn from_tsv_str(tsv: &str) -> Result<Self, DatasetError> {
        let mut lines = tsv.lines().filter(|line| !line.trim().is_empty());
        let header = lines.next().ok_or(DatasetError::Empty)?;
        let columns: Vec<&str> = header.split('\t').map(str::trim).collect();

        let find = |column: &'static str| {
            columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(column))
                .ok_or(DatasetError::MissingColumn { column })
        };
        let eco_idx = find("eco")?;
        let name_idx = find("name")?;
        let uci_idx = find("uci")?;
        let locale_columns: Vec<(usize, String)> = columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                let lc = c.to_ascii_lowercase();
                lc.strip_prefix("name_")
                    .or_else(|| lc.strip_prefix("name:"))
                    .filter(|locale| !locale.is_empty())
                    .map(|locale| (i, locale.to_string()))
            })
            .collect();

        let mut book = OpeningBook::default();
        for (i, line) in lines.enumerate() {
            let row = i + 1;
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let field = |idx: usize, column: &'static str| {
                fields
                    .get(idx)
                    .copied()
                    .filter(|f| !f.is_empty())
                    .ok_or(DatasetError::MissingField { row, column })
            };
            let eco = field(eco_idx, "eco")?;
            let name = field(name_idx, "name")?;
            let uci = field(uci_idx, "uci")?;

            let mut history = MoveHistory::new();
            history
                .load_uci(uci)
                .map_err(|source| DatasetError::BadLine {
                    row,
                    name: name.to_string(),
                    source,
                })?;

            let localized = locale_columns
                .iter()
                .filter_map(|(idx, locale)| {
                    fields
                        .get(*idx)
                        .filter(|f| !f.is_empty())
                        .map(|f| (locale.clone(), f.to_string()))
                })
                .collect();

            book.push(Opening {
                eco: eco.to_string(),
                name: name.to_string(),
                localized,
                line: history.moves(),
                sans: history.sans().into_iter().map(str::to_string).collect(),
                epd: history.position().epd().to_string(),
            });
        }

        debug!(openings = book.len(), "loaded opening book");
        Ok(book)
    }

    fn push(&mut self, opening: Opening) {
        if self.by_epd.contains_key(&opening.epd) {
            warn!(name = %opening.name, epd = %opening.epd, "opening transposes to an earlier entry");
        } else {
            self.by_epd.insert(opening.epd.clone(), self.openings.len());
        }
        self.openings.push(opening);
    }

    pub fn len(&self) -> usize {
        self.openings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.openings.is_empty()
    }

    pub fn openings(&self) -> &[Opening] {
        &self.openings
    }

    /// The opening whose line ends in the position `epd`, if any.
    pub fn by_epd(&self, epd: &str) -> Option<&Opening> {
        self.by_epd.get(epd).map(|&i| &self.openings[i])
    }

    /// The opening named by the position itself.
    pub fn identify(&self, position: &Position) -> Option<&Opening> {
        self.by_epd(position.epd())
    }

    /// Book moves that extend `committed`, each with the openings it leads to.
    ///
    /// Only openings whose line starts with exactly `committed` count. Per
    /// move, an opening name is listed once, with its shortest line. Moves are
    /// ordered by the value of the moving piece, then by origin square, then
    /// by destination square, squares ordered file by file.
    pub fn continuations(&self, committed: &[Move]) -> Vec<Continuation<'_>> {
        let ply = committed.len();
        let mut groups: Vec<Continuation<'_>> = Vec::new();

        for opening in &self.openings {
            if opening.line.len() <= ply || opening.line[..ply] != *committed {
                continue;
            }
            let next = opening.line[ply];
            let info = LineInfo {
                opening,
                remaining: opening.line.len() - ply,
            };
            match groups.iter_mut().find(|g| g.mv == next) {
                Some(group) => match group
                    .openings
                    .iter_mut()
                    .find(|l| l.opening.name == opening.name)
                {
                    Some(existing) if existing.remaining > info.remaining => *existing = info,
                    Some(_) => {}
                    None => group.openings.push(info),
                },
                None => groups.push(Continuation {
                    mv: next,
                    san: &opening.sans[ply],
                    openings: vec![info],
                }),
            }
        }

        groups.sort_by_key(|g| {
            (
                piece_value(g.san),
                file_major(g.mv.origin()),
                file_major(g.mv.dest()),
            )
        });
        groups
    }

    /// Openings whose position occurs in the history up to the cursor.
    ///
    /// Most recent first; a name repeated back to back is listed once.
    pub fn reached(&self, history: &MoveHistory) -> Vec<ReachedOpening<'_>> {
        let mut found: Vec<ReachedOpening<'_>> = Vec::new();
        for (ply, position) in history.viewed_line().rev() {
            let Some(opening) = self.by_epd(position.epd()) else {
                continue;
            };
            if found.last().is_some_and(|r| r.opening.name == opening.name) {
                continue;
            }
            found.push(ReachedOpening { opening, ply });
        }
        found
    }

    /// Openings whose ECO code, name or `locale` name contains `query`,
    /// ignoring case.
    pub fn search(&self, query: &str, locale: &str) -> Vec<&Opening> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.openings
            .iter()
            .filter(|o| {
                o.eco.to_lowercase().contains(&query)
                    || o.name.to_lowercase().contains(&query)
                    || o.localized_name(locale).to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Phase of the viewed position in `history`.
    pub fn phase(&self, history: &MoveHistory) -> ChessPhase {
        let has_continuations = !self.continuations(&history.viewed_moves()).is_empty();
        ChessPhase::classify(history.position().piece_count(), has_continuations)
    }
}

/// Value of the piece a SAN move moves, in hundredths of a pawn.
fn piece_value(san: &str) -> u32 {
    match san.chars().next() {
        Some('N') => 300,
        Some('B') => 301,
        Some('R') => 500,
        Some('Q') => 900,
        Some('K' | 'O') => u32::MAX,
        _ => 100,
    }
}

/// Square index counting a1, a2, ..., a8, b1, ...
fn file_major(square: Square) -> u32 {
    let name = square.to_string();
    let bytes = name.as_bytes();
    u32::from(bytes[0] - b'a') * 8 + u32::from(bytes[1] - b'1')
}

#[cfg(test)]
mod tests {
    use gambit_core::{Move, Square, parse_uci_line};

    use super::{ChessPhase, OpeningBook, file_major, piece_value};
    use crate::error::DatasetError;
    use crate::history::MoveHistory;

    const SMALL: &str = "eco\tname\tuci\tname:ko\n\
        C20\tKing's Pawn Game\te2e4 e7e5\t오픈 게임\n\
        C40\tKing's Knight Opening\te2e4 e7e5 g1f3\t\n\
        C50\tItalian Game\te2e4 e7e5 g1f3 b8c6 f1c4\t이탈리안 게임\n\
        C53\tItalian Game\te2e4 e7e5 g1f3 b8c6 f1c4 f8c5 c2c3\t이탈리안 게임\n\
        C60\tRuy Lopez\te2e4 e7e5 g1f3 b8c6 f1b5\t루이 로페즈\n\
        C23\tBishop's Opening\te2e4 e7e5 f1c4\t\n\
        C44\tKing's Pawn Game: Tayler Opening\te2e4 e7e5 g1f3 b8c6 f1e2\t\n";

    fn line(text: &str) -> Vec<Move> {
        parse_uci_line(text).unwrap()
    }

    #[test]
    fn builtin_book_loads() {
        let book = OpeningBook::builtin();
        assert!(book.len() > 20);
        let italian = book
            .openings()
            .iter()
            .find(|o| o.eco() == "C50")
            .unwrap();
        assert_eq!(italian.name(), "Italian Game");
        assert_eq!(italian.localized_name("ko"), "이탈리안 게임");
        assert_eq!(italian.movetext(), "1. e4 e5 2. Nf3 Nc6 3. Bc4");
    }

    #[test]
    fn localized_name_falls_back_to_english() {
        let book = OpeningBook::from_tsv_str(SMALL).unwrap();
        let knight = &book.openings()[1];
        assert_eq!(knight.localized_name("ko"), "King's Knight Opening");
        assert_eq!(knight.localized_name("fr"), "King's Knight Opening");
    }

    #[test]
    fn rejects_missing_column() {
        let err = OpeningBook::from_tsv_str("eco\tname\nA00\tX\n").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { column: "uci" }));
    }

    #[test]
    fn rejects_illegal_line() {
        let err = OpeningBook::from_tsv_str("eco\tname\tuci\nA00\tBad\te2e5\n").unwrap_err();
        assert!(matches!(err, DatasetError::BadLine { row: 1, .. }));
    }

    #[test]
    fn continuations_group_and_sort() {
        let book = OpeningBook::from_tsv_str(SMALL).unwrap();
        let next = book.continuations(&line("e2e4 e7e5 g1f3 b8c6"));
        let sans: Vec<&str> = next.iter().map(|c| c.san).collect();
        // Bishops sorted by origin file-major then destination: f1b5 < f1c4 < f1e2.
        assert_eq!(sans, vec!["Bb5", "Bc4", "Be2"]);

        let italian = next.iter().find(|c| c.san == "Bc4").unwrap();
        assert_eq!(italian.openings.len(), 1);
        assert_eq!(italian.openings[0].opening.eco(), "C50");
        assert_eq!(italian.openings[0].remaining, 1);
    }

    #[test]
    fn continuations_order_by_piece_value() {
        let book = OpeningBook::from_tsv_str(SMALL).unwrap();
        let next = book.continuations(&line("e2e4 e7e5"));
        let sans: Vec<&str> = next.iter().map(|c| c.san).collect();
        assert_eq!(sans, vec!["Nf3", "Bc4"]);
        assert_eq!(next[0].mv, Move::new(Square::G1, Square::F3));
    }

    #[test]
    fn continuations_from_start_and_past_book() {
        let book = OpeningBook::from_tsv_str(SMALL).unwrap();
        assert_eq!(book.continuations(&[]).len(), 1);
        assert!(book.continuations(&line("d2d4")).is_empty());
    }

    #[test]
    fn reached_lists_most_recent_first() {
        let book = OpeningBook::from_tsv_str(SMALL).unwrap();
        let mut history = MoveHistory::new();
        history.load_uci("e2e4 e7e5 g1f3 b8c6 f1c4 f8c5 c2c3").unwrap();

        let reached = book.reached(&history);
        let names: Vec<(&str, isize)> = reached
            .iter()
            .map(|r| (r.opening.eco(), r.ply))
            .collect();
        // C53 and C50 share a name, so only the later one is listed.
        assert_eq!(names, vec![("C53", 6), ("C40", 2), ("C20", 1)]);

        history.go_to_index(2);
        assert_eq!(book.reached(&history)[0].opening.eco(), "C40");
        history.go_to_start();
        assert!(book.reached(&history).is_empty());
    }

    #[test]
    fn search_matches_code_and_names() {
        let book = OpeningBook::from_tsv_str(SMALL).unwrap();
        assert_eq!(book.search("c6", "ko").len(), 1);
        assert_eq!(book.search("italian", "en").len(), 2);
        assert_eq!(book.search("루이", "ko").len(), 1);
        assert!(book.search("  ", "en").is_empty());
    }

    #[test]
    fn phase_classification() {
        assert_eq!(ChessPhase::classify(32, true), ChessPhase::Opening);
        assert_eq!(ChessPhase::classify(20, false), ChessPhase::Middlegame);
        assert_eq!(ChessPhase::classify(8, true), ChessPhase::Endgame);

        let book = OpeningBook::from_tsv_str(SMALL).unwrap();
        let mut history = MoveHistory::new();
        assert_eq!(book.phase(&history), ChessPhase::Opening);
        history.load_uci("d2d4").unwrap();
        assert_eq!(book.phase(&history), ChessPhase::Middlegame);
        history.undo();
        assert_eq!(book.phase(&history), ChessPhase::Opening);
    }

    #[test]
    fn ordering_helpers() {
        assert!(piece_value("Nf3") < piece_value("Bc4"));
        assert!(piece_value("e4") < piece_value("Nf3"));
        assert_eq!(piece_value("O-O"), piece_value("Kf1"));
        assert_eq!(file_major(Square::A1), 0);
        assert_eq!(file_major(Square::A8), 7);
        assert_eq!(file_major(Square::B1), 8);
    }
}
