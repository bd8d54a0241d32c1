//! Move-text helpers: numbered move lists and PGN movetext tokenizing.

/// Game result markers that may end PGN movetext.
const RESULT_TOKENS: [&str; 4] = ["*", "1-0", "0-1", "1/2-1/2"];

/// Render SAN moves as numbered movetext: `1. e4 e5 2. Nf3`.
///
/// `first_ply` is the ply index of the first move (0 for White's first move
/// from the standard start). A list that starts with Black gets `1...`.
pub fn movetext<S: AsRef<str>>(sans: &[S], first_ply: usize) -> String {
    let mut out = String::new();
    for (offset, san) in sans.iter().enumerate() {
        let ply = first_ply + offset;
        let number = ply / 2 + 1;
        if !out.is_empty() {
            out.push(' ');
        }
        if ply % 2 == 0 {
            out.push_str(&format!("{number}. "));
        } else if offset == 0 {
            out.push_str(&format!("{number}... "));
        }
        out.push_str(san.as_ref());
    }
    out
}

/// One row of a move table: move number, White's move, Black's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRow<'a> {
    pub number: usize,
    pub white: &'a str,
    pub black: Option<&'a str>,
}

impl MoveRow<'_> {
    /// Ply index of White's move in this row.
    pub fn white_ply(&self) -> usize {
        self.number * 2 - 2
    }

    /// Ply index of Black's move in this row.
    pub fn black_ply(&self) -> usize {
        self.number * 2 - 1
    }
}

/// Pair SAN moves into numbered rows.
pub fn move_rows<S: AsRef<str>>(sans: &[S]) -> Vec<MoveRow<'_>> {
    sans.chunks(2)
        .enumerate()
        .map(|(i, chunk)| MoveRow {
            number: i + 1,
            white: chunk[0].as_ref(),
            black: chunk.get(1).map(AsRef::as_ref),
        })
        .collect()
}

/// Extract SAN tokens from PGN text.
///
/// Tag-pair lines, brace comments, move numbers (`12.`, `12...`) and result
/// markers are dropped. A move glued to its number (`1.e4`) is split off.
pub fn parse_movetext(pgn: &str) -> Vec<String> {
    let body: Vec<&str> = pgn
        .lines()
        .filter(|line| !line.trim_start().starts_with('['))
        .collect();
    let body = strip_comments(&body.join(" "));

    let mut tokens = Vec::new();
    for raw in body.split_whitespace() {
        if RESULT_TOKENS.contains(&raw) {
            continue;
        }
        let token = match raw.find(|c: char| !c.is_ascii_digit()) {
            Some(0) => raw,
            Some(pos) if raw[pos..].starts_with('.') => raw[pos..].trim_start_matches('.'),
            Some(_) => raw,
            None => continue,
        };
        if !token.is_empty() {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Remove `{...}` comments.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}
