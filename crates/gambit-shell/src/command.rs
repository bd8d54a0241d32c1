//! Shell command parsing.

use gambit_core::Move;

use crate::config::SessionOption;
use crate::error::ShellError;

/// Target of a `goto` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GotoTarget {
    /// The start position.
    Start,
    /// The latest committed position.
    End,
    /// A zero-based ply index; `-1` is the start position.
    Ply(isize),
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `move <uci>` or a bare `<uci>` -- play a move from the viewed position.
    Move(Move),
    /// `undo` -- view the previous ply.
    Undo,
    /// `redo` -- view the next ply.
    Redo,
    /// `goto <ply|start|end>` -- view a ply.
    Goto(GotoTarget),
    /// `load <uci...>` -- replace the history with a long-algebraic line.
    Load(String),
    /// `pgn <movetext>` -- replace the history with SAN movetext.
    Pgn(String),
    /// `reset` -- clear the history.
    Reset,
    /// `show` -- print the board.
    Show,
    /// `fen` -- print the viewed position's FEN.
    Fen,
    /// `moves` -- print the move list.
    Moves,
    /// `dests` -- print legal destinations.
    Dests,
    /// `status` -- print game state.
    Status,
    /// `openings` -- openings reached by the viewed line.
    Openings,
    /// `next` -- book continuations from the viewed position.
    Next,
    /// `search <text>` -- find openings by code or name.
    Search(String),
    /// `puzzle [theme]` -- start a random puzzle.
    Puzzle(Option<String>),
    /// `hint` -- show the next puzzle move.
    Hint,
    /// `tablebase <json>` -- record a tablebase response for the viewed position.
    Tablebase(String),
    /// `set <name> <value>` -- change a session option.
    Set(SessionOption),
    /// `help` -- list commands.
    Help,
    /// `quit` -- leave the shell.
    Quit,
}

/// Parse a single line of shell input into a [`Command`].
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, ShellError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let cmd = match name.to_ascii_lowercase().as_str() {
        "move" | "m" => Command::Move(parse_move(required(rest, "move")?)?),
        "undo" | "u" => Command::Undo,
        "redo" | "r" => Command::Redo,
        "goto" | "g" => Command::Goto(parse_goto(required(rest, "goto")?)?),
        "load" => Command::Load(required(rest, "load")?.to_string()),
        "pgn" => Command::Pgn(required(rest, "pgn")?.to_string()),
        "reset" => Command::Reset,
        "show" | "board" => Command::Show,
        "fen" => Command::Fen,
        "moves" => Command::Moves,
        "dests" => Command::Dests,
        "status" => Command::Status,
        "openings" => Command::Openings,
        "next" => Command::Next,
        "search" => Command::Search(required(rest, "search")?.to_string()),
        "puzzle" => Command::Puzzle((!rest.is_empty()).then(|| rest.to_string())),
        "hint" => Command::Hint,
        "tablebase" | "tb" => Command::Tablebase(required(rest, "tablebase")?.to_string()),
        "set" => {
            let mut parts = required(rest, "set")?.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(option), Some(value)) => Command::Set(SessionOption::parse(option, value)?),
                _ => return Err(ShellError::MissingArgument { command: "set" }),
            }
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ if rest.is_empty() => match name.parse::<Move>() {
            Ok(mv) => Command::Move(mv),
            Err(_) => {
                return Err(ShellError::UnknownCommand {
                    name: name.to_string(),
                });
            }
        },
        _ => {
            return Err(ShellError::UnknownCommand {
                name: name.to_string(),
            });
        }
    };
    Ok(Some(cmd))
}

fn required<'a>(rest: &'a str, command: &'static str) -> Result<&'a str, ShellError> {
    if rest.is_empty() {
        Err(ShellError::MissingArgument { command })
    } else {
        Ok(rest)
    }
}

fn parse_move(text: &str) -> Result<Move, ShellError> {
    text.parse().map_err(|source| ShellError::InvalidMove {
        text: text.to_string(),
        source,
    })
}

fn parse_goto(text: &str) -> Result<GotoTarget, ShellError> {
    match text {
        "start" => Ok(GotoTarget::Start),
        "end" => Ok(GotoTarget::End),
        _ => text
            .parse::<isize>()
            .map(GotoTarget::Ply)
            .map_err(|_| ShellError::InvalidPly {
                value: text.to_string(),
            }),
    }
}
