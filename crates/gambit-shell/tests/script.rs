use std::io::Cursor;

use gambit_shell::StudySession;
use gambit_study::{MoveHistory, OpeningBook, PuzzleSet};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn run(script: &str) -> (String, StudySession) {
    let mut session = StudySession::with_rng(
        OpeningBook::builtin(),
        PuzzleSet::builtin(),
        StdRng::seed_from_u64(42),
    );
    let mut out = Vec::new();
    session.run(Cursor::new(script), &mut out).unwrap();
    (String::from_utf8(out).unwrap(), session)
}

#[test]
fn branching_script() {
    let script = "\
# play, step back, and branch
e2e4
e7e5
g1f3
goto 0
b8c6
redo
moves
quit
fen
";
    let (out, session) = run(script);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "1. e4",
            "1... e5",
            "2. Nf3",
            "viewing 1. e4",
            "1... Nc6",
            "error: nothing to redo",
            "1. e4 [Nc6]",
        ]
    );
    assert_eq!(session.history().sans(), vec!["e4", "Nc6"]);
}

#[test]
fn errors_do_not_stop_the_loop() {
    let script = "e2e5\nbogus\nload e2e4 e7e4\nfen\n";
    let (out, session) = run(script);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "error: illegal move: e2e5");
    assert_eq!(lines[1], "error: unknown command: bogus");
    assert!(lines[2].starts_with("error: ply 1:"), "got {}", lines[2]);
    assert_eq!(lines[3], MoveHistory::new().position().fen());
    assert!(session.history().is_empty());
}

#[test]
fn status_reports_terminal_state() {
    let (out, _) = run("pgn 1. f3 e5 2. g4 Qh4#\nstatus\ndests\n");
    assert!(out.contains("status: Checkmate"));
    assert!(out.contains("to move: White"));
    assert!(out.contains("check\n"));
    assert!(out.ends_with("no legal moves\n"));
}

#[test]
fn end_of_input_ends_session() {
    let (out, session) = run("e2e4");
    assert_eq!(out, "1. e4\n");
    assert_eq!(session.history().len(), 1);
}
