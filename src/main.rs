use std::env;
use std::io;

use anyhow::{Context, Result, bail};
use gambit_shell::StudySession;
use gambit_study::{OpeningBook, PuzzleSet};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: gambit [--openings <tsv>] [--puzzles <json>]";

#[derive(Debug, Default)]
struct Args {
    openings: Option<String>,
    puzzles: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--openings" => parsed.openings = Some(args.next().context(USAGE)?),
            "--puzzles" => parsed.puzzles = Some(args.next().context(USAGE)?),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => bail!("unexpected argument '{other}'\n{USAGE}"),
        }
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = parse_args(env::args().skip(1))?;

    let book = match &args.openings {
        Some(path) => OpeningBook::from_tsv_path(path)
            .with_context(|| format!("failed to load openings from {path}"))?,
        None => OpeningBook::builtin(),
    };
    let puzzles = match &args.puzzles {
        Some(path) => PuzzleSet::from_json_path(path)
            .with_context(|| format!("failed to load puzzles from {path}"))?,
        None => PuzzleSet::builtin(),
    };
    info!(openings = book.len(), puzzles = puzzles.len(), "gambit starting");

    let mut session = StudySession::new(book, puzzles);
    session.run(io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}
