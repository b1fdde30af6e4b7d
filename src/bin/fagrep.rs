//! `fagrep`: compiles a regexp to a minimized DFA once, then streams
//! stdin line by line, echoing only the lines the pattern matches.
//!
//! Grounded on `fagrep.c`. Matching is "contains" rather than
//! "fullmatch" because [`libfa::regexp::regexp_fa`] pads an unanchored
//! pattern with any-byte self-loops on both ends (§4.5 of `SPEC_FULL.md`);
//! no separate substring-search code is needed.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;

use libfa::determinize::determinize;
use libfa::minimize::minimize;
use libfa::sim::{Outcome, Sim};

/// Filters stdin lines matching a regexp, like `grep` restricted to this
/// crate's own pattern grammar.
#[derive(Debug, Parser)]
#[command(name = "fagrep", version)]
struct Args {
    /// The pattern to compile and match each line against.
    regexp: String,
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let fa = libfa::regexp::regexp_fa(&args.regexp, None).map_err(|e| e.to_string())?;
    let fa = minimize(&determinize(&fa));
    let sim = Sim::build(&fa);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut line = Vec::new();

    let mut reader = stdin.lock();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }

        let mut run = sim.new_run();
        if matches!(sim.run(&mut run, &line), Outcome::Accept) {
            out.write_all(&line).map_err(|e| e.to_string())?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
