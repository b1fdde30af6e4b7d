//! `faregress`: runs `.test` regression files against the compiled
//! library, checking both runtime simulators agree with each case's
//! expected outcome.
//!
//! Grounded on `faregress.c`'s `test_file`/`test_do`. Cross-checking
//! against an external PCRE engine is the one piece of the original left
//! out (§1 lists it as an out-of-scope external collaborator); the
//! `ignorepcre` option is still accepted for `.test` file compatibility
//! but has no effect, since no PCRE cross-check ever runs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use libfa::config::Limits;
use libfa::determinize::determinize_ex;
use libfa::error::Error as FaError;
use libfa::fa::construct::union_list;
use libfa::fa::{Fa, Opaque};
use libfa::minimize::minimize_ex;
use libfa::regexp::{regexp_fa_ex, RegexpError};
use libfa::sim::bitcomp::BitcompSim;
use libfa::sim::{Outcome, Sim};

/// Runs `.test` regression files against the compiled library.
#[derive(Debug, Parser)]
#[command(name = "faregress", version)]
struct Args {
    /// Directory of `.test` files to run. Every regular file in it (one
    /// level, no recursion) is parsed as a `.test` file.
    #[arg(long)]
    dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaseLabel {
    Index(u32),
    Reject,
    More,
    Error,
}

fn parse_label(s: &str) -> CaseLabel {
    match s {
        "e" => CaseLabel::Error,
        "!" => CaseLabel::Reject,
        "m" => CaseLabel::More,
        _ => CaseLabel::Index(s.trim().parse().unwrap_or(0)),
    }
}

struct Case {
    label: CaseLabel,
    text: Vec<u8>,
    line: usize,
}

struct Block {
    file: String,
    line: usize,
    patterns: Vec<(u32, String)>,
    opts: HashMap<String, String>,
    cases: Vec<Case>,
}

impl Block {
    fn new(file: String, line: usize) -> Self {
        Self {
            file,
            line,
            patterns: Vec::new(),
            opts: HashMap::new(),
            cases: Vec::new(),
        }
    }

    fn opt_int(&self, name: &str, default: i64) -> i64 {
        self.opts
            .get(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn opt_flag(&self, name: &str) -> bool {
        self.opts.contains_key(name)
    }
}

/// Undoes the escapes a `.test` case's text may carry. Grounded on
/// `test_case_unescape`: `\xHH`, the named control-byte shorthands, and
/// `\0`; any other escaped byte passes through as itself.
fn unescape(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 1;
            match bytes[i] {
                b'x' if i + 2 < bytes.len() => {
                    let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                    let v = hex.and_then(|h| u8::from_str_radix(h, 16).ok());
                    if let Some(v) = v {
                        out.push(v);
                        i += 3;
                        continue;
                    }
                    out.push(bytes[i]);
                    i += 1;
                }
                b'r' => {
                    out.push(b'\r');
                    i += 1;
                }
                b'n' => {
                    out.push(b'\n');
                    i += 1;
                }
                b't' => {
                    out.push(b'\t');
                    i += 1;
                }
                b'v' => {
                    out.push(0x0b);
                    i += 1;
                }
                b'f' => {
                    out.push(0x0c);
                    i += 1;
                }
                b'e' => {
                    out.push(0x1b);
                    i += 1;
                }
                b'a' => {
                    out.push(0x07);
                    i += 1;
                }
                b'b' => {
                    out.push(0x08);
                    i += 1;
                }
                b'0' => {
                    out.push(0);
                    i += 1;
                }
                other => {
                    out.push(other);
                    i += 1;
                }
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    out
}

/// Classifies a line per the `.test` grammar: blank lines flush the
/// pending block; a `#`-prefixed (after trim) line is a comment; an
/// unindented line with `=` before any `:` is an option; the remaining
/// unindented colon lines declare a pattern, indented ones a case.
fn parse_file(file: &str, contents: &str, counters: &mut Counters) {
    let mut block: Option<Block> = None;

    for (idx, raw) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let indented = raw.starts_with(' ') || raw.starts_with('\t');
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            if let Some(b) = block.take() {
                run_and_record(&b, counters);
            }
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }

        let colon = trimmed.find(':');
        let eq = trimmed.find('=');
        let is_option = !indented && eq.is_some() && colon.is_none_or(|c| eq.unwrap() < c);

        let b = block.get_or_insert_with(|| {
            counters.tests += 1;
            Block::new(file.to_string(), line_no)
        });

        if is_option {
            let eq = eq.unwrap();
            let key = trimmed[..eq].trim().to_string();
            let value = trimmed[eq + 1..].trim().to_string();
            b.opts.insert(key, value);
            continue;
        }

        let Some(colon) = colon else { continue };
        let head = trimmed[..colon].trim();
        let tail = trimmed[colon + 1..].trim();

        if !indented {
            let n: u32 = head.parse().unwrap_or(0);
            b.patterns.push((n, tail.to_string()));
        } else {
            counters.cases += 1;
            b.cases.push(Case {
                label: parse_label(head),
                text: unescape(tail),
                line: line_no,
            });
        }
    }

    if let Some(b) = block {
        run_and_record(&b, counters);
    }
}

struct Counters {
    tests: u32,
    cases: u32,
    cases_fail: u32,
}

/// Spawns a background timer that raises `flag` after `ms` milliseconds
/// (no-op, flag never raised, if `ms == 0`). Not joined: the regression
/// suite should not block waiting out a timeout that never fired.
/// Grounded on `faregress.c`'s `setitimer`/`SIGALRM` cancellation, adapted
/// to a plain thread since this crate has no signal-handler story.
fn cancel_after(ms: i64) -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    if ms > 0 {
        let flag2 = flag.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(ms as u64));
            flag2.store(true, Ordering::Relaxed);
        });
    }
    flag
}

fn error_case_matches(cases: &[Case], message: &str) -> bool {
    cases.iter().any(|c| {
        c.label == CaseLabel::Error && message.contains(&String::from_utf8_lossy(&c.text).into_owned())
    })
}

/// Compiles and runs one test block. Returns `(cases_checked,
/// cases_failed)`; a compile/determinize/minimize error that matches an
/// `e:` case is not a failure at all and short-circuits the rest of the
/// block, mirroring `test_do`'s early return.
fn run_block(block: &Block) -> u32 {
    let dot_all = block.opt_int("dotall", 0) != 0;
    let limits = if block.opts.contains_key("states") || block.opts.contains_key("trans") {
        Some(Limits::new(
            block.opt_int("states", 0).max(0) as u32,
            block.opt_int("trans", 0).max(0) as u32,
        ))
    } else {
        None
    };

    let mut fas: Vec<Fa> = Vec::with_capacity(block.patterns.len());
    for (n, pattern) in &block.patterns {
        match regexp_fa_ex(pattern, limits.as_ref(), dot_all) {
            Ok(mut fa) => {
                fa.set_accepting_opaque(*n as Opaque);
                fas.push(fa);
            }
            Err(RegexpError { message, .. }) => {
                if error_case_matches(&block.cases, &message) {
                    return 0;
                }
                eprintln!("{}:{}: {}", block.file, block.line, message);
                return 1;
            }
        }
    }
    if fas.is_empty() {
        return 0;
    }

    let nfa = union_list(fas);
    let mut pri = |opaques: &[Opaque]| *opaques.iter().min().unwrap();

    let dcancel = cancel_after(block.opt_int("dtimeout", 0));
    let mut fa = match determinize_ex(&nfa, Some(&mut pri), limits.as_ref(), Some(&dcancel)) {
        Ok(fa) => fa,
        Err(e) => {
            let message = describe_build_error(&e, &dcancel);
            if error_case_matches(&block.cases, &message) {
                return 0;
            }
            eprintln!("{}:{}: {}", block.file, block.line, message);
            return 1;
        }
    };

    let mut opaque_cmp = |a: Option<Opaque>, b: Option<Opaque>| a != b;
    let mcancel = cancel_after(block.opt_int("mtimeout", 0));
    let mut opt_cmp: Option<&mut dyn libfa::minimize::DistinguishCmp> = Some(&mut opaque_cmp);
    fa = match minimize_ex(&fa, &mut opt_cmp, Some(&mcancel)) {
        Ok(fa) => fa,
        Err(e) => {
            let message = describe_build_error(&e, &mcancel);
            if error_case_matches(&block.cases, &message) {
                return 0;
            }
            eprintln!("{}:{}: {}", block.file, block.line, message);
            return 1;
        }
    };

    if block.opt_flag("removeacceptingtrans") {
        fa = fa.remove_accepting_trans();
        let mut opt_cmp: Option<&mut dyn libfa::minimize::DistinguishCmp> = Some(&mut opaque_cmp);
        fa = minimize_ex(&fa, &mut opt_cmp, None).unwrap_or(fa);
    }

    info!(states = fa.states_n(), trans = fa.trans_n(), file = %block.file, line = block.line, "block compiled");

    let sim = Sim::build(&fa);
    let bitcomp = BitcompSim::build(&sim);
    let mut failed = 0;

    for case in &block.cases {
        if case.label == CaseLabel::Error {
            // An `e:` case that reached here means no compile/build error
            // actually happened; that is itself the failure.
            warn!(file = %block.file, line = case.line, "expected a build error, none occurred");
            failed += 1;
            continue;
        }

        let mut run = sim.new_run();
        let outcome = sim.run(&mut run, &case.text);
        let dense_ok = outcome_matches(outcome, run.opaque(), case.label);

        let mut bc_run = bitcomp.new_run();
        let bc_outcome = bitcomp.run(&mut bc_run, &case.text);
        let bitcomp_ok = outcome_matches(bc_outcome, bc_run.opaque(), case.label);

        if !dense_ok || !bitcomp_ok {
            warn!(
                file = %block.file,
                line = case.line,
                text = %String::from_utf8_lossy(&case.text),
                dense = ?outcome,
                bitcomp = ?bc_outcome,
                "case mismatch"
            );
            failed += 1;
        }
    }

    failed
}

fn describe_build_error(e: &FaError, cancel: &AtomicBool) -> String {
    if matches!(e, FaError::Cancelled) && cancel.load(Ordering::Relaxed) {
        "timeout".to_string()
    } else {
        e.to_string()
    }
}

fn outcome_matches(outcome: Outcome, opaque: Option<Opaque>, label: CaseLabel) -> bool {
    match (outcome, label) {
        (Outcome::Accept, CaseLabel::Index(n)) => opaque == Some(n as Opaque),
        (Outcome::Reject, CaseLabel::Reject) => true,
        (Outcome::More, CaseLabel::More) => true,
        _ => false,
    }
}

fn run_and_record(block: &Block, counters: &mut Counters) {
    counters.cases_fail += run_block(block);
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let mut counters = Counters {
        tests: 0,
        cases: 0,
        cases_fail: 0,
    };

    let entries = fs::read_dir(&args.dir).map_err(|e| format!("{}: {e}", args.dir))?;
    for entry in entries {
        let entry = entry.map_err(|e| e.to_string())?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(contents) = fs::read_to_string(&path) else {
            continue;
        };
        parse_file(&path_display(&path), &contents, &mut counters);
    }

    eprintln!(
        "{} tests, {} cases, {} failed",
        counters.tests, counters.cases, counters.cases_fail
    );

    Ok(())
}

fn path_display(p: &Path) -> String {
    p.display().to_string()
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}
