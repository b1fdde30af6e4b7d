//! `fatool`: reads one or more automata, optionally determinizes and
//! minimizes their union, and either emits it in a chosen format or runs
//! one test string through it.
//!
//! Grounded on `fatool.c`: the `--in FMT:ARG` / `--out FMT:ARG` format
//! table, the per-pattern opaque tagging that lets a multi-pattern union
//! report which source pattern matched, and the overlap bookkeeping a
//! `--dfa` priority callback performs when more than one pattern's
//! accepting states collapse into the same DFA state.

use std::collections::HashMap;
use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use libfa::config::Limits;
use libfa::determinize::{determinize_ex, PriorityResolver};
use libfa::fa::construct::union_list;
use libfa::fa::Fa;
use libfa::minimize::minimize_ex;
use libfa::serialize::{graphviz, graphviz_tikz, text};
use libfa::sim::{Outcome, Sim};

/// Builds, transforms, and emits finite automata.
#[derive(Debug, Parser)]
#[command(name = "fatool", version)]
struct Args {
    /// Input automaton, as `FMT:ARG`. May be given more than once; multiple
    /// inputs are unioned. Supported formats: `re:`, `text:`.
    #[arg(long = "in", required = true)]
    input: Vec<String>,

    /// Output automaton, as `FMT:ARG`. Supported formats: `text:`, `dot:`,
    /// `dottikz:`. `ARG` is a file path, or `-` for stdout. Mutually
    /// exclusive with `--test`.
    #[arg(long)]
    out: Option<String>,

    /// Instead of emitting, run this string through the built automaton
    /// and report accept/reject/more.
    #[arg(long)]
    test: Option<String>,

    /// Graph label carried into emitted formats that support one.
    #[arg(long)]
    label: Option<String>,

    /// Determinize the union before emitting or testing.
    #[arg(long)]
    dfa: bool,

    /// Minimize (implies `--dfa`) before emitting or testing.
    #[arg(long)]
    min: bool,
}

/// One input pattern, tagged by its position among `--in` arguments so a
/// composite automaton's accepting states can be traced back to it.
struct PatternInput {
    arg: String,
    fa: Fa,
}

fn parse_format(s: &str) -> Option<(&'static str, &str)> {
    const FORMATS: &[&str] = &["text:", "re:", "dottikz:", "dot:"];
    for f in FORMATS {
        if let Some(rest) = s.strip_prefix(f) {
            return Some((f.trim_end_matches(':'), rest));
        }
    }
    None
}

fn read_input(spec: &str) -> Result<Fa, String> {
    let Some((format, arg)) = parse_format(spec) else {
        return Err(format!("--in: unrecognized format in {spec:?}"));
    };

    match format {
        "re" => libfa::regexp::regexp_fa(arg, None).map_err(|e| format!("re: {e}")),
        "text" => {
            let contents = fs::read_to_string(arg).map_err(|e| format!("text: {arg}: {e}"))?;
            text::read(&contents).map_err(|e| format!("text: {e}"))
        }
        other => Err(format!("--in not supported for format {other}:")),
    }
}

fn write_output(spec: &str, fa: &Fa, label: Option<&str>) -> Result<(), String> {
    let Some((format, arg)) = parse_format(spec) else {
        return Err(format!("--out: unrecognized format in {spec:?}"));
    };

    let rendered = match format {
        "text" => text::write(fa, label),
        "dot" => graphviz::write(fa, label),
        "dottikz" => graphviz_tikz::write(fa),
        other => return Err(format!("--out not supported for format {other}:")),
    };

    if arg == "-" {
        print!("{rendered}");
    } else {
        fs::write(arg, rendered).map_err(|e| format!("{arg}: {e}"))?;
    }
    Ok(())
}

/// Picks the lowest-numbered pattern among ties, recording every other
/// pattern's overlap with the winner. Grounded on `fatool.c`'s `state_pri`
/// / `pattern_overlap`.
#[derive(Default)]
struct OverlapResolver {
    overlap: HashMap<(u64, u64), u32>,
}

impl PriorityResolver for OverlapResolver {
    fn resolve(&mut self, opaques: &[u64]) -> u64 {
        let winner = *opaques.iter().min().unwrap();
        for &op in opaques {
            if op != winner {
                *self.overlap.entry((op, winner)).or_insert(0) += 1;
            }
        }
        winner
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    if args.test.is_some() && args.out.is_some() {
        return Err("specify either --out or --test, not both".to_string());
    }
    if args.test.is_none() && args.out.is_none() {
        return Err("please specify --out or --test".to_string());
    }

    let mut inputs = Vec::with_capacity(args.input.len());
    for spec in &args.input {
        let fa = read_input(spec).map_err(|e| format!("in format failed: {e}"))?;
        inputs.push(PatternInput { arg: spec.clone(), fa });
    }

    for (i, p) in inputs.iter_mut().enumerate() {
        p.fa.set_accepting_opaque(i as u64);
    }

    let names: Vec<String> = inputs.iter().map(|p| p.arg.clone()).collect();
    let mut fa = if inputs.len() > 1 {
        union_list(inputs.into_iter().map(|p| p.fa).collect())
    } else {
        inputs.into_iter().next().expect("--in required").fa
    };

    info!(states = fa.states_n(), trans = fa.trans_n(), "NFA");

    let mut overlap = HashMap::new();
    if args.dfa || args.min {
        let mut resolver = OverlapResolver::default();
        fa = determinize_ex(&fa, Some(&mut resolver), None::<&Limits>, None)
            .map_err(|e| format!("determinize: {e}"))?;
        overlap = resolver.overlap;
        info!(states = fa.states_n(), trans = fa.trans_n(), "DFA");
    }

    if args.min {
        let mut cmp = |a: Option<u64>, b: Option<u64>| a != b;
        let mut cmp_opt: Option<&mut dyn libfa::minimize::DistinguishCmp> = Some(&mut cmp);
        fa = minimize_ex(&fa, &mut cmp_opt, None).map_err(|e| format!("minimize: {e}"))?;
        info!(states = fa.states_n(), trans = fa.trans_n(), "MDFA");
    }

    for ((loser, winner), count) in &overlap {
        warn!(
            pattern = names[*loser as usize],
            overlaps_with = names[*winner as usize],
            count,
            "partial overlap"
        );
    }

    if let Some(test) = &args.test {
        let sim = Sim::build(&fa);
        let mut run = sim.new_run();
        match sim.run(&mut run, test.as_bytes()) {
            Outcome::Accept => println!("match {}", run.opaque().unwrap_or(0)),
            Outcome::Reject => println!("no match"),
            Outcome::More => println!("more"),
        }
    } else {
        let out = args.out.as_deref().expect("validated above");
        write_output(out, &fa, args.label.as_deref())?;
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
