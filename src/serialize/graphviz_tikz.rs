//! TikZ/`dot2tex`-flavored GraphViz emitter.
//!
//! Grounded on `fa_graphviz_tikz_output_ex`: same per-destination edge
//! grouping as the plain emitter, but nodes carry `style="state[,accepting]
//! [,initial]"` instead of shape attributes, a `d2tfigpreamble` sets the
//! shared TikZ state style, and a self-loop edge gets `topath="loop above"`
//! so `dot2tex` draws it above the node instead of as a tiny circle.

use std::fmt::Write as _;

use crate::fa::{Fa, Symbol, Transition, EPSILON};

/// Emits `fa` as a `dot2tex`-flavored `digraph fa { ... }` source.
pub fn write(fa: &Fa) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "digraph fa {{");
    let _ = writeln!(out, "\trankdir=LR;");
    let _ = writeln!(out, "\td2tfigpreamble=\"\\tikzstyle{{every state}}=\\");
    let _ = writeln!(out, "\t[draw=gray!50,very thick,fill=gray!20]\";");

    let start = fa.start();
    for (idx, state) in fa.states().iter().enumerate() {
        let n = idx + 1;
        let node_label = state.opaque.map(|o| o.to_string()).unwrap_or_default();
        let _ = write!(out, "\t{n} [label=\"{}\"", escape(&node_label, "\""));
        let _ = write!(out, " style=\"state");
        if state.accepting {
            let _ = write!(out, ",accepting");
        }
        if idx as crate::fa::StateId == start {
            let _ = write!(out, ",initial");
        }
        let _ = writeln!(out, "\"];");
    }

    for (idx, state) in fa.states().iter().enumerate() {
        let n = idx + 1;
        for group in group_by_dest(&state.trans) {
            let dest = group[0].dest + 1;
            let _ = write!(out, "\t{n} -> {dest} [label=\"");
            write_group_label(&mut out, &group);
            if dest as usize == n {
                let _ = writeln!(out, "\",topath=\"loop above\"];");
            } else {
                let _ = writeln!(out, "\"];");
            }
        }
    }

    let _ = writeln!(out, "}}");
    out
}

fn group_by_dest(trans: &[Transition]) -> Vec<Vec<Transition>> {
    let mut sorted: Vec<Transition> = trans.to_vec();
    sorted.sort_by_key(|t| (t.dest, t.symfrom));

    let mut groups: Vec<Vec<Transition>> = Vec::new();
    for t in sorted {
        match groups.last_mut() {
            Some(g) if g[0].dest == t.dest => g.push(t),
            _ => groups.push(vec![t]),
        }
    }
    groups
}

fn write_group_label(out: &mut String, group: &[Transition]) {
    for (i, t) in group.iter().enumerate() {
        write_symbol(out, t.symfrom);
        if t.symto - t.symfrom > 1 {
            out.push('-');
        }
        if t.symto - t.symfrom > 0 {
            if t.symto - t.symfrom == 1 {
                out.push(',');
            }
            write_symbol(out, t.symto);
        }
        if i + 1 < group.len() {
            out.push(',');
        }
    }
}

/// Writes one endpoint of a transition range: the double-backslashed
/// `\\epsilon` TeX macro, a printable byte (escaped), a recognized
/// control-byte shorthand, or a `0xHH` fallback. Grounded on
/// `fa_graphviz_tikz_output_ex_symbol`.
fn write_symbol(out: &mut String, symbol: Symbol) {
    if symbol == EPSILON {
        out.push_str("\\\\epsilon");
        return;
    }

    let b = symbol as u8;
    if (0x20..=0x7e).contains(&symbol) {
        if b == b'\\' || b == b'"' {
            out.push('\\');
        }
        out.push(b as char);
    } else if let Some(letter) = ascii_escape_letter(b) {
        out.push('\\');
        out.push('\\');
        out.push(letter);
    } else {
        let _ = write!(out, "0x{b:x}");
    }
}

fn ascii_escape_letter(b: u8) -> Option<char> {
    match b {
        0x00 => Some('0'),
        0x07 => Some('a'),
        0x09 => Some('t'),
        0x0a => Some('n'),
        0x0b => Some('v'),
        0x0c => Some('f'),
        0x0d => Some('r'),
        _ => None,
    }
}

fn escape(s: &str, esc: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if esc.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::construct;

    #[test]
    fn emits_digraph_with_tikz_preamble() {
        let fa = construct::string(b"a", false);
        let dot = write(&fa);
        assert!(dot.starts_with("digraph fa {\n"));
        assert!(dot.contains("d2tfigpreamble"));
    }

    #[test]
    fn start_state_gets_initial_style() {
        let fa = construct::string(b"a", false);
        let dot = write(&fa);
        let start_line = dot.lines().find(|l| l.starts_with("\t1 [")).unwrap();
        assert!(start_line.contains("initial"));
    }

    #[test]
    fn accepting_state_gets_accepting_style() {
        let fa = construct::string(b"a", false);
        let dot = write(&fa);
        assert!(dot.contains("accepting"));
    }

    #[test]
    fn self_loop_gets_loop_above_topath() {
        let fa = construct::kstar(construct::string(b"a", false));
        let dot = write(&fa);
        assert!(dot.contains("topath=\"loop above\""));
    }
}
