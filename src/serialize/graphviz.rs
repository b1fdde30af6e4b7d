//! Plain GraphViz `dot` emitter.
//!
//! Grounded on `fa_graphviz_output_ex`: left-to-right rank, a point node
//! feeding an arrow into the start state, doublecircle accepting states
//! labeled with their opaque tag, and one edge per destination state with
//! every transition range to it folded into a single comma-separated
//! label (`a-m,p-z`) rather than one edge per range.

use std::fmt::Write as _;

use crate::fa::{Fa, Symbol, Transition, EPSILON};

/// Emits `fa` as a `digraph fa { ... }` GraphViz source. `label`, if
/// given, becomes the graph's title.
pub fn write(fa: &Fa, label: Option<&str>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "digraph fa {{");
    let _ = writeln!(out, "\trankdir=LR;");
    let _ = writeln!(out, "\tnode [shape=circle style=filled fillcolor=\"#f0f0f0\"]");
    if let Some(label) = label {
        let _ = writeln!(out, "\tgraph [label=\"{}\"]", escape(label, "\\"));
    }
    let _ = writeln!(out, "\tstart [shape=point];");
    let _ = writeln!(out, "\tstart -> {}", fa.start() + 1);

    for (idx, state) in fa.states().iter().enumerate() {
        let n = idx + 1;
        let node_label = if state.accepting {
            state.opaque.map(|o| o.to_string()).unwrap_or_default()
        } else {
            String::new()
        };
        let _ = write!(out, "\t{n} [label=\"{}\"", escape(&node_label, "\""));
        if state.accepting {
            let _ = write!(out, " shape=doublecircle");
        }
        let _ = writeln!(out, "];");
    }

    for (idx, state) in fa.states().iter().enumerate() {
        let n = idx + 1;
        for group in group_by_dest(&state.trans) {
            let _ = write!(out, "\t{n} -> {} [label=\"", group[0].dest + 1);
            write_group_label(&mut out, &group);
            let _ = writeln!(out, "\"];");
        }
    }

    let _ = writeln!(out, "}}");
    out
}

/// Sorts a copy of `trans` by `(dest, symfrom)` and splits it into maximal
/// runs sharing the same destination, so every destination gets exactly
/// one edge. Grounded on `trans_cmp` plus the `fa_graphviz_output_ex`
/// grouping loop.
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

/// Writes one endpoint of a transition range: the UTF-8 epsilon glyph, a
/// printable byte (escaped), a recognized control-byte shorthand (`\n`,
/// `\t`, ...; double-backslashed so GraphViz prints the two-character
/// escape literally instead of interpreting it), or a `0xHH` fallback.
fn write_symbol(out: &mut String, symbol: Symbol) {
    if symbol == EPSILON {
        out.push('\u{0190}');
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
    fn emits_digraph_header_and_start_edge() {
        let fa = construct::string(b"a", false);
        let dot = write(&fa, Some("demo"));
        assert!(dot.starts_with("digraph fa {\n"));
        assert!(dot.contains("rankdir=LR"));
        assert!(dot.contains("graph [label=\"demo\"]"));
        assert!(dot.contains(&format!("start -> {}", fa.start() + 1)));
    }

    #[test]
    fn accepting_state_gets_doublecircle() {
        let fa = construct::string(b"a", false);
        let dot = write(&fa, None);
        assert!(dot.contains("shape=doublecircle"));
    }

    #[test]
    fn merges_ranges_to_same_destination_onto_one_edge() {
        let lower = construct::string(b"a", false);
        let upper = construct::string(b"z", false);
        let fa = construct::union(lower, upper);
        let dot = write(&fa, None);
        // both byte transitions from the start share a destination
        // (the shared accepting state), so there must be exactly one
        // edge between them, not two.
        let start_edges = dot.matches(&format!("\t{} -> ", fa.start() + 1)).count();
        assert_eq!(start_edges, 1);
    }

    #[test]
    fn escapes_control_byte_as_double_backslash_letter() {
        let fa = construct::string(b"\n", false);
        let dot = write(&fa, None);
        assert!(dot.contains("\\\\n"));
    }
}
