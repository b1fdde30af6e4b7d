//! The textual FA file format: a line-oriented, UTF-8-agnostic notation
//! for states and their transitions.
//!
//! ```text
//! # state 1, byte transition to state 2, epsilon transition to state 2
//! 1:
//!   a -> 2
//!   -> 2
//!
//! # state 2, accepting, with one b transition back to itself
//! 2:t
//!   b -> 2
//! ```
//!
//! A non-indented `N:[flags]` line declares state `N` (`s` marks it the
//! start state, `t` marks it accepting). Indented lines of the form
//! `SYMBOL -> M` declare a transition out of the most recently declared
//! state; `SYMBOL` is a single printable byte, `0xHH`, or empty for
//! epsilon. Lines whose first non-space byte is `#` are comments.
//!
//! Grounded on `fa_text_input_ex`/`fa_text_output_ex`, with one
//! correction: the source re-declares its "current state" local inside
//! the per-line loop, which resets it to null every iteration and so
//! silently drops every indented transition line it reads. Here the
//! current state persists across lines, as the grammar's indentation
//! rule actually implies.

use std::collections::HashMap;
use std::fmt::Write as _;

use thiserror::Error;

use crate::fa::{Fa, StateId, EPSILON};

/// A malformed line in the textual FA format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    /// An indented transition line appeared before any state header.
    #[error("line {line}: transition given before any state header")]
    NoCurrentState { line: usize },
    /// A `0xHH` symbol failed to parse as hex.
    #[error("line {line}: invalid hex symbol")]
    InvalidHex { line: usize },
}

/// Parses `input` in the textual FA format.
pub fn read(input: &str) -> Result<Fa, TextError> {
    let mut fa = Fa::new();
    let mut labels: HashMap<i64, StateId> = HashMap::new();
    let mut current: Option<StateId> = None;

    for (lineno, raw) in input.lines().enumerate() {
        let line = lineno + 1;
        let trimmed = raw.trim_start_matches(' ');
        let indented = trimmed.len() != raw.len();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if indented {
            let from = current.ok_or(TextError::NoCurrentState { line })?;
            let Some(arrow) = trimmed.find("->") else {
                continue;
            };

            let sym_text = trimmed[..arrow].trim();
            let dest_text = trimmed[arrow + 2..].trim();

            let symbol = if sym_text.is_empty() {
                EPSILON
            } else if let Some(hex) = sym_text.strip_prefix("0x") {
                i32::from_str_radix(hex, 16).map_err(|_| TextError::InvalidHex { line })?
            } else {
                sym_text.as_bytes()[0] as i32
            };

            let dest_label: i64 = dest_text.parse().unwrap_or(0);
            let dest = *labels.entry(dest_label).or_insert_with(|| fa.state_create());

            fa.trans_create(from, symbol, dest);
        } else {
            let Some(colon) = trimmed.find(':') else {
                continue;
            };
            let (num_text, flags) = trimmed.split_at(colon);
            let flags = &flags[1..];
            let label: i64 = num_text.trim().parse().unwrap_or(0);
            let id = *labels.entry(label).or_insert_with(|| fa.state_create());

            if flags.contains('t') {
                fa.state_mut(id).accepting = true;
            }
            if flags.contains('s') {
                fa.set_start(id);
            }
            current = Some(id);
        }
    }

    Ok(fa)
}

/// Emits `fa` in the textual FA format: one header line per state, numbered
/// from 1 in insertion order, and one transition line per concrete byte a
/// range covers (ranges re-coalesce on the next [`read`], since
/// [`Fa::trans_create`] merges adjacent same-destination bytes back
/// together). `label`, if given, is written as a leading comment.
pub fn write(fa: &Fa, label: Option<&str>) -> String {
    let mut out = String::new();
    let start = fa.start();

    if let Some(label) = label {
        let _ = writeln!(out, "# {label}");
    }

    for (idx, state) in fa.states().iter().enumerate() {
        let n = idx as StateId + 1;
        let _ = write!(out, "{n}:");
        if state.accepting {
            let _ = write!(out, "t");
        }
        if idx as StateId == start {
            let _ = write!(out, "s");
        }
        let _ = writeln!(out);

        for t in &state.trans {
            if t.is_epsilon() {
                let _ = writeln!(out, "   -> {}", t.dest + 1);
                continue;
            }
            for b in t.symfrom..=t.symto {
                let _ = write!(out, "  ");
                if (0x20..=0x7e).contains(&b) {
                    let _ = write!(out, "{}", b as u8 as char);
                } else {
                    let _ = write!(out, "0x{b:x}");
                }
                let _ = writeln!(out, " -> {}", t.dest + 1);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::construct;

    #[test]
    fn round_trips_through_text() {
        let fa = construct::string(b"ab", false);
        let text = write(&fa, Some("label"));
        let back = read(&text).unwrap();

        assert_eq!(back.states().len(), fa.states().len());
        assert_eq!(back.state(back.start()).accepting, fa.state(fa.start()).accepting);
    }

    #[test]
    fn reads_epsilon_and_accepting_start_flags() {
        let fa = read("1:st\n  -> 2\n2:\n").unwrap();
        assert_eq!(fa.states().len(), 2);
        assert!(fa.state(fa.start()).accepting);
        let trans = &fa.state(fa.start()).trans;
        assert_eq!(trans.len(), 1);
        assert!(trans[0].is_epsilon());
    }

    #[test]
    fn reads_hex_symbol() {
        let fa = read("1:s\n  0x41 -> 2\n2:t\n").unwrap();
        let trans = &fa.state(fa.start()).trans;
        assert_eq!(trans[0].symfrom, 0x41);
        assert_eq!(trans[0].symto, 0x41);
    }

    #[test]
    fn transition_before_header_errors() {
        let err = read("  a -> 2\n").unwrap_err();
        assert!(matches!(err, TextError::NoCurrentState { line: 1 }));
    }

    #[test]
    fn skips_comment_lines() {
        let fa = read("# a comment\n1:s\n").unwrap();
        assert_eq!(fa.states().len(), 1);
    }

    #[test]
    fn adjacent_single_byte_lines_recoalesce_into_one_range() {
        let text = "1:s\n  a -> 2\n  b -> 2\n  c -> 2\n2:t\n";
        let fa = read(text).unwrap();
        let trans = &fa.state(fa.start()).trans;
        assert_eq!(trans.len(), 1);
        assert_eq!(trans[0].symfrom, b'a' as i32);
        assert_eq!(trans[0].symto, b'c' as i32);
    }
}
