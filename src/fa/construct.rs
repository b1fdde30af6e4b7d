//! Algebraic combinators: string literals, union, concatenation, bounded
//! repetition, and Kleene star.
//!
//! Grounded on `fa.c`'s `fa_string_ex`, `fa_union_list`, `fa_concat_list`,
//! `fa_repeat`, `fa_kstar`. Every combinator here takes ownership of its
//! input `Fa`s by value, so the compiler rejects any attempt to reuse an
//! already-consumed automaton — the type-level enforcement the source's
//! Design Notes call out as an option for languages with linear typing.

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::fa::{Fa, StateId, EPSILON};

/// Builds the FA for a literal byte string. `"abc"` becomes a linear chain
/// of four states: `->()-a->()-b->()-c->(o)`. When `icase` is set, each
/// alphabetic byte also gets a transition for its opposite case to the same
/// destination (a single transition per hop still handles any case of a
/// non-alphabetic byte).
#[must_use]
pub fn string(bytes: &[u8], icase: bool) -> Fa {
    let mut fa = Fa::new();
    let start = fa.state_create();
    fa.set_start(start);

    let mut prev = start;
    for &b in bytes {
        let cur = fa.state_create();
        fa.trans_create(prev, b as i32, cur);
        if icase && b.is_ascii_alphabetic() {
            let other = if b.is_ascii_uppercase() {
                b.to_ascii_lowercase()
            } else {
                b.to_ascii_uppercase()
            };
            fa.trans_create(prev, other as i32, cur);
        }
        prev = cur;
    }

    fa.state_mut(prev).accepting = true;
    fa
}

fn start_has_only_epsilon(fa: &Fa) -> bool {
    fa.state(fa.start())
        .trans
        .iter()
        .all(|t| t.symfrom == EPSILON && t.symto == EPSILON)
}

/// Builds the union of `k` automata. If one input's start state has only
/// epsilon transitions, it is reused as the composite start (avoiding an
/// extra epsilon hop); otherwise a fresh start state is created and wired to
/// every input's start with an epsilon transition.
///
/// # Panics
/// Panics if `fas` is empty (mirrors the source's `assert(n > 0)`).
#[must_use]
pub fn union_list(fas: Vec<Fa>) -> Fa {
    assert!(!fas.is_empty(), "union_list requires at least one automaton");

    let mut ufa = Fa::new();
    let reuse_idx = fas.iter().position(start_has_only_epsilon);

    let composite_start = match reuse_idx {
        Some(_) => None, // resolved after the chosen input is appended
        None => {
            let s = ufa.state_create();
            ufa.set_start(s);
            Some(s)
        }
    };
    let mut composite_start = composite_start;

    for (i, fa) in fas.into_iter().enumerate() {
        let reused = reuse_idx == Some(i);
        let src_start = fa.start();
        let offset = ufa.append(fa);
        let moved_start = src_start + offset;

        if reused {
            ufa.set_start(moved_start);
            composite_start = Some(moved_start);
        } else {
            ufa.trans_create(composite_start.expect("composite start set"), EPSILON, moved_start);
        }
    }

    ufa
}

/// Builds the union of two automata.
#[must_use]
pub fn union(a: Fa, b: Fa) -> Fa {
    union_list(vec![a, b])
}

/// Builds the concatenation of `k` automata in order: `..1..->..2..->..n..`.
/// Every accepting state of input `i` (`i < n-1`) loses its accepting flag
/// and gains an epsilon transition to input `i+1`'s start.
///
/// # Panics
/// Panics if `fas` is empty.
#[must_use]
pub fn concat_list(mut fas: Vec<Fa>) -> Fa {
    assert!(!fas.is_empty(), "concat_list requires at least one automaton");

    if fas.len() == 1 {
        return fas.pop().unwrap();
    }

    let mut iter = fas.into_iter();
    let mut cfa = iter.next().unwrap();
    let start = cfa.start();
    cfa.set_start(start);

    for next_fa in iter {
        let next_start = next_fa.start();

        // Gather accepting states of the automaton built so far that belong
        // to the segment just completed (i.e. every currently-accepting
        // state, since earlier segments already lost theirs).
        let accepting: Vec<_> = cfa
            .states()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.accepting)
            .map(|(id, _)| id as u32)
            .collect();

        let offset = cfa.append(next_fa);
        let moved_next_start = next_start + offset;

        for acc in accepting {
            cfa.trans_create(acc, EPSILON, moved_next_start);
            cfa.state_mut(acc).accepting = false;
        }
    }

    cfa
}

/// Concatenates two automata.
#[must_use]
pub fn concat(a: Fa, b: Fa) -> Fa {
    concat_list(vec![a, b])
}

/// Builds the Kleene star of `fa` in place: the start becomes accepting
/// (matches the empty string), and every other accepting state gains an
/// epsilon transition back to the start.
#[must_use]
pub fn kstar(mut fa: Fa) -> Fa {
    let start = fa.start();
    fa.state_mut(start).accepting = true;

    let accepting: Vec<_> = fa
        .states()
        .iter()
        .enumerate()
        .filter(|(id, s)| s.accepting && *id as u32 != start)
        .map(|(id, _)| id as u32)
        .collect();

    for acc in accepting {
        fa.trans_create(acc, EPSILON, start);
    }

    fa
}

pub(crate) fn check_limits(fa: &Fa, limits: Option<&Limits>) -> Result<()> {
    let Some(limits) = limits else { return Ok(()) };
    if let Some(max) = limits.states {
        if fa.states_n() > max {
            return Err(Error::LimitExceeded {
                what: "states",
                would_be: fa.states_n(),
                limit: max,
            });
        }
    }
    if let Some(max) = limits.trans {
        if fa.trans_n() > max {
            return Err(Error::LimitExceeded {
                what: "trans",
                would_be: fa.trans_n(),
                limit: max,
            });
        }
    }
    Ok(())
}

/// Builds a standalone automaton matching `0..=diff` further repetitions of
/// `fa`. Each clone's start also epsilon-reaches a shared accepting sink
/// directly (so the chain may stop at any point), while its accepting
/// states lose their own accepting flag and instead epsilon-reach the next
/// clone (or the sink, for the last one).
fn optional_tail(fa: &Fa, diff: u32) -> Fa {
    let mut sink = Fa::new();
    let sink_start = sink.state_create();
    sink.set_start(sink_start);
    sink.state_mut(sink_start).accepting = true;

    if diff == 0 {
        return sink;
    }

    let mut parts: Vec<Fa> = (0..diff).map(|_| fa.clone()).collect();
    parts.push(sink);

    let starts: Vec<StateId> = parts.iter().map(Fa::start).collect();
    let accept_sets: Vec<Vec<StateId>> = parts
        .iter()
        .map(|f| {
            f.states()
                .iter()
                .enumerate()
                .filter(|(_, s)| s.accepting)
                .map(|(id, _)| id as u32)
                .collect()
        })
        .collect();

    let mut offsets = Vec::with_capacity(parts.len());
    let mut acc = 0u32;
    for p in &parts {
        offsets.push(acc);
        acc += p.states_n();
    }

    let mut tfa = Fa::new();
    for p in parts {
        tfa.append(p);
    }
    tfa.set_start(starts[0] + offsets[0]);

    for i in 0..diff as usize {
        let clone_start = starts[i] + offsets[i];
        let next_start = starts[i + 1] + offsets[i + 1];
        let sink_start_final = starts[diff as usize] + offsets[diff as usize];
        tfa.trans_create(clone_start, EPSILON, sink_start_final);
        for &acc_state in &accept_sets[i] {
            let acc_state = acc_state + offsets[i];
            tfa.trans_create(acc_state, EPSILON, next_start);
            tfa.state_mut(acc_state).accepting = false;
        }
    }

    tfa
}

/// Bounded repetition `fa{min,max}`. `max == 0` means unbounded (`min` or
/// more). `a*` is `(0, 0)`, `a+` is `(1, 0)`, `a?` is `(0, 1)`.
///
/// Grounded on `fa_repeat`: `min` clones are concatenated; an unbounded tail
/// is a Kleene star of one more clone, a bounded tail is
/// [`optional_tail`] for the remaining `max - min` repetitions.
pub fn repeat(fa: Fa, min: u32, max: u32, limits: Option<&Limits>) -> Result<Fa> {
    if max != 0 && min > max {
        return Err(Error::InvalidRepeat { min, max });
    }

    let result = if max == 0 {
        if min == 0 {
            kstar(fa)
        } else {
            let mut clones: Vec<Fa> = (0..min - 1).map(|_| fa.clone()).collect();
            clones.push(kstar(fa));
            concat_list(clones)
        }
    } else {
        let diff = max - min;
        if min == 0 {
            optional_tail(&fa, diff)
        } else {
            let mut clones: Vec<Fa> = (0..min).map(|_| fa.clone()).collect();
            clones.push(optional_tail(&fa, diff));
            concat_list(clones)
        }
    };

    check_limits(&result, limits)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Outcome, Sim};

    fn accepts(fa: &Fa, s: &[u8]) -> bool {
        let sim = Sim::build(fa);
        let mut run = sim.new_run();
        matches!(sim.run(&mut run, s), Outcome::Accept)
    }

    #[test]
    fn string_builds_linear_chain() {
        let fa = string(b"abc", false);
        assert_eq!(fa.states_n(), 4);
        assert!(accepts(&fa, b"abc"));
        assert!(!accepts(&fa, b"ab"));
    }

    #[test]
    fn string_icase_matches_either_case() {
        let fa = string(b"Ab", true);
        assert!(accepts(&fa, b"Ab"));
        assert!(accepts(&fa, b"ab"));
        assert!(accepts(&fa, b"AB"));
        assert!(accepts(&fa, b"aB"));
    }

    #[test]
    fn union_accepts_either() {
        let fa = union(string(b"cat", false), string(b"dog", false));
        assert!(accepts(&fa, b"cat"));
        assert!(accepts(&fa, b"dog"));
        assert!(!accepts(&fa, b"cow"));
    }

    #[test]
    fn concat_accepts_sequence() {
        let fa = concat(string(b"foo", false), string(b"bar", false));
        assert!(accepts(&fa, b"foobar"));
        assert!(!accepts(&fa, b"foo"));
        assert!(!accepts(&fa, b"bar"));
    }

    #[test]
    fn kstar_accepts_empty_and_repeats() {
        let fa = kstar(string(b"a", false));
        assert!(accepts(&fa, b""));
        assert!(accepts(&fa, b"aaaa"));
        assert!(!accepts(&fa, b"ab"));
    }

    #[test]
    fn repeat_exact() {
        let fa = repeat(string(b"a", false), 3, 3, None).unwrap();
        assert!(accepts(&fa, b"aaa"));
        assert!(!accepts(&fa, b"aa"));
        assert!(!accepts(&fa, b"aaaa"));
    }

    #[test]
    fn repeat_bounded_range() {
        let fa = repeat(string(b"a", false), 1, 3, None).unwrap();
        assert!(!accepts(&fa, b""));
        assert!(accepts(&fa, b"a"));
        assert!(accepts(&fa, b"aa"));
        assert!(accepts(&fa, b"aaa"));
        assert!(!accepts(&fa, b"aaaa"));
    }

    #[test]
    fn repeat_unbounded() {
        let fa = repeat(string(b"a", false), 2, 0, None).unwrap();
        assert!(!accepts(&fa, b"a"));
        assert!(accepts(&fa, b"aa"));
        assert!(accepts(&fa, b"aaaaaa"));
    }

    #[test]
    fn repeat_invalid_min_gt_max() {
        let err = repeat(string(b"a", false), 5, 3, None).unwrap_err();
        assert!(matches!(err, Error::InvalidRepeat { min: 5, max: 3 }));
    }

    #[test]
    fn remove_unreachable_drops_dead_states() {
        let mut fa = Fa::new();
        let s0 = fa.state_create();
        let s1 = fa.state_create();
        let dead = fa.state_create();
        fa.set_start(s0);
        fa.trans_create(s0, b'a' as i32, s1);
        fa.state_mut(s1).accepting = true;
        let _ = dead;

        let cleaned = fa.remove_unreachable();
        assert_eq!(cleaned.states_n(), 2);
    }
}
