//! Subset construction: turns an NFA (possibly with epsilon transitions)
//! into an equivalent DFA.
//!
//! Grounded on `fa_determinize_ex`. The worklist is a queue of not-yet-
//! expanded DFA states, each tagged with the sorted NFA [`StateSet`] it
//! represents; a [`IndexMap`] from that sorted set to the DFA state id
//! replaces the source's `fa_state_set_hash` (a 199-bucket chained hash
//! keyed the same way). When more than one accepting NFA state collapses
//! into a single DFA state, an optional priority callback picks which
//! state's opaque the merged state inherits.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;

use indexmap::IndexMap;

use crate::config::{is_cancelled, Limits};
use crate::error::{Error, Result};
use crate::fa::{Fa, Opaque, StateId};
use crate::stateset::StateSet;

fn eclosure(fa: &Fa, seed: &[StateId]) -> StateSet {
    let mut reachable = StateSet::new();
    let mut stack: VecDeque<StateId> = VecDeque::new();

    for &s in seed {
        if reachable.add(fa, s) {
            stack.push_back(s);
        }
    }

    while let Some(s) = stack.pop_front() {
        for t in &fa.state(s).trans {
            if t.is_epsilon() && reachable.add(fa, t.dest) {
                stack.push_back(t.dest);
            }
        }
    }

    reachable
}

fn reachable_on_symbol(fa: &Fa, set: &StateSet, symbol: u8) -> Vec<StateId> {
    let mut out = Vec::new();
    for &s in set.states() {
        for t in &fa.state(s).trans {
            if t.is_epsilon() {
                continue;
            }
            if t.symfrom as i32 <= symbol as i32 && t.symto as i32 >= symbol as i32 {
                out.push(t.dest);
            }
        }
    }
    out
}

/// Resolves which opaque a merged accepting DFA state inherits when more
/// than one distinct opaque is present among its NFA states. Unlike the
/// source's `fa_unique_array` + raw-pointer dedup, this receives the
/// already-deduplicated, order-preserving list of distinct opaques.
pub trait PriorityResolver {
    fn resolve(&mut self, opaques: &[Opaque]) -> Opaque;
}

impl<F: FnMut(&[Opaque]) -> Opaque> PriorityResolver for F {
    fn resolve(&mut self, opaques: &[Opaque]) -> Opaque {
        self(opaques)
    }
}

/// Determinizes `fa` with no opaque priority resolution, no limits, and no
/// cancellation flag.
pub fn determinize(fa: &Fa) -> Fa {
    determinize_ex(fa, None, None, None).expect("unbounded determinize cannot be cancelled")
}

/// Determinizes `fa`.
///
/// `pri_cb`, when given, resolves ties among distinct opaques merged into
/// one accepting DFA state; without it a merged state simply keeps the
/// first opaque encountered among its NFA states (mirroring the source's
/// `n == 0` take-first fallback, generalized to the case where the caller
/// never wants ties broken at all). Returns [`Error::Cancelled`] if
/// `cancel` is raised or a limit in `limits` is exceeded before the
/// worklist drains.
pub fn determinize_ex(
    fa: &Fa,
    mut pri_cb: Option<&mut dyn PriorityResolver>,
    limits: Option<&Limits>,
    cancel: Option<&AtomicBool>,
) -> Result<Fa> {
    let mut dfa = Fa::new();
    let mut cache: IndexMap<Vec<StateId>, StateId> = IndexMap::new();
    let mut sets: Vec<StateSet> = Vec::new();
    let mut unmarked: VecDeque<StateId> = VecDeque::new();

    let mut start_set = eclosure(fa, &[fa.start()]);
    start_set.sort();
    let dfa_start = dfa.state_create();
    dfa.set_start(dfa_start);
    cache.insert(start_set.states().to_vec(), dfa_start);
    sets.push(start_set);
    unmarked.push_back(dfa_start);

    while let Some(t) = unmarked.pop_front() {
        let ts = sets[t as usize].clone();
        let syms = ts.symbols(fa);

        for symbol in syms.iter() {
            let reached = reachable_on_symbol(fa, &ts, symbol);
            let mut eset = eclosure(fa, &reached);
            eset.sort();
            let key = eset.states().to_vec();

            let u = match cache.get(&key) {
                Some(&u) => u,
                None => {
                    let u = dfa.state_create();
                    cache.insert(key, u);
                    sets.push(eset);
                    unmarked.push_back(u);
                    u
                }
            };

            dfa.trans_create(t, symbol as i32, u);
        }

        if is_cancelled(cancel) {
            return Err(Error::Cancelled);
        }
        if let Some(limits) = limits {
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
        }
    }

    for (dfa_id, set) in sets.iter().enumerate() {
        let dfa_id = dfa_id as StateId;
        if !set.is_accepting() {
            continue;
        }
        dfa.state_mut(dfa_id).accepting = true;

        let mut distinct: Vec<Opaque> = Vec::new();
        for &nfa_id in set.states() {
            let nfa_state = fa.state(nfa_id);
            if !nfa_state.accepting {
                continue;
            }
            if let Some(op) = nfa_state.opaque {
                if !distinct.contains(&op) {
                    distinct.push(op);
                }
            }
        }

        let opaque = match distinct.len() {
            0 => None,
            1 => Some(distinct[0]),
            _ => match pri_cb.as_deref_mut() {
                Some(cb) => Some(cb.resolve(&distinct)),
                None => Some(distinct[0]),
            },
        };

        dfa.state_mut(dfa_id).opaque = opaque;
    }

    Ok(dfa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::construct::{string, union};
    use crate::sim::{Outcome, Sim};

    fn accepts(fa: &Fa, s: &[u8]) -> bool {
        let sim = Sim::build(fa);
        let mut run = sim.new_run();
        matches!(sim.run(&mut run, s), Outcome::Accept)
    }

    #[test]
    fn determinize_preserves_language() {
        let nfa = union(string(b"cat", false), string(b"car", false));
        let dfa = determinize(&nfa);
        assert!(accepts(&dfa, b"cat"));
        assert!(accepts(&dfa, b"car"));
        assert!(!accepts(&dfa, b"ca"));
        assert!(!accepts(&dfa, b"cab"));
    }

    #[test]
    fn determinize_merges_opaque_by_priority() {
        let mut a = string(b"a", false);
        a.set_accepting_opaque(1);
        let mut b = string(b"a", false);
        b.set_accepting_opaque(2);
        let nfa = union(a, b);

        let dfa = determinize_ex(&nfa, None, None, None).unwrap();
        let sim = Sim::build(&dfa);
        let mut run = sim.new_run();
        assert!(matches!(sim.run(&mut run, b"a"), Outcome::Accept));

        let mut opaques = Vec::new();
        dfa.foreach_accepting(|op| opaques.push(op));
        assert_eq!(opaques, vec![Some(1)]);
    }

    #[test]
    fn determinize_respects_state_limit() {
        let nfa = union(string(b"cat", false), string(b"car", false));
        let limits = Limits::new(1, 1000);
        let err = determinize_ex(&nfa, None, Some(&limits), None).unwrap_err();
        assert!(matches!(err, Error::LimitExceeded { what: "states", .. }));
    }
}
