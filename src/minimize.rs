//! Partition-refinement minimization of a deterministic automaton
//! (Hopcroft-style).
//!
//! Grounded on `fa_minimize_ex`. States start in one big partition group;
//! each sweep looks for a group containing two states distinguishable by
//! accepting-flag, by their sorted transitions leading to different
//! groups, or by a caller-supplied comparator, and splits it. Sweeps
//! repeat until a pass makes no split. `group_of` (a plain `Vec<usize>`
//! indexed by [`StateId`]) replaces the source's `opaque_temp` pointer
//! field used for the same bookkeeping.
//!
//! Operates on an already-deterministic automaton: states are assumed to
//! carry no epsilon transitions.

use std::sync::atomic::AtomicBool;

use crate::config::is_cancelled;
use crate::error::{Error, Result};
use crate::fa::{Fa, Opaque, StateId};

/// Forces two otherwise-indistinguishable states to be treated as
/// distinguishable, e.g. to keep opaques from different source patterns
/// in separate minimized states. Grounded on `fa_state_cmp_f`.
pub trait DistinguishCmp {
    fn distinguish(&mut self, a: Option<Opaque>, b: Option<Opaque>) -> bool;
}

impl<F: FnMut(Option<Opaque>, Option<Opaque>) -> bool> DistinguishCmp for F {
    fn distinguish(&mut self, a: Option<Opaque>, b: Option<Opaque>) -> bool {
        self(a, b)
    }
}

/// Minimizes `fa` with no comparator and no cancellation flag.
#[must_use]
pub fn minimize(fa: &Fa) -> Fa {
    minimize_ex(fa, &mut None, None).expect("unbounded minimize cannot be cancelled")
}

/// Minimizes `fa`. Returns [`Error::Cancelled`] if `cancel` is raised
/// between refinement sweeps.
pub fn minimize_ex(
    fa: &Fa,
    cmp_cb: &mut Option<&mut dyn DistinguishCmp>,
    cancel: Option<&AtomicBool>,
) -> Result<Fa> {
    let n = fa.states_n() as usize;
    let mut group_of = vec![0usize; n];
    // `groups` is stable storage keyed by group id; `order` is the actual
    // traversal/display order (the source's linked list), into which a
    // freshly split group is spliced directly after its parent rather
    // than appended at the tail.
    let mut groups: Vec<Vec<StateId>> = vec![(0..n as u32).collect()];
    let mut order: Vec<usize> = vec![0];

    let mut changed = true;
    while changed {
        changed = false;
        let mut idx = 0;

        while idx < order.len() {
            let gid = order[idx];
            if let Some(moved) = split_group(fa, &groups[gid], &group_of, cmp_cb) {
                let new_gid = groups.len();
                for &s in &moved {
                    group_of[s as usize] = new_gid;
                }
                groups[gid].retain(|s| !moved.contains(s));
                groups.push(moved);
                order.insert(idx + 1, new_gid);
                changed = true;
            }
            idx += 1;
        }

        if is_cancelled(cancel) {
            return Err(Error::Cancelled);
        }
    }

    Ok(rebuild(fa, &groups, &order, &group_of))
}

/// If `group` contains states distinguishable from its first member,
/// returns the states that should move into a new group. Grounded on
/// `fa_minimize_distinguish_group`.
fn split_group(
    fa: &Fa,
    group: &[StateId],
    group_of: &[usize],
    cmp_cb: &mut Option<&mut dyn DistinguishCmp>,
) -> Option<Vec<StateId>> {
    if group.len() < 2 {
        return None;
    }

    let first = group[0];
    let diff_start = group[1..]
        .iter()
        .position(|&s| distinguishable(fa, group_of, first, s, cmp_cb))?;

    let moved: Vec<StateId> = group[1 + diff_start..]
        .iter()
        .copied()
        .filter(|&s| distinguishable(fa, group_of, first, s, cmp_cb))
        .collect();

    Some(moved)
}

/// `true` if `a` and `b` differ in accepting status, in the group their
/// aligned transition ranges lead to, in transition coverage, or by
/// `cmp_cb`. Grounded on `fa_minimize_distinguishable_state`.
fn distinguishable(
    fa: &Fa,
    group_of: &[usize],
    a: StateId,
    b: StateId,
    cmp_cb: &mut Option<&mut dyn DistinguishCmp>,
) -> bool {
    let sa = fa.state(a);
    let sb = fa.state(b);

    if sa.accepting != sb.accepting {
        return true;
    }

    let ta = &sa.trans;
    let tb = &sb.trans;
    let mut ia = 0usize;
    let mut ib = 0usize;
    let mut a_from = ta.first().map(|t| t.symfrom);
    let mut b_from = tb.first().map(|t| t.symfrom);

    while ia < ta.len() && ib < tb.len() {
        if a_from != b_from {
            return true;
        }
        if group_of[ta[ia].dest as usize] != group_of[tb[ib].dest as usize] {
            return true;
        }

        if ta[ia].symto < tb[ib].symto {
            b_from = Some(ta[ia].symto + 1);
            ia += 1;
            a_from = ta.get(ia).map(|t| t.symfrom);
        } else if ta[ia].symto > tb[ib].symto {
            a_from = Some(tb[ib].symto + 1);
            ib += 1;
            b_from = tb.get(ib).map(|t| t.symfrom);
        } else {
            ia += 1;
            ib += 1;
            a_from = ta.get(ia).map(|t| t.symfrom);
            b_from = tb.get(ib).map(|t| t.symfrom);
        }
    }

    if ia < ta.len() || ib < tb.len() {
        return true;
    }

    if let Some(cb) = cmp_cb.as_deref_mut() {
        if cb.distinguish(sa.opaque, sb.opaque) {
            return true;
        }
    }

    false
}

/// Builds the minimized automaton: one state per final group, transitions
/// copied from each group's first (candidate) member, reparented onto
/// group states. States are created in `order`, the same group order
/// `minimize_ex` maintains (parent immediately followed by its splits),
/// so the output's state numbering reflects that order, not group id.
fn rebuild(fa: &Fa, groups: &[Vec<StateId>], order: &[usize], group_of: &[usize]) -> Fa {
    let mut mfa = Fa::new();
    let mut group_state: Vec<Option<StateId>> = vec![None; groups.len()];
    for &gid in order {
        group_state[gid] = Some(mfa.state_create());
    }
    let start = fa.start();

    for &gid in order {
        let group = &groups[gid];
        let candidate = fa.state(group[0]);
        let mfs = group_state[gid].expect("every group in `order` was given a state above");

        for t in &candidate.trans {
            let dest = group_state[group_of[t.dest as usize]].expect("destination group is live");
            for sym in t.symfrom..=t.symto {
                mfa.trans_create(mfs, sym, dest);
            }
        }

        if group.contains(&start) {
            mfa.set_start(mfs);
        }
        if candidate.accepting {
            mfa.state_mut(mfs).accepting = true;
        }
        mfa.state_mut(mfs).opaque = candidate.opaque;
    }

    mfa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::determinize::determinize;
    use crate::fa::construct::{kstar, repeat, string, union};
    use crate::sim::{Outcome, Sim};

    fn accepts(fa: &Fa, s: &[u8]) -> bool {
        let sim = Sim::build(fa);
        let mut run = sim.new_run();
        matches!(sim.run(&mut run, s), Outcome::Accept)
    }

    #[test]
    fn minimize_preserves_language() {
        let nfa = union(string(b"cat", false), string(b"car", false));
        let dfa = determinize(&nfa);
        let mfa = minimize(&dfa);

        assert!(accepts(&mfa, b"cat"));
        assert!(accepts(&mfa, b"car"));
        assert!(!accepts(&mfa, b"ca"));
        assert!(!accepts(&mfa, b"dog"));
    }

    #[test]
    fn minimize_collapses_equivalent_states() {
        // (a|b)* has a single minimal state, but many NFA/DFA states.
        let nfa = repeat(union(string(b"a", false), string(b"b", false)), 0, 0, None).unwrap();
        let dfa = determinize(&nfa);
        let mfa = minimize(&dfa);

        assert_eq!(mfa.states_n(), 1);
        assert!(accepts(&mfa, b"aabba"));
        assert!(!accepts(&mfa, b"aabc"));
    }

    #[test]
    fn cmp_cb_keeps_distinct_opaques_apart() {
        let mut a = string(b"a", false);
        a.set_accepting_opaque(1);
        let mut b = string(b"b", false);
        b.set_accepting_opaque(2);
        let nfa = union(kstar(a), kstar(b));
        let dfa = determinize(&nfa);

        let mut cb: Box<dyn DistinguishCmp> = Box::new(|x: Option<Opaque>, y: Option<Opaque>| x != y);
        let mut opt: Option<&mut dyn DistinguishCmp> = Some(cb.as_mut());
        let mfa = minimize_ex(&dfa, &mut opt, None).unwrap();

        let mut opaques = Vec::new();
        mfa.foreach_accepting(|op| opaques.push(op));
        opaques.sort();
        assert_eq!(opaques, vec![Some(1), Some(2)]);
    }
}
