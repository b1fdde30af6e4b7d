//! Sets of NFA states, with a cached outgoing-symbol bitmap — the
//! identity the determinizer's subset construction keys its worklist on.
//!
//! Grounded on `fa_state_set.c`. The source builds this as a growable
//! array plus a lazily-computed symbol bitmap, sorted and compared by raw
//! state pointer for use as a hash key (`fa_state_set_hash.c`). This crate
//! keeps a sorted `Vec<StateId>` (indices sort the same way pointers did)
//! and uses it directly as an `IndexMap` key, replacing the source's
//! 199-bucket chained hash table.

use crate::bitmap::Bitmap256;
use crate::fa::{Fa, StateId};

/// An (initially unordered) set of NFA states plus whether any of them is
/// accepting.
#[derive(Debug, Clone, Default)]
pub struct StateSet {
    states: Vec<StateId>,
    accepting: bool,
}

impl StateSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `state` is already a member.
    #[must_use]
    pub fn has_state(&self, state: StateId) -> bool {
        self.states.contains(&state)
    }

    /// Adds `state` if not already present. Returns `true` if it was
    /// newly added. Grounded on `fa_state_set_add`.
    pub fn add(&mut self, fa: &Fa, state: StateId) -> bool {
        if self.has_state(state) {
            return false;
        }
        if fa.state(state).accepting {
            self.accepting = true;
        }
        self.states.push(state);
        true
    }

    /// Sorts the member states ascending. Grounded on `fa_state_set_sort`;
    /// called before using a set as a dedup key so two sets built by
    /// different traversal orders compare equal.
    pub fn sort(&mut self) {
        self.states.sort_unstable();
    }

    /// The member states, in whatever order they were last left (call
    /// [`Self::sort`] first for a canonical order).
    #[must_use]
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    /// `true` if any member state is accepting.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// `true` if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The bitmap of every non-epsilon byte value with at least one
    /// transition out of some member state. Grounded on
    /// `fa_state_set_syms`.
    #[must_use]
    pub fn symbols(&self, fa: &Fa) -> Bitmap256 {
        let mut map = Bitmap256::new();
        for &s in &self.states {
            for t in &fa.state(s).trans {
                if t.is_epsilon() {
                    continue;
                }
                map.set_range(t.symfrom as u8, t.symto as u8);
            }
        }
        map
    }

    /// Sorted member states as an owned vector, suitable as a dedup key
    /// (e.g. in an `IndexMap<Vec<StateId>, StateId>` subset cache).
    #[must_use]
    pub fn into_sorted_key(mut self) -> Vec<StateId> {
        self.sort();
        self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_dedups_and_tracks_accepting() {
        let mut fa = Fa::new();
        let s0 = fa.state_create();
        let s1 = fa.state_create();
        fa.set_start(s0);
        fa.state_mut(s1).accepting = true;

        let mut set = StateSet::new();
        assert!(set.add(&fa, s0));
        assert!(!set.add(&fa, s0));
        assert!(set.add(&fa, s1));
        assert!(set.is_accepting());
        assert_eq!(set.states().len(), 2);
    }

    #[test]
    fn symbols_collects_non_epsilon_ranges() {
        let mut fa = Fa::new();
        let s0 = fa.state_create();
        let s1 = fa.state_create();
        fa.set_start(s0);
        fa.trans_create(s0, b'a' as i32, s1);
        fa.trans_create(s0, crate::fa::EPSILON, s1);

        let mut set = StateSet::new();
        set.add(&fa, s0);
        let syms = set.symbols(&fa);
        assert!(syms.test(b'a'));
        assert!(!syms.test(b'b'));
    }
}
