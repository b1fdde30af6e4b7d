//! Construction limits and cancellation, passed explicitly to call sites
//! rather than read from ambient/global configuration.

use std::sync::atomic::{AtomicBool, Ordering};

/// Caller-supplied ceilings on state/transition counts, checked during
/// construction and determinization to bound worst-case blowup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of states, if bounded.
    pub states: Option<u32>,
    /// Maximum number of transition ranges, if bounded.
    pub trans: Option<u32>,
}

impl Limits {
    /// No ceilings at all.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Creates a limit with both ceilings set.
    #[must_use]
    pub fn new(states: u32, trans: u32) -> Self {
        Self {
            states: Some(states),
            trans: Some(trans),
        }
    }
}

/// A shared mutable flag the caller may raise from another execution
/// context (signal handler, timer) to abort an in-progress determinize or
/// minimize between worklist iterations / refinement sweeps.
pub fn is_cancelled(flag: Option<&AtomicBool>) -> bool {
    flag.is_some_and(|f| f.load(Ordering::Relaxed))
}
