use libfa::config::Limits;
use libfa::determinize::{determinize, determinize_ex};
use libfa::error::Error;
use libfa::fa::construct::{concat, string, union};
use libfa::sim::{Outcome, Sim};

fn accepts(fa: &libfa::Fa, s: &[u8]) -> bool {
    let sim = Sim::build(fa);
    let mut run = sim.new_run();
    matches!(sim.run(&mut run, s), Outcome::Accept)
}

#[test]
fn determinize_removes_epsilon_and_stays_equivalent() {
    let nfa = union(string(b"cat", false), string(b"dog", false));
    let dfa = determinize(&nfa);

    for state in dfa.states() {
        assert!(state.trans.iter().all(|t| !t.is_epsilon()));
    }

    assert!(accepts(&dfa, b"cat"));
    assert!(accepts(&dfa, b"dog"));
    assert!(!accepts(&dfa, b"ca"));
    assert!(!accepts(&dfa, b"dogs"));
}

#[test]
fn determinize_collapses_shared_prefixes() {
    let nfa = union(string(b"cat", false), string(b"car", false));
    let dfa = determinize(&nfa);

    // "ca" is shared, so the NFA's two parallel paths collapse into one
    // DFA state reachable by both prefixes.
    assert!(accepts(&dfa, b"cat"));
    assert!(accepts(&dfa, b"car"));
    assert!(!accepts(&dfa, b"ca"));
    assert!(!accepts(&dfa, b"cab"));
}

#[test]
fn determinize_on_concat_preserves_sequencing() {
    let nfa = concat(string(b"foo", false), union(string(b"bar", false), string(b"baz", false)));
    let dfa = determinize(&nfa);

    assert!(accepts(&dfa, b"foobar"));
    assert!(accepts(&dfa, b"foobaz"));
    assert!(!accepts(&dfa, b"foo"));
    assert!(!accepts(&dfa, b"foobat"));
}

#[test]
fn opaque_priority_callback_picks_among_distinct_merges() {
    let mut a = string(b"a", false);
    a.set_accepting_opaque(5);
    let mut b = string(b"a", false);
    b.set_accepting_opaque(1);
    let nfa = union(a, b);

    let mut pri = |opaques: &[u64]| *opaques.iter().min().unwrap();
    let dfa = determinize_ex(&nfa, Some(&mut pri), None, None).unwrap();

    let mut opaques = Vec::new();
    dfa.foreach_accepting(|op| opaques.push(op));
    assert_eq!(opaques, vec![Some(1)]);
}

#[test]
fn state_limit_checked_against_source_nfa() {
    let nfa = union(string(b"cat", false), string(b"car", false));
    // The source NFA already has more than one state; the limit check
    // must fire against it, not against the (initially tiny) output DFA.
    let limits = Limits::new(1, 1000);
    let err = determinize_ex(&nfa, None, Some(&limits), None).unwrap_err();
    assert!(matches!(err, Error::LimitExceeded { what: "states", .. }));
}

#[test]
fn generous_limits_allow_determinization_to_complete() {
    let nfa = union(string(b"cat", false), string(b"car", false));
    let limits = Limits::new(1000, 1000);
    let dfa = determinize_ex(&nfa, None, Some(&limits), None).unwrap();
    assert!(accepts(&dfa, b"cat"));
}
