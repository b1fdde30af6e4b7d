use libfa::determinize::determinize;
use libfa::fa::construct::{kstar, repeat, string, union};
use libfa::minimize::{minimize, minimize_ex, DistinguishCmp};
use libfa::sim::{Outcome, Sim};
use libfa::Opaque;

fn accepts(fa: &libfa::Fa, s: &[u8]) -> bool {
    let sim = Sim::build(fa);
    let mut run = sim.new_run();
    matches!(sim.run(&mut run, s), Outcome::Accept)
}

#[test]
fn minimize_collapses_equivalent_dfa_states() {
    // (a|b)* has a single minimal state no matter how many DFA states
    // the subset construction produced.
    let nfa = repeat(union(string(b"a", false), string(b"b", false)), 0, 0, None).unwrap();
    let dfa = determinize(&nfa);
    let mfa = minimize(&dfa);

    assert_eq!(mfa.states_n(), 1);
    assert!(accepts(&mfa, b""));
    assert!(accepts(&mfa, b"aabba"));
    assert!(!accepts(&mfa, b"aabc"));
}

#[test]
fn minimize_preserves_language_on_a_shared_prefix() {
    let nfa = union(string(b"cat", false), string(b"car", false));
    let dfa = determinize(&nfa);
    let mfa = minimize(&dfa);

    assert!(accepts(&mfa, b"cat"));
    assert!(accepts(&mfa, b"car"));
    assert!(!accepts(&mfa, b"ca"));
    assert!(!accepts(&mfa, b"care"));
}

#[test]
fn distinguish_callback_keeps_distinct_opaques_in_separate_states() {
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

#[test]
fn minimize_is_idempotent() {
    let nfa = repeat(union(string(b"cat", false), string(b"cow", false)), 1, 3, None).unwrap();
    let dfa = determinize(&nfa);
    let once = minimize(&dfa);
    let twice = minimize(&once);

    assert_eq!(once.states_n(), twice.states_n());
    for s in [&b"cat"[..], b"catcow", b"cowcowcow", b"x"] {
        assert_eq!(accepts(&once, s), accepts(&twice, s));
    }
}
