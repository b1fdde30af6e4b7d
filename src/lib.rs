//! Construction, transformation, and linear-time execution of byte-alphabet
//! finite automata compiled from regular expressions.
//!
//! The pipeline, leaves first: [`fa`] is the graph model and its
//! compositional constructors (union, concatenation, Kleene star, bounded
//! repetition, character classes, binary bit patterns); [`stateset`] and
//! [`determinize`] turn an NFA into a DFA via subset construction;
//! [`minimize`] refines a DFA's state partition down to the canonical
//! minimal automaton; [`sim`] executes a minimized DFA one byte at a time
//! in either of two runtime representations. [`regexp`] is the textual
//! front end wiring a regexp surface syntax onto [`fa`]'s constructors, and
//! [`serialize`] emits the FA graph as GraphViz or a line-oriented textual
//! format.
//!
//! Grounded on the `libfa` C library (`examples/original_source/fa.h`);
//! see `DESIGN.md` for the module-by-module grounding ledger.

pub mod bitmap;
pub mod config;
pub mod determinize;
pub mod error;
pub mod errors;
pub mod fa;
pub mod minimize;
pub mod regexp;
pub mod serialize;
pub mod sim;
pub mod stateset;

pub use config::Limits;
pub use error::{Error, Result};
pub use fa::{Fa, Opaque, StateId, Symbol, EPSILON};

/// One-time library bootstrap. Kept for API-shape parity with the source's
/// `fa_init()`; this crate has no hidden global state to initialize (its
/// storage is ordinary `Vec`/`Box` growth through the global allocator), so
/// this is a no-op free function. `tracing_subscriber` initialization
/// remains the caller's own responsibility.
pub fn init() {}
