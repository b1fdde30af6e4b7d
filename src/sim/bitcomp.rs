//! Bitmap-compressed runtime simulator.
//!
//! Grounded on `fa_sim_bitcomp.c`: instead of storing a full 256-entry
//! table per node, only byte positions where the destination *changes*
//! from the previous byte's destination get a table entry; a 256-bit
//! change bitmap plus a popcount-before-index lookup turns an input byte
//! back into a table offset. Bit 0 of the bitmap is never a real change
//! marker (compression always starts comparing from byte 1), so it is
//! repurposed to mean "this node is accepting" — matching the source's
//! `BITFIELD64_SET(bitmap, 0)` reuse. This crate keeps each node's
//! compressed table as an owned `Vec<u32>` rather than packing nodes into
//! one contiguous byte buffer; the packed layout is an implementation
//! detail the source itself notes it could drop (`fa_sim_bitcomp_create`
//! could be independent of `fa_sim_t`), and nothing here depends on a
//! specific byte-for-byte memory layout.

use crate::bitmap::Bitmap256;
use crate::fa::Opaque;
use crate::sim::{Outcome, Run, Sim};

#[derive(Debug, Clone)]
struct BitcompNode {
    bitmap: Bitmap256,
    opaque: Option<Opaque>,
    table: Vec<u32>,
}

/// A built, run-ready automaton using the compressed representation.
#[derive(Debug, Clone)]
pub struct BitcompSim {
    start: u32,
    nodes: Vec<BitcompNode>,
}

/// Number of set bits in `bitmap` at positions `[0, b]`, with bit 0
/// treated as the accepting flag rather than a change marker. Grounded on
/// `popcount_bitmap`.
fn table_index(bitmap: &Bitmap256, b: u8) -> usize {
    let mut count = bitmap.popcount_before(b);
    if bitmap.test(b) {
        count += 1;
    }
    if bitmap.test(0) {
        count -= 1;
    }
    count as usize
}

impl BitcompSim {
    /// Compresses a built dense [`Sim`] into bitmap form. Grounded on
    /// `fa_sim_bitcomp_create`.
    #[must_use]
    pub fn build(sim: &Sim) -> Self {
        let mut nodes = Vec::with_capacity(sim.nodes_n() as usize);

        // node 0: reject sink, mirrors fa_sim's reserved state 0.
        nodes.push(BitcompNode {
            bitmap: Bitmap256::new(),
            opaque: None,
            table: vec![0],
        });

        for id in 1..sim.nodes_n() {
            let table = sim.node_table(id);
            let mut bitmap = Bitmap256::new();
            let mut compressed = vec![table[0]];
            let mut prev = table[0];

            for (i, &dest) in table.iter().enumerate().skip(1) {
                if dest != prev {
                    bitmap.set(i as u8);
                    compressed.push(dest);
                    prev = dest;
                }
            }

            if sim.node_accepting(id) {
                bitmap.set(0);
            }

            nodes.push(BitcompNode {
                bitmap,
                opaque: sim.node_opaque(id),
                table: compressed,
            });
        }

        BitcompSim {
            start: sim.start_node(),
            nodes,
        }
    }

    /// Starts a fresh run at this simulator's start state. Grounded on
    /// `fa_sim_bitcomp_run_init`.
    #[must_use]
    pub fn new_run(&self) -> Run {
        Run {
            current: self.start,
            opaque: None,
        }
    }

    /// Feeds `bytes` through `run`. Grounded on `fa_sim_bitcomp_run`.
    pub fn run(&self, run: &mut Run, bytes: &[u8]) -> Outcome {
        let mut current = run.current;

        for &b in bytes {
            let node = &self.nodes[current as usize];
            let idx = table_index(&node.bitmap, b);
            current = node.table[idx];
            if current == 0 {
                run.current = current;
                return Outcome::Reject;
            }
        }

        run.current = current;
        let node = &self.nodes[current as usize];
        if node.bitmap.test(0) {
            run.opaque = node.opaque;
            Outcome::Accept
        } else {
            Outcome::More
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::determinize::determinize;
    use crate::fa::construct::{concat, kstar, string, union};

    #[test]
    fn matches_dense_sim_behavior() {
        let fa = determinize(&union(string(b"cat", false), string(b"car", false)));
        let sim = Sim::build(&fa);
        let bc = BitcompSim::build(&sim);

        let mut run = bc.new_run();
        assert_eq!(bc.run(&mut run, b"cat"), Outcome::Accept);

        let mut run = bc.new_run();
        assert_eq!(bc.run(&mut run, b"caz"), Outcome::Reject);

        let mut run = bc.new_run();
        assert_eq!(bc.run(&mut run, b"ca"), Outcome::More);
    }

    #[test]
    fn opaque_survives_compression() {
        let mut fa = concat(string(b"a", false), string(b"b", false));
        fa.set_accepting_opaque(7);
        let sim = Sim::build(&fa);
        let bc = BitcompSim::build(&sim);

        let mut run = bc.new_run();
        assert_eq!(bc.run(&mut run, b"ab"), Outcome::Accept);
        assert_eq!(run.opaque(), Some(7));
    }

    #[test]
    fn self_loop_heavy_state_compresses_well() {
        let fa = determinize(&kstar(string(b"a", false)));
        let sim = Sim::build(&fa);
        let bc = BitcompSim::build(&sim);

        let mut run = bc.new_run();
        assert_eq!(bc.run(&mut run, b"aaaaaa"), Outcome::Accept);
    }
}
