//! Equivalence checking between logic networks
//!
//! Small networks are checked exhaustively with bit-parallel simulation; for
//! larger input counts the check falls back to seeded random sampling, which
//! can miss corner cases but catches the typical broken rewrite immediately.
//! On failure, the distinguishing input pattern is returned.

use kdam::{tqdm, BarExt};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::sim::simulate_words;
use crate::Network;

/// Maximum number of inputs for exhaustive checking
const EXHAUSTIVE_INPUT_LIMIT: usize = 20;

/// Enumeration words for the first six inputs
const WORD_MASKS: [u64; 6] = [
    0xaaaa_aaaa_aaaa_aaaa,
    0xcccc_cccc_cccc_cccc,
    0xf0f0_f0f0_f0f0_f0f0,
    0xff00_ff00_ff00_ff00,
    0xffff_0000_ffff_0000,
    0xffff_ffff_0000_0000,
];

/// Check equivalence between two combinational networks
///
/// With 20 inputs or fewer the check is complete; beyond that, `nb_patterns`
/// random patterns from the given seed are tried.
/// Returns the failing input pattern if the networks differ.
pub fn check_equivalence(
    a: &Network,
    b: &Network,
    nb_patterns: usize,
    seed: u64,
) -> Result<(), Vec<bool>> {
    assert_eq!(a.nb_inputs(), b.nb_inputs());
    assert_eq!(a.nb_outputs(), b.nb_outputs());
    if a.nb_inputs() <= EXHAUSTIVE_INPUT_LIMIT {
        check_equivalence_exhaustive(a, b)
    } else {
        check_equivalence_random(a, b, nb_patterns, seed)
    }
}

/// Simulate both networks on the same words and extract a failing pattern, if any
fn find_mismatch(a: &Network, b: &Network, words: &[u64]) -> Option<Vec<bool>> {
    let va = simulate_words(a, words);
    let vb = simulate_words(b, words);
    for (wa, wb) in va.iter().zip(vb.iter()) {
        let diff = wa ^ wb;
        if diff != 0 {
            let bit = diff.trailing_zeros();
            return Some(words.iter().map(|w| (w >> bit) & 1 != 0).collect());
        }
    }
    None
}

/// Enumerate every input assignment, 64 patterns per simulation
fn check_equivalence_exhaustive(a: &Network, b: &Network) -> Result<(), Vec<bool>> {
    let nb_inputs = a.nb_inputs();
    let nb_words = if nb_inputs > 6 {
        1usize << (nb_inputs - 6)
    } else {
        1
    };
    for w in 0..nb_words {
        let words: Vec<u64> = (0..nb_inputs)
            .map(|i| {
                if i < 6 {
                    WORD_MASKS[i]
                } else if (w >> (i - 6)) & 1 != 0 {
                    !0u64
                } else {
                    0u64
                }
            })
            .collect();
        if let Some(pattern) = find_mismatch(a, b, &words) {
            return Err(pattern);
        }
    }
    Ok(())
}

/// Try random input assignments, 64 patterns per simulation
fn check_equivalence_random(
    a: &Network,
    b: &Network,
    nb_patterns: usize,
    seed: u64,
) -> Result<(), Vec<bool>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let nb_words = (nb_patterns + 63) / 64;
    let mut progress = tqdm!(total = nb_words);
    progress.set_description("Patterns");
    for _ in 0..nb_words {
        let words: Vec<u64> = (0..a.nb_inputs()).map(|_| rng.gen()).collect();
        if let Some(pattern) = find_mismatch(a, b, &words) {
            return Err(pattern);
        }
        progress.update(1).unwrap();
    }
    Ok(())
}
