//! Seeded weighted sampling.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Creates the deterministic generator used by every fixture sampler.
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Picks one option according to its weight.
pub fn weighted<'a, R: Rng>(rng: &mut R, options: &[(&'a str, f64)]) -> &'a str {
    options
        .choose_weighted(rng, |(_, w)| *w)
        .map(|(value, _)| *value)
        .unwrap_or(options[0].0)
}

/// Picks one option uniformly.
pub fn uniform<'a, R: Rng>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or(options[0])
}
