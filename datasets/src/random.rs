//! Seeded random sources shared by the table and noise generators.
//!
//! All generators take an optional `u64` seed. Identical seeds give
//! bit-identical output on every platform: the generator is ChaCha8, whose
//! stream is fixed by the algorithm, and every draw is made in a fixed
//! order. Without a seed a fresh one is drawn from the thread-local RNG.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Build the crate's generator from an optional seed
pub fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    let seed = seed.unwrap_or_else(rand::random);
    ChaCha8Rng::seed_from_u64(seed)
}

/// Draw `n` values uniformly from `[lower, upper)`.
///
/// Computed as `lower + (upper - lower) * u` with `u ∈ [0, 1)`, so an empty
/// range (`lower == upper`) yields `lower` and reversed bounds are allowed.
pub fn uniform_values<R: Rng>(rng: &mut R, (lower, upper): (f64, f64), n: usize) -> Vec<f64> {
    (0..n)
        .map(|_| lower + (upper - lower) * rng.random::<f64>())
        .collect()
}
