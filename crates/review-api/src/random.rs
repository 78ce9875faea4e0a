use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of randomness for reviewer selection.
pub trait RandomSource: Send + Sync {
    /// Uniformly permute `ids` in place.
    fn shuffle(&self, ids: &mut [String]);

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick(&self, len: usize) -> usize;
}

/// Thread-local OS-seeded generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn shuffle(&self, ids: &mut [String]) {
        ids.shuffle(&mut rand::rng());
    }

    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Deterministic generator for reproducible runs and tests.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl RandomSource for SeededRandom {
    fn shuffle(&self, ids: &mut [String]) {
        self.with_rng(|rng| ids.shuffle(rng));
    }

    fn pick(&self, len: usize) -> usize {
        self.with_rng(|rng| rng.random_range(0..len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("u{}", i)).collect()
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = SeededRandom::new(7);
        let b = SeededRandom::new(7);

        let mut xs = ids(10);
        let mut ys = ids(10);
        a.shuffle(&mut xs);
        b.shuffle(&mut ys);
        assert_eq!(xs, ys);
        assert_eq!(a.pick(100), b.pick(100));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let rng = ThreadRandom;
        let mut xs = ids(8);
        rng.shuffle(&mut xs);
        xs.sort();
        assert_eq!(xs, ids(8));
    }

    #[test]
    fn pick_covers_whole_range() {
        let rng = SeededRandom::new(42);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[rng.pick(3)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
