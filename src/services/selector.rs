//! Random reviewer selection.
//!
//! Selection never touches a global generator: callers hand in the RNG, and
//! services hold a [`RandomSource`] so tests can pin the seed.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Factory for the RNG used by one selection.
pub trait RandomSource: Send + Sync {
    fn rng(&self) -> Box<dyn RngCore + Send>;
}

/// OS-seeded generator, fresh per selection.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntropySource;

impl RandomSource for EntropySource {
    fn rng(&self) -> Box<dyn RngCore + Send> {
        Box::new(StdRng::from_entropy())
    }
}

/// Fixed-seed generator; every selection replays the same stream.
#[derive(Debug, Clone, Copy)]
pub struct SeededSource(pub u64);

impl RandomSource for SeededSource {
    fn rng(&self) -> Box<dyn RngCore + Send> {
        Box::new(StdRng::seed_from_u64(self.0))
    }
}

/// Pick up to `max_count` distinct entries of `candidates` uniformly at random.
///
/// Partial Fisher-Yates over a private copy: position `i` is swapped with a
/// uniform pick from `i..len`, so every ordered subset of the result length is
/// equally likely. Returns `min(candidates.len(), max_count)` items.
pub fn select_random<T, R>(rng: &mut R, candidates: &[T], max_count: usize) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let count = max_count.min(candidates.len());
    if count == 0 {
        return Vec::new();
    }

    let mut pool = candidates.to_vec();
    for i in 0..count {
        let j = rng.gen_range(i..pool.len());
        pool.swap(i, j);
    }

    pool.truncate(count);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_length_is_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = vec!["a", "b", "c"];

        assert_eq!(select_random(&mut rng, &items, 2).len(), 2);
        assert_eq!(select_random(&mut rng, &items, 5).len(), 3);
        assert!(select_random(&mut rng, &items, 0).is_empty());
        assert!(select_random::<&str, _>(&mut rng, &[], 2).is_empty());
    }

    #[test]
    fn test_no_duplicates_and_input_untouched() {
        let mut rng = StdRng::seed_from_u64(42);
        let items: Vec<u32> = (0..10).collect();

        for _ in 0..100 {
            let picked = select_random(&mut rng, &items, 4);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), picked.len());
            assert!(picked.iter().all(|p| items.contains(p)));
        }

        assert_eq!(items, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_every_candidate_can_be_picked() {
        let mut rng = StdRng::seed_from_u64(1);
        let items = vec!["a", "b", "c", "d"];
        let mut seen = HashSet::new();

        for _ in 0..200 {
            seen.extend(select_random(&mut rng, &items, 1));
        }

        assert_eq!(seen.len(), items.len());
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let items: Vec<u32> = (0..20).collect();
        let source = SeededSource(99);

        let first = select_random(&mut *source.rng(), &items, 3);
        let second = select_random(&mut *source.rng(), &items, 3);
        assert_eq!(first, second);
    }
}
