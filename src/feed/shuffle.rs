//! Interleaving strategy for records fetched from several museums at once.
//!
//! Batches from the combined feed are shuffled so the two museums appear
//! mixed rather than in two blocks.  The strategy is a trait so tests (and
//! `--seed`) can make the order reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::source::Artwork;

/// Reorders a freshly fetched batch in place.
pub trait Shuffler: Send {
    fn shuffle(&mut self, batch: &mut [Artwork]);
}

/// Uniform random shuffle backed by a [`StdRng`].
pub struct RandomShuffle {
    rng: StdRng,
}

impl RandomShuffle {
    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Same seed, same sequence of permutations.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `Some(seed)` gives a reproducible shuffle, `None` an entropy-seeded one.
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl Shuffler for RandomShuffle {
    fn shuffle(&mut self, batch: &mut [Artwork]) {
        batch.shuffle(&mut self.rng);
    }
}

/// Leaves batches in fetch order.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepOrder;

impl Shuffler for KeepOrder {
    fn shuffle(&mut self, _batch: &mut [Artwork]) {}
}
