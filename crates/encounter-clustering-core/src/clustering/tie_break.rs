//! Tie-breaking strategy for signature-equal cluster matches.
//!
//! The simplistic matching signature can collide across distinct real
//! counterparts once updates make a cluster's signature drift into another
//! cluster's. The strategy decides which of the colliding clusters receives
//! the message.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// How to break ties among multiple signature-equal clusters.
///
/// The deterministic variant keeps the scan short-circuiting at the first
/// match (earliest-created-cluster-wins) and makes the whole engine
/// reproducible from the input sequence alone. The random variant forces an
/// exhaustive scan and picks uniformly among all matches, which surfaces how
/// often signatures collide when evaluating against ground truth.
#[derive(Debug, Clone)]
pub enum TieBreakStrategy {
    /// Stop scanning at the first signature match.
    DeterministicFirstMatch,
    /// Scan exhaustively and choose uniformly at random among all matches.
    UniformRandom(ChaCha8Rng),
}

impl Default for TieBreakStrategy {
    fn default() -> Self {
        Self::DeterministicFirstMatch
    }
}

impl TieBreakStrategy {
    /// Create a uniform-random strategy from a seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        use rand::SeedableRng;
        Self::UniformRandom(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Whether the matching scan must visit every cluster before choosing.
    #[inline]
    pub fn is_exhaustive(&self) -> bool {
        matches!(self, Self::UniformRandom(_))
    }

    /// Pick the index of the chosen candidate among `len` matches.
    ///
    /// `len` must be at least 1; a single candidate is always chosen
    /// directly without consuming randomness.
    pub(crate) fn choose(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        match self {
            Self::DeterministicFirstMatch => 0,
            Self::UniformRandom(rng) => rng.gen_range(0..len),
        }
    }
}
