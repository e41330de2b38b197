use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::RecommendationConfig;

/// Source of the two random permutations in the recommendation cascade.
///
/// Injected by the caller so tests can fix a seed and deployments can turn
/// diversity off entirely.
pub trait CandidateShuffler {
    fn shuffle(&mut self, candidates: &mut [String]);
}

/// Uniform random permutation drawn from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomShuffler<R> {
    rng: R,
}

impl<R: Rng> RandomShuffler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomShuffler<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> CandidateShuffler for RandomShuffler<R> {
    fn shuffle(&mut self, candidates: &mut [String]) {
        candidates.shuffle(&mut self.rng);
    }
}

/// Leaves candidates in ranked order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedOrder;

impl CandidateShuffler for RankedOrder {
    fn shuffle(&mut self, _candidates: &mut [String]) {}
}

/// Picks the shuffler described by configuration.
pub fn shuffler_for(config: &RecommendationConfig) -> Box<dyn CandidateShuffler + Send> {
    match (config.diversity, config.seed) {
        (false, _) => Box::new(RankedOrder),
        (true, Some(seed)) => Box::new(RandomShuffler::seeded(seed)),
        (true, None) => Box::new(RandomShuffler::from_entropy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters() -> Vec<String> {
        ["a", "b", "c", "d", "e", "f", "g", "h"].iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn same_seed_same_permutation() {
        let mut first = letters();
        let mut second = letters();
        RandomShuffler::seeded(42).shuffle(&mut first);
        RandomShuffler::seeded(42).shuffle(&mut second);
        assert_eq!(first, second);

        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, letters());
    }

    #[test]
    fn ranked_order_is_a_no_op() {
        let mut items = letters();
        RankedOrder.shuffle(&mut items);
        assert_eq!(items, letters());
    }

    #[test]
    fn diversity_off_selects_ranked_order() {
        let config = RecommendationConfig { diversity: false, ..RecommendationConfig::default() };
        let mut items = letters();
        shuffler_for(&config).shuffle(&mut items);
        assert_eq!(items, letters());
    }
}
