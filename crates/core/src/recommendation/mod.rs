//! Basket recommendation engine
//!
//! Matches a live basket against a ranked rule set through a three-tier
//! cascade (strict antecedent match, partial match, global popularity) and
//! returns distinct item names the basket does not already contain.

mod engine;
mod shuffle;
mod types;

pub use engine::RecommendationEngine;
pub use shuffle::{shuffler_for, CandidateShuffler, RandomShuffler, RankedOrder};
pub use types::*;

use crate::domain::rule::RuleSet;
use crate::errors::DomainError;

/// Result type for recommendation operations
pub type RecommendationResult<T> = Result<T, DomainError>;

/// Recommendations returned when the caller does not ask for a specific count
pub const DEFAULT_TOP_N: usize = 4;

/// Slots beyond `top_n` that form the strict-match diversity pool
pub const DEFAULT_DIVERSITY_POOL_EXTRA: usize = 4;

/// Highest-support rules consulted by the global popularity fallback
pub const DEFAULT_GLOBAL_RULE_LIMIT: usize = 30;

/// Recommends up to `top_n` items for `basket` using the default engine settings.
pub fn recommend<B, S>(
    basket: &[B],
    rules: &RuleSet,
    top_n: usize,
    shuffler: &mut S,
) -> RecommendationResult<Vec<String>>
where
    B: AsRef<str>,
    S: CandidateShuffler + ?Sized,
{
    RecommendationEngine::new().recommend(basket, rules, top_n, shuffler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::AssociationRule;

    #[test]
    fn recommend_runs_the_default_cascade() {
        let rules = RuleSet::ranked(vec![AssociationRule::new(["A"], ["B"], 0.2, 0.9, 2.0)]);

        assert_eq!(recommend(&["a"], &rules, DEFAULT_TOP_N, &mut RankedOrder), Ok(vec![
            "B".to_owned()
        ]));
        assert_eq!(recommend(&["a"], &RuleSet::empty(), 4, &mut RankedOrder), Ok(Vec::new()));
        assert_eq!(
            recommend(&["a"], &rules, 0, &mut RankedOrder),
            Err(DomainError::InvalidTopN(0))
        );
    }

    #[test]
    fn recommend_shuffles_within_the_default_pool() {
        let rules = RuleSet::ranked(
            (0..10)
                .map(|index| {
                    let consequent = format!("ITEM-{index}");
                    AssociationRule::new(
                        ["BASE"],
                        [consequent.as_str()],
                        0.1,
                        0.95 - index as f64 * 0.05,
                        2.0,
                    )
                })
                .collect(),
        );
        let pool: Vec<String> = (0..DEFAULT_TOP_N + DEFAULT_DIVERSITY_POOL_EXTRA)
            .map(|index| format!("ITEM-{index}"))
            .collect();

        for seed in 0..10 {
            let result =
                recommend(&["base"], &rules, DEFAULT_TOP_N, &mut RandomShuffler::seeded(seed))
                    .unwrap();
            assert_eq!(result.len(), DEFAULT_TOP_N);
            assert!(result.iter().all(|item| pool.contains(item)), "seed {seed}: {result:?}");
        }
    }
}
