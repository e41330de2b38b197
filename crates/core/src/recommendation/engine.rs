//! Recommendation Engine implementation

use std::collections::HashSet;
use std::num::NonZeroUsize;

use super::shuffle::CandidateShuffler;
use super::types::*;
use super::{RecommendationResult, DEFAULT_DIVERSITY_POOL_EXTRA, DEFAULT_GLOBAL_RULE_LIMIT};
use crate::config::RecommendationConfig;
use crate::domain::item::CanonicalItem;
use crate::domain::rule::{rank_order, AssociationRule, RuleSet};
use crate::errors::{validate_top_n, DomainError};

/// Consequents of `rules`, in rule order, skipping basket items and repeats.
///
/// Repeats are detected on the canonical form; the first-seen spelling wins.
fn collect_consequents<'a, I>(rules: I, basket: &HashSet<CanonicalItem>) -> Vec<String>
where
    I: IntoIterator<Item = &'a AssociationRule>,
{
    let mut seen = HashSet::new();
    let mut collected = Vec::new();

    for rule in rules {
        for item in &rule.consequents {
            let key = CanonicalItem::new(item);
            if basket.contains(&key) {
                continue;
            }
            if seen.insert(key) {
                collected.push(item.clone());
            }
        }
    }

    collected
}

/// Running recommendation list, de-duplicated on canonical form.
#[derive(Debug, Default)]
struct Accumulator {
    items: Vec<RecommendedItem>,
    seen: HashSet<CanonicalItem>,
}

impl Accumulator {
    fn push(&mut self, item: String, strategy: MatchStrategy) {
        if self.seen.insert(CanonicalItem::new(&item)) {
            self.items.push(RecommendedItem { item, strategy });
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn finish(mut self, top_n: usize, resolved_by: MatchStrategy) -> Recommendation {
        self.items.truncate(top_n);
        Recommendation { items: self.items, resolved_by, diversified: false }
    }
}

/// Stateless matcher over an explicitly passed rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationEngine {
    diversity_pool_extra: usize,
    global_rule_limit: usize,
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self {
            diversity_pool_extra: DEFAULT_DIVERSITY_POOL_EXTRA,
            global_rule_limit: DEFAULT_GLOBAL_RULE_LIMIT,
        }
    }

    /// Engine settings from `[recommendation]`. A zero global rule limit is rejected.
    pub fn from_config(config: &RecommendationConfig) -> RecommendationResult<Self> {
        let global_rule_limit =
            NonZeroUsize::new(config.global_rule_limit).ok_or_else(|| {
                DomainError::InvariantViolation(
                    "global_rule_limit must be greater than zero".to_owned(),
                )
            })?;
        Ok(Self::new()
            .with_diversity_pool_extra(config.diversity_pool_extra)
            .with_global_rule_limit(global_rule_limit))
    }

    pub fn with_diversity_pool_extra(mut self, extra: usize) -> Self {
        self.diversity_pool_extra = extra;
        self
    }

    pub fn with_global_rule_limit(mut self, limit: NonZeroUsize) -> Self {
        self.global_rule_limit = limit.get();
        self
    }

    /// Up to `top_n` item names for `basket`.
    pub fn recommend<B, S>(
        &self,
        basket: &[B],
        rules: &RuleSet,
        top_n: usize,
        shuffler: &mut S,
    ) -> RecommendationResult<Vec<String>>
    where
        B: AsRef<str>,
        S: CandidateShuffler + ?Sized,
    {
        Ok(self.recommend_traced(basket, rules, top_n, shuffler)?.into_item_names())
    }

    pub fn handle<S>(
        &self,
        request: &RecommendationRequest,
        rules: &RuleSet,
        shuffler: &mut S,
    ) -> RecommendationResult<Recommendation>
    where
        S: CandidateShuffler + ?Sized,
    {
        self.recommend_traced(&request.basket, rules, request.top_n, shuffler)
    }

    /// Runs the strict / partial / global cascade, recording which tier
    /// produced each item.
    pub fn recommend_traced<B, S>(
        &self,
        basket: &[B],
        rules: &RuleSet,
        top_n: usize,
        shuffler: &mut S,
    ) -> RecommendationResult<Recommendation>
    where
        B: AsRef<str>,
        S: CandidateShuffler + ?Sized,
    {
        validate_top_n(top_n)?;

        let basket: HashSet<CanonicalItem> =
            basket.iter().map(|item| CanonicalItem::new(item.as_ref())).collect();
        let mut accumulator = Accumulator::default();

        // Strategy 1: every antecedent present, ranked by confidence then lift.
        let mut strict: Vec<&AssociationRule> = rules
            .indexed()
            .filter(|(_, antecedents)| antecedents.iter().all(|item| basket.contains(item)))
            .map(|(rule, _)| rule)
            .collect();
        strict.sort_by(|a, b| {
            b.confidence.total_cmp(&a.confidence).then_with(|| b.lift.total_cmp(&a.lift))
        });
        for item in collect_consequents(strict.iter().copied(), &basket) {
            accumulator.push(item, MatchStrategy::Strict);
        }

        let pool_size = top_n.saturating_add(self.diversity_pool_extra);
        if accumulator.len() >= pool_size {
            let mut pool: Vec<String> = accumulator
                .items
                .into_iter()
                .take(pool_size)
                .map(|recommended| recommended.item)
                .collect();
            shuffler.shuffle(&mut pool);
            pool.truncate(top_n);

            let recommendation = Recommendation {
                items: pool
                    .into_iter()
                    .map(|item| RecommendedItem { item, strategy: MatchStrategy::Strict })
                    .collect(),
                resolved_by: MatchStrategy::Strict,
                diversified: true,
            };
            log_resolution(basket.len(), top_n, &recommendation);
            return Ok(recommendation);
        }
        if accumulator.len() >= top_n {
            let recommendation = accumulator.finish(top_n, MatchStrategy::Strict);
            log_resolution(basket.len(), top_n, &recommendation);
            return Ok(recommendation);
        }

        // Strategy 2: any antecedent present, ranked by lift then confidence.
        let mut partial: Vec<&AssociationRule> = rules
            .indexed()
            .filter(|(_, antecedents)| antecedents.iter().any(|item| basket.contains(item)))
            .map(|(rule, _)| rule)
            .collect();
        partial.sort_by(|a, b| rank_order(a, b));
        for item in collect_consequents(partial.iter().copied(), &basket) {
            accumulator.push(item, MatchStrategy::Partial);
        }

        if accumulator.len() >= top_n {
            let recommendation = accumulator.finish(top_n, MatchStrategy::Partial);
            log_resolution(basket.len(), top_n, &recommendation);
            return Ok(recommendation);
        }

        // Strategy 3: shuffled consequents of the highest-support rules.
        let popular = rules.by_support().take(self.global_rule_limit);
        let mut candidates = collect_consequents(popular, &basket);
        shuffler.shuffle(&mut candidates);
        for item in candidates {
            if accumulator.len() >= top_n {
                break;
            }
            accumulator.push(item, MatchStrategy::Global);
        }

        let recommendation = accumulator.finish(top_n, MatchStrategy::Global);
        log_resolution(basket.len(), top_n, &recommendation);
        Ok(recommendation)
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn log_resolution(basket_items: usize, top_n: usize, recommendation: &Recommendation) {
    tracing::debug!(
        event_name = "recommendation.resolved",
        basket_items,
        top_n,
        returned = recommendation.len(),
        resolved_by = ?recommendation.resolved_by,
        diversified = recommendation.diversified,
        "basket recommendation resolved"
    );
}
