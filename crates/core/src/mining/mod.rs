//! Offline rule mining
//!
//! Turns order history into a ranked [`RuleSet`]: transactions are extracted
//! from line items, frequent itemsets are mined with the configured algorithm,
//! and rules are derived and ranked by lift then confidence. The whole pipeline
//! is deterministic for a given input.

mod apriori;
mod encoding;
mod fpgrowth;
mod rules;
mod transactions;

use serde::{Deserialize, Serialize};

pub use rules::build_rules;
pub use transactions::{distinct_items, extract_transactions};

use crate::config::{MiningAlgorithm, MiningConfig};
use crate::domain::rule::RuleSet;
use crate::domain::transaction::Transaction;
use crate::errors::{validate_threshold, DomainError};
use encoding::{minimum_count, EncodedTransactions};

/// Result type for mining operations
pub type MiningResult<T> = Result<T, DomainError>;

/// A set of items, sorted by name, with its absolute and relative support.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequentItemset {
    pub items: Vec<String>,
    pub count: usize,
    pub support: f64,
}

/// Every itemset meeting the support threshold, ordered by width then items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequentItemsets {
    pub transaction_count: usize,
    pub itemsets: Vec<FrequentItemset>,
}

impl FrequentItemsets {
    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequentItemset> {
        self.itemsets.iter()
    }
}

/// Finds every itemset whose support reaches `config.min_support`.
///
/// An empty result is a normal outcome. Thresholds are validated before any
/// work is done.
pub fn mine_itemsets(
    transactions: &[Transaction],
    config: &MiningConfig,
) -> MiningResult<FrequentItemsets> {
    validate_threshold("min_support", config.min_support)?;
    if config.max_itemset_len == Some(0) {
        return Err(DomainError::InvariantViolation(
            "max_itemset_len must be greater than zero".to_owned(),
        ));
    }

    let total = transactions.len();
    if total == 0 {
        return Ok(FrequentItemsets::default());
    }

    let encoded = EncodedTransactions::encode(transactions);
    let min_count = minimum_count(config.min_support, total);
    let raw = match config.algorithm {
        MiningAlgorithm::Apriori => {
            apriori::frequent_itemsets(&encoded, min_count, config.max_itemset_len)
        }
        MiningAlgorithm::FpGrowth => {
            fpgrowth::frequent_itemsets(&encoded, min_count, config.max_itemset_len)
        }
    };

    let mut itemsets: Vec<FrequentItemset> = raw
        .into_iter()
        .map(|(ids, count)| FrequentItemset {
            items: encoded.decode(&ids),
            count,
            support: count as f64 / total as f64,
        })
        .collect();
    itemsets.sort_by(|a, b| a.items.len().cmp(&b.items.len()).then_with(|| a.items.cmp(&b.items)));

    tracing::info!(
        event_name = "mining.itemsets.mined",
        algorithm = %config.algorithm,
        transactions = encoded.len(),
        distinct_items = encoded.names.len(),
        min_count,
        itemsets = itemsets.len(),
        "frequent itemsets mined"
    );

    Ok(FrequentItemsets { transaction_count: total, itemsets })
}

/// Mining entry point: transactions in, ranked rule set out.
pub fn mine(transactions: &[Transaction], config: &MiningConfig) -> MiningResult<RuleSet> {
    validate_threshold("min_confidence", config.min_confidence)?;
    let itemsets = mine_itemsets(transactions, config)?;
    build_rules(&itemsets, config.min_confidence)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::domain::rule::rank_order;

    fn grocery_transactions() -> Vec<Transaction> {
        vec![
            Transaction::new("1", ["bread", "milk"]),
            Transaction::new("2", ["bread", "diaper", "beer", "eggs"]),
            Transaction::new("3", ["milk", "diaper", "beer", "cola"]),
            Transaction::new("4", ["bread", "milk", "diaper", "beer"]),
            Transaction::new("5", ["bread", "milk", "diaper", "cola"]),
        ]
    }

    fn synthetic_transactions(seed: u64, orders: usize, catalog: usize) -> Vec<Transaction> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..orders)
            .map(|order| {
                let width = rng.gen_range(1..=6);
                // Skewed draw so some items are popular enough to co-occur.
                let items: Vec<String> = (0..width)
                    .map(|_| {
                        let roll: f64 = rng.gen();
                        format!("SKU-{:04}", (roll * roll * catalog as f64) as usize)
                    })
                    .collect();
                Transaction::new(order.to_string(), items)
            })
            .collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[test]
    fn grocery_itemsets_match_hand_count() {
        let config = MiningConfig::new(0.6, 0.5);
        let itemsets = mine_itemsets(&grocery_transactions(), &config).unwrap();

        let names: Vec<Vec<String>> =
            itemsets.iter().map(|itemset| itemset.items.clone()).collect();
        assert_eq!(
            names,
            vec![
                vec!["beer".to_owned()],
                vec!["bread".to_owned()],
                vec!["diaper".to_owned()],
                vec!["milk".to_owned()],
                vec!["beer".to_owned(), "diaper".to_owned()],
                vec!["bread".to_owned(), "diaper".to_owned()],
                vec!["bread".to_owned(), "milk".to_owned()],
                vec!["diaper".to_owned(), "milk".to_owned()],
            ]
        );
        assert_eq!(itemsets.itemsets[4].count, 3);
        assert!((itemsets.itemsets[4].support - 0.6).abs() < 1e-12);
    }

    #[test]
    fn grocery_rules_rank_by_lift_then_confidence() {
        let rules = mine(&grocery_transactions(), &MiningConfig::new(0.6, 0.7)).unwrap();

        assert_eq!(rules.len(), 8);
        let first = &rules.rules()[0];
        assert_eq!(first.antecedents, set(&["beer"]));
        assert_eq!(first.consequents, set(&["diaper"]));
        assert_eq!(first.lift, 1.25);
        assert_eq!(first.confidence, 1.0);

        let second = &rules.rules()[1];
        assert_eq!(second.antecedents, set(&["diaper"]));
        assert_eq!(second.consequents, set(&["beer"]));
        assert_eq!(second.lift, first.lift);
        assert_eq!(second.confidence, 0.75);
    }

    #[test]
    fn apriori_and_fp_growth_agree() {
        let transactions = synthetic_transactions(7, 600, 80);
        let apriori = mine_itemsets(
            &transactions,
            &MiningConfig::new(0.01, 0.2).with_algorithm(MiningAlgorithm::Apriori),
        )
        .unwrap();
        let fp_growth = mine_itemsets(
            &transactions,
            &MiningConfig::new(0.01, 0.2).with_algorithm(MiningAlgorithm::FpGrowth),
        )
        .unwrap();

        assert!(apriori.itemsets.iter().any(|itemset| itemset.items.len() >= 2));
        assert_eq!(apriori, fp_growth);
    }

    #[test]
    fn mining_twice_is_identical() {
        let transactions = synthetic_transactions(11, 400, 60);
        let config = MiningConfig::new(0.01, 0.1);

        let first = mine(&transactions, &config).unwrap();
        let second = mine(&transactions, &config).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn built_rules_satisfy_invariants_and_order() {
        let transactions = synthetic_transactions(3, 500, 50);
        let rules = mine(&transactions, &MiningConfig::new(0.01, 0.05)).unwrap();
        assert!(!rules.is_empty());

        for rule in rules.iter() {
            assert!(rule.antecedents.is_disjoint(&rule.consequents));
            assert!((0.0..=1.0).contains(&rule.support));
            assert!((0.0..=1.0).contains(&rule.confidence));
            assert!(rule.confidence >= 0.05);
            assert!(rule.lift >= 0.0);
        }

        let mut resorted = rules.rules().to_vec();
        resorted.sort_by(rank_order);
        assert_eq!(resorted.as_slice(), rules.rules());
        assert!(RuleSet::from_ranked(resorted).is_ok());
    }

    #[test]
    fn unreachable_support_yields_empty_results() {
        let itemsets =
            mine_itemsets(&grocery_transactions(), &MiningConfig::new(1.0, 0.5)).unwrap();
        assert!(itemsets.is_empty());

        let rules = build_rules(&itemsets, 0.5).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn no_transactions_yields_empty_rule_set() {
        let rules = mine(&[], &MiningConfig::new(0.1, 0.1)).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn out_of_range_thresholds_fail_fast() {
        let transactions = grocery_transactions();

        assert!(matches!(
            mine(&transactions, &MiningConfig::new(0.0, 0.5)),
            Err(DomainError::InvalidThreshold { name: "min_support", .. })
        ));
        assert!(matches!(
            mine(&transactions, &MiningConfig::new(0.5, 1.2)),
            Err(DomainError::InvalidThreshold { name: "min_confidence", .. })
        ));
        assert!(build_rules(&FrequentItemsets::default(), -0.1).is_err());
    }

    #[test]
    fn max_itemset_len_caps_width_for_both_algorithms() {
        let transactions = synthetic_transactions(5, 300, 20);
        for algorithm in [MiningAlgorithm::Apriori, MiningAlgorithm::FpGrowth] {
            let config =
                MiningConfig::new(0.01, 0.1).with_algorithm(algorithm).with_max_itemset_len(2);
            let itemsets = mine_itemsets(&transactions, &config).unwrap();
            assert!(itemsets.iter().all(|itemset| itemset.items.len() <= 2));
            assert!(itemsets.iter().any(|itemset| itemset.items.len() == 2));
        }
    }

    #[test]
    fn wide_catalog_mines_without_enumerating_subsets() {
        let transactions = synthetic_transactions(21, 3_000, 4_000);
        let itemsets = mine_itemsets(&transactions, &MiningConfig::new(0.002, 0.2)).unwrap();

        assert!(!itemsets.is_empty());
        assert!(itemsets.iter().all(|itemset| itemset.count >= 6));
    }
}
