pub mod config;
pub mod domain;
pub mod errors;
pub mod mining;
pub mod recommendation;
pub mod store;

pub use config::{AppConfig, MiningAlgorithm, MiningConfig, RecommendationConfig};
pub use domain::item::{coerce_basket, coerce_identifier, coerce_item, CanonicalItem};
pub use domain::rule::{rank_order, AssociationRule, RuleSet};
pub use domain::transaction::{LineItem, Transaction};
pub use errors::{ApplicationError, DomainError};
pub use mining::{
    build_rules, distinct_items, extract_transactions, mine, mine_itemsets, FrequentItemset,
    FrequentItemsets,
};
pub use recommendation::{
    recommend, shuffler_for, CandidateShuffler, MatchStrategy, RandomShuffler, RankedOrder,
    Recommendation, RecommendationEngine, RecommendationRequest, RecommendedItem,
};
pub use store::{PublishedRuleSet, RuleSetStore};
