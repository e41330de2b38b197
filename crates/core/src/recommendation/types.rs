//! Types for the Recommendation Engine

use serde::{Deserialize, Serialize};

/// Which tier of the cascade produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Every antecedent of the rule is in the basket
    Strict,
    /// At least one antecedent of the rule is in the basket
    Partial,
    /// Consequents of the highest-support rules, regardless of basket
    Global,
}

impl MatchStrategy {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            MatchStrategy::Strict => "Frequently purchased together",
            MatchStrategy::Partial => "Often bought with items in your basket",
            MatchStrategy::Global => "Popular with other shoppers",
        }
    }
}

/// Request for basket recommendations
#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    /// Raw basket entries, as typed by the shopper
    pub basket: Vec<String>,
    /// Maximum number of recommendations to return
    pub top_n: usize,
}

impl RecommendationRequest {
    pub fn new<I, S>(basket: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { basket: basket.into_iter().map(Into::into).collect(), top_n: super::DEFAULT_TOP_N }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// A recommended item in its rule-set casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub item: String,
    pub strategy: MatchStrategy,
}

/// Ordered recommendations plus how the cascade terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub items: Vec<RecommendedItem>,
    /// The tier the cascade stopped in
    pub resolved_by: MatchStrategy,
    /// Whether the strict-match diversity pool was shuffled
    pub diversified: bool,
}

impl Recommendation {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_names(&self) -> Vec<String> {
        self.items.iter().map(|recommended| recommended.item.clone()).collect()
    }

    pub fn into_item_names(self) -> Vec<String> {
        self.items.into_iter().map(|recommended| recommended.item).collect()
    }
}
