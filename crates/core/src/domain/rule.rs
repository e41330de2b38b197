use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::item::CanonicalItem;
use crate::errors::DomainError;

/// `antecedents => consequents` with the metrics it was kept for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedents: BTreeSet<String>,
    pub consequents: BTreeSet<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    #[serde(default)]
    pub antecedent_support: f64,
    #[serde(default)]
    pub consequent_support: f64,
    #[serde(default)]
    pub leverage: f64,
}

impl AssociationRule {
    /// Builds a rule from the three core metrics and derives the rest from them.
    pub fn new<A, C, S>(
        antecedents: A,
        consequents: C,
        support: f64,
        confidence: f64,
        lift: f64,
    ) -> Self
    where
        A: IntoIterator<Item = S>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let antecedent_support = if confidence > 0.0 { support / confidence } else { 0.0 };
        let consequent_support = if lift > 0.0 { confidence / lift } else { 0.0 };

        Self {
            antecedents: antecedents.into_iter().map(Into::into).collect(),
            consequents: consequents.into_iter().map(Into::into).collect(),
            support,
            confidence,
            lift,
            antecedent_support,
            consequent_support,
            leverage: support - antecedent_support * consequent_support,
        }
    }

    fn check_invariants(&self) -> Result<(), String> {
        if self.antecedents.is_empty() || self.consequents.is_empty() {
            return Err("antecedents and consequents must both be non-empty".to_owned());
        }
        if let Some(shared) = self.antecedents.intersection(&self.consequents).next() {
            return Err(format!("item `{shared}` appears on both sides"));
        }
        if !(0.0..=1.0).contains(&self.support) {
            return Err(format!("support {} is outside [0, 1]", self.support));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} is outside [0, 1]", self.confidence));
        }
        if self.lift.is_nan() || self.lift < 0.0 {
            return Err(format!("lift {} is negative or not a number", self.lift));
        }
        Ok(())
    }
}

/// Canonical rule-set order: lift descending, then confidence descending.
pub fn rank_order(a: &AssociationRule, b: &AssociationRule) -> Ordering {
    b.lift.total_cmp(&a.lift).then_with(|| b.confidence.total_cmp(&a.confidence))
}

/// An immutable, ranked sequence of rules.
///
/// The order is the builder's ranking and is relied on by the recommendation
/// engine; there are no methods that mutate a rule set after construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AssociationRule>", into = "Vec<AssociationRule>")]
pub struct RuleSet {
    rules: Vec<AssociationRule>,
    canonical_antecedents: Vec<BTreeSet<CanonicalItem>>,
    /// Rule positions by support descending; ties keep canonical order.
    support_order: Vec<usize>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Accepts rules that are already in canonical order, as produced by the
    /// rule builder. Used when a rule set is reloaded from storage.
    pub fn from_ranked(rules: Vec<AssociationRule>) -> Result<Self, DomainError> {
        for (position, rule) in rules.iter().enumerate() {
            rule.check_invariants().map_err(|message| {
                DomainError::InvariantViolation(format!("rule {position}: {message}"))
            })?;
        }

        if let Some(position) =
            rules.windows(2).position(|pair| rank_order(&pair[0], &pair[1]) == Ordering::Greater)
        {
            return Err(DomainError::InvariantViolation(format!(
                "rule {} is ranked above rule {} but has a lower (lift, confidence)",
                position,
                position + 1
            )));
        }

        Ok(Self::from_sorted(rules))
    }

    /// Sorts arbitrary rules into canonical order. The sort is stable so rules
    /// with equal lift and confidence keep their input order.
    pub fn ranked(mut rules: Vec<AssociationRule>) -> Self {
        rules.sort_by(rank_order);
        Self::from_sorted(rules)
    }

    fn from_sorted(rules: Vec<AssociationRule>) -> Self {
        let canonical_antecedents = rules
            .iter()
            .map(|rule| rule.antecedents.iter().map(|item| CanonicalItem::new(item)).collect())
            .collect();
        let mut support_order: Vec<usize> = (0..rules.len()).collect();
        support_order.sort_by(|&a, &b| rules[b].support.total_cmp(&rules[a].support));
        Self { rules, canonical_antecedents, support_order }
    }

    pub fn rules(&self) -> &[AssociationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssociationRule> {
        self.rules.iter()
    }

    /// Rules paired with their canonicalized antecedents, in canonical order.
    pub(crate) fn indexed(
        &self,
    ) -> impl Iterator<Item = (&AssociationRule, &BTreeSet<CanonicalItem>)> {
        self.rules.iter().zip(self.canonical_antecedents.iter())
    }

    /// Rules by support descending, stable with respect to the ranking.
    pub(crate) fn by_support(&self) -> impl Iterator<Item = &AssociationRule> {
        self.support_order.iter().map(|&position| &self.rules[position])
    }

    /// The first `limit` rules of the ranking.
    pub fn top(&self, limit: usize) -> &[AssociationRule] {
        &self.rules[..limit.min(self.rules.len())]
    }

    /// Every item that appears on either side of any rule, sorted.
    pub fn catalog(&self) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|rule| rule.antecedents.iter().chain(rule.consequents.iter()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Content hash over rules and their order.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(&self.rules)
            .unwrap_or_else(|error| format!("serialization_error:{error}"));
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("sha256:{:x}", hasher.finalize())
    }
}

impl TryFrom<Vec<AssociationRule>> for RuleSet {
    type Error = DomainError;

    fn try_from(rules: Vec<AssociationRule>) -> Result<Self, Self::Error> {
        Self::from_ranked(rules)
    }
}

impl From<RuleSet> for Vec<AssociationRule> {
    fn from(value: RuleSet) -> Self {
        value.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(a: &[&str], c: &[&str], confidence: f64, lift: f64) -> AssociationRule {
        AssociationRule::new(a.iter().copied(), c.iter().copied(), 0.1, confidence, lift)
    }

    #[test]
    fn derived_metrics_follow_from_core_metrics() {
        let rule = AssociationRule::new(["A"], ["B"], 0.2, 0.8, 2.0);
        assert!((rule.antecedent_support - 0.25).abs() < 1e-12);
        assert!((rule.consequent_support - 0.4).abs() < 1e-12);
        assert!((rule.leverage - 0.1).abs() < 1e-12);
    }

    #[test]
    fn ranked_sorts_by_lift_then_confidence() {
        let rules = RuleSet::ranked(vec![
            rule(&["A"], &["B"], 0.5, 1.5),
            rule(&["C"], &["D"], 0.9, 3.0),
            rule(&["E"], &["F"], 0.7, 3.0),
        ]);

        let order: Vec<_> =
            rules.iter().map(|rule| rule.antecedents.iter().next().cloned().unwrap()).collect();
        assert_eq!(order, vec!["C", "E", "A"]);
    }

    #[test]
    fn from_ranked_rejects_out_of_order_rules() {
        let result = RuleSet::from_ranked(vec![
            rule(&["A"], &["B"], 0.5, 1.5),
            rule(&["C"], &["D"], 0.9, 3.0),
        ]);
        assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn from_ranked_rejects_overlapping_sides() {
        let result = RuleSet::from_ranked(vec![rule(&["A", "B"], &["B"], 0.5, 1.5)]);
        assert!(matches!(
            result,
            Err(DomainError::InvariantViolation(ref message)) if message.contains("`B`")
        ));
    }

    #[test]
    fn from_ranked_rejects_confidence_above_one() {
        let result = RuleSet::from_ranked(vec![rule(&["A"], &["B"], 1.2, 1.5)]);
        assert!(result.is_err());
    }

    #[test]
    fn serde_round_trip_revalidates_and_keeps_order() {
        let rules = RuleSet::ranked(vec![
            rule(&["a"], &["B"], 0.6, 2.0),
            rule(&["C"], &["D", "E"], 0.4, 1.1),
        ]);
        let json = serde_json::to_string(&rules).unwrap();
        let restored: RuleSet = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, rules);
        assert_eq!(restored.fingerprint(), rules.fingerprint());
    }

    #[test]
    fn deserializing_unsorted_rules_fails() {
        let json = serde_json::to_string(&vec![
            rule(&["A"], &["B"], 0.5, 1.0),
            rule(&["C"], &["D"], 0.5, 2.0),
        ])
        .unwrap();
        assert!(serde_json::from_str::<RuleSet>(&json).is_err());
    }

    #[test]
    fn catalog_is_sorted_union_of_both_sides() {
        let rules = RuleSet::ranked(vec![
            rule(&["Mug", "Tea"], &["Spoon"], 0.6, 2.0),
            rule(&["Spoon"], &["Bowl"], 0.4, 1.1),
        ]);
        assert_eq!(rules.catalog(), vec!["Bowl", "Mug", "Spoon", "Tea"]);
    }

    #[test]
    fn support_order_is_precomputed_and_stable_within_ties() {
        let rules = RuleSet::ranked(vec![
            AssociationRule::new(["A"], ["B"], 0.2, 0.9, 3.0),
            AssociationRule::new(["C"], ["D"], 0.5, 0.9, 2.0),
            AssociationRule::new(["E"], ["F"], 0.2, 0.8, 1.5),
            AssociationRule::new(["G"], ["H"], 0.7, 0.6, 1.2),
        ]);

        let order: Vec<&str> = rules
            .by_support()
            .map(|rule| rule.antecedents.iter().next().map(String::as_str).unwrap_or_default())
            .collect();
        assert_eq!(order, vec!["G", "C", "A", "E"]);
        assert_eq!(RuleSet::empty().by_support().count(), 0);
    }

    #[test]
    fn top_is_bounded_by_length() {
        let rules = RuleSet::ranked(vec![rule(&["A"], &["B"], 0.5, 1.0)]);
        assert_eq!(rules.top(10).len(), 1);
        assert!(RuleSet::empty().top(3).is_empty());
    }

    #[test]
    fn canonical_antecedents_are_indexed_per_rule() {
        let rules = RuleSet::ranked(vec![rule(&[" mug "], &["Tea"], 0.5, 1.0)]);
        let (_, canonical) = rules.indexed().next().unwrap();
        assert!(canonical.contains(&CanonicalItem::new("MUG")));
    }
}
