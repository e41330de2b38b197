use std::collections::HashMap;

use super::FrequentItemsets;
use crate::domain::rule::{AssociationRule, RuleSet};
use crate::errors::{validate_threshold, DomainError};

/// Derives every rule `A => C` with `A ∪ C` frequent, `A ∩ C = ∅`, and
/// `confidence >= min_confidence`, returned in canonical rank order.
pub fn build_rules(
    itemsets: &FrequentItemsets,
    min_confidence: f64,
) -> Result<RuleSet, DomainError> {
    validate_threshold("min_confidence", min_confidence)?;

    let total = itemsets.transaction_count;
    if total == 0 || itemsets.is_empty() {
        return Ok(RuleSet::empty());
    }

    let counts: HashMap<&[String], usize> =
        itemsets.iter().map(|itemset| (itemset.items.as_slice(), itemset.count)).collect();
    let mut rules = Vec::new();

    for itemset in itemsets.iter().filter(|itemset| itemset.items.len() >= 2) {
        let width = itemset.items.len();
        // A frequent 64-wide itemset implies 2^64 frequent subsets; unreachable.
        if width >= 64 {
            continue;
        }

        for mask in 1_u64..(1_u64 << width) - 1 {
            let (antecedent, consequent): (Vec<_>, Vec<_>) = itemset
                .items
                .iter()
                .enumerate()
                .partition(|(position, _)| mask & (1_u64 << *position) != 0);
            let antecedent: Vec<String> =
                antecedent.into_iter().map(|(_, item)| item.clone()).collect();
            let consequent: Vec<String> =
                consequent.into_iter().map(|(_, item)| item.clone()).collect();

            let (Some(&antecedent_count), Some(&consequent_count)) =
                (counts.get(antecedent.as_slice()), counts.get(consequent.as_slice()))
            else {
                tracing::warn!(
                    event_name = "mining.rules.missing_subset",
                    itemset = ?itemset.items,
                    "frequent itemset has a subset without a recorded support; skipping split"
                );
                continue;
            };

            let confidence = itemset.count as f64 / antecedent_count as f64;
            if confidence < min_confidence {
                continue;
            }

            // Single division over exact integer products, so `A => C` and
            // `C => A` always carry bit-identical lift.
            let lift = (itemset.count as f64 * total as f64)
                / (antecedent_count as f64 * consequent_count as f64);
            let antecedent_support = antecedent_count as f64 / total as f64;
            let consequent_support = consequent_count as f64 / total as f64;
            rules.push(AssociationRule {
                antecedents: antecedent.into_iter().collect(),
                consequents: consequent.into_iter().collect(),
                support: itemset.support,
                confidence,
                lift,
                antecedent_support,
                consequent_support,
                leverage: itemset.support - antecedent_support * consequent_support,
            });
        }
    }

    let rule_set = RuleSet::ranked(rules);
    tracing::info!(
        event_name = "mining.rules.built",
        itemsets = itemsets.len(),
        rules = rule_set.len(),
        min_confidence,
        "association rules built"
    );
    Ok(rule_set)
}
