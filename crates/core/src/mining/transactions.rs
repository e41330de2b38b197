use std::collections::{BTreeMap, BTreeSet};

use crate::domain::transaction::{LineItem, Transaction};

/// Groups line items by order identifier into item-presence transactions.
///
/// Every distinct order yields exactly one transaction, even when all of its
/// items were missing. Missing items never become members of a transaction.
pub fn extract_transactions<I>(records: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = LineItem>,
{
    let mut orders: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut record_count = 0_usize;

    for record in records {
        record_count += 1;
        let items = orders.entry(record.order_id).or_default();
        if let Some(item) = record.item {
            items.insert(item);
        }
    }

    tracing::info!(
        event_name = "mining.transactions.extracted",
        records = record_count,
        transactions = orders.len(),
        "grouped line items into transactions"
    );

    orders.into_iter().map(|(order_id, items)| Transaction { order_id, items }).collect()
}

/// Sorted distinct item names across all transactions.
pub fn distinct_items(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .flat_map(|transaction| transaction.items.iter())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
