use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One cleaned line-item record: which order it belongs to and the item name.
///
/// `item` is `None` when the source cell was missing; such records never reach a
/// transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub order_id: String,
    pub item: Option<String>,
}

impl LineItem {
    pub fn new(order_id: impl Into<String>, item: impl Into<String>) -> Self {
        Self { order_id: order_id.into(), item: Some(item.into()) }
    }

    pub fn missing_item(order_id: impl Into<String>) -> Self {
        Self { order_id: order_id.into(), item: None }
    }
}

/// Item presence for a single order. Duplicates collapse, order is irrelevant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub order_id: String,
    pub items: BTreeSet<String>,
}

impl Transaction {
    pub fn new<I, S>(order_id: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { order_id: order_id.into(), items: items.into_iter().map(Into::into).collect() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }
}
