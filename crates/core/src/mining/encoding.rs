use std::collections::{BTreeSet, HashMap};

use crate::domain::transaction::Transaction;

/// Transactions rewritten as sorted item ids.
///
/// Ids are assigned in lexicographic order of item names, so an ascending id
/// sequence decodes to an ascending name sequence.
#[derive(Debug)]
pub(crate) struct EncodedTransactions {
    pub names: Vec<String>,
    pub rows: Vec<Vec<u32>>,
}

impl EncodedTransactions {
    pub fn encode(transactions: &[Transaction]) -> Self {
        let names: Vec<String> = transactions
            .iter()
            .flat_map(|transaction| transaction.items.iter())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let ids: HashMap<&str, u32> =
            names.iter().enumerate().map(|(id, name)| (name.as_str(), id as u32)).collect();

        let rows = transactions
            .iter()
            .map(|transaction| {
                // BTreeSet iteration is sorted, and so are the ids.
                transaction
                    .items
                    .iter()
                    .filter_map(|item| ids.get(item.as_str()).copied())
                    .collect()
            })
            .collect();

        Self { names, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn decode(&self, ids: &[u32]) -> Vec<String> {
        ids.iter().map(|id| self.names[*id as usize].clone()).collect()
    }

    pub fn item_counts(&self) -> Vec<usize> {
        let mut counts = vec![0_usize; self.names.len()];
        for row in &self.rows {
            for id in row {
                counts[*id as usize] += 1;
            }
        }
        counts
    }
}

/// Smallest transaction count whose support reaches `min_support`.
///
/// Computed against the same `count / total >= min_support` comparison used for
/// reporting so that float rounding cannot admit or drop a boundary itemset.
pub(crate) fn minimum_count(min_support: f64, total: usize) -> usize {
    let meets = |count: usize| count as f64 / total as f64 >= min_support;
    let mut count = (min_support * total as f64).ceil().max(1.0) as usize;
    while count > 1 && meets(count - 1) {
        count -= 1;
    }
    while count <= total && !meets(count) {
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_name_order() {
        let encoded = EncodedTransactions::encode(&[
            Transaction::new("1", ["pear", "apple"]),
            Transaction::new("2", ["fig"]),
        ]);
        assert_eq!(encoded.names, vec!["apple", "fig", "pear"]);
        assert_eq!(encoded.rows, vec![vec![0, 2], vec![1]]);
        assert_eq!(encoded.decode(&[0, 2]), vec!["apple", "pear"]);
    }

    #[test]
    fn minimum_count_matches_support_boundary() {
        assert_eq!(minimum_count(0.5, 10), 5);
        assert_eq!(minimum_count(0.51, 10), 6);
        assert_eq!(minimum_count(1.0, 3), 3);
        assert_eq!(minimum_count(0.001, 10), 1);
        // 0.3 * 10 is 3.0000000000000004 in binary floating point.
        assert_eq!(minimum_count(0.3, 10), 3);
    }
}
