//! Frequent-pattern growth over a prefix tree; no candidate generation.

use std::collections::HashMap;

use super::encoding::EncodedTransactions;

const ROOT: usize = 0;

#[derive(Debug)]
struct Node {
    item: u32,
    count: usize,
    parent: usize,
    children: Vec<usize>,
}

/// Prefix tree of weighted item paths, items ordered by descending frequency.
#[derive(Debug)]
struct FpTree {
    nodes: Vec<Node>,
    /// `(item, nodes holding it)` in descending frequency order.
    header: Vec<(u32, Vec<usize>)>,
}

impl FpTree {
    fn build(patterns: &[(Vec<u32>, usize)], min_count: usize) -> Self {
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for (items, weight) in patterns {
            for item in items {
                *counts.entry(*item).or_default() += weight;
            }
        }

        let mut ranked: Vec<(u32, usize)> =
            counts.into_iter().filter(|(_, count)| *count >= min_count).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let rank: HashMap<u32, usize> =
            ranked.iter().enumerate().map(|(position, (item, _))| (*item, position)).collect();

        let mut tree = Self {
            nodes: vec![Node { item: u32::MAX, count: 0, parent: ROOT, children: Vec::new() }],
            header: ranked.iter().map(|(item, _)| (*item, Vec::new())).collect(),
        };

        for (items, weight) in patterns {
            let mut path: Vec<u32> =
                items.iter().copied().filter(|item| rank.contains_key(item)).collect();
            path.sort_by_key(|item| rank[item]);
            tree.insert(&path, *weight, &rank);
        }

        tree
    }

    fn insert(&mut self, path: &[u32], weight: usize, rank: &HashMap<u32, usize>) {
        let mut current = ROOT;
        for item in path {
            let existing = self.nodes[current]
                .children
                .iter()
                .copied()
                .find(|child| self.nodes[*child].item == *item);

            current = match existing {
                Some(child) => {
                    self.nodes[child].count += weight;
                    child
                }
                None => {
                    let index = self.nodes.len();
                    self.nodes.push(Node {
                        item: *item,
                        count: weight,
                        parent: current,
                        children: Vec::new(),
                    });
                    self.nodes[current].children.push(index);
                    self.header[rank[item]].1.push(index);
                    index
                }
            };
        }
    }

    fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Prefix paths leading to every occurrence of the header entry at `position`.
    fn conditional_patterns(&self, position: usize) -> Vec<(Vec<u32>, usize)> {
        self.header[position]
            .1
            .iter()
            .filter_map(|node| {
                let count = self.nodes[*node].count;
                let mut path = Vec::new();
                let mut cursor = self.nodes[*node].parent;
                while cursor != ROOT {
                    path.push(self.nodes[cursor].item);
                    cursor = self.nodes[cursor].parent;
                }
                (!path.is_empty()).then_some((path, count))
            })
            .collect()
    }
}

pub(crate) fn frequent_itemsets(
    encoded: &EncodedTransactions,
    min_count: usize,
    max_len: Option<usize>,
) -> Vec<(Vec<u32>, usize)> {
    let patterns: Vec<(Vec<u32>, usize)> =
        encoded.rows.iter().map(|row| (row.clone(), 1)).collect();
    let tree = FpTree::build(&patterns, min_count);

    let mut found = Vec::new();
    grow(&tree, &[], min_count, max_len, &mut found);
    found
}

fn grow(
    tree: &FpTree,
    suffix: &[u32],
    min_count: usize,
    max_len: Option<usize>,
    found: &mut Vec<(Vec<u32>, usize)>,
) {
    // Least frequent first: its conditional base is the smallest.
    for position in (0..tree.header.len()).rev() {
        let (item, nodes) = &tree.header[position];
        let support: usize = nodes.iter().map(|node| tree.nodes[*node].count).sum();

        let mut itemset = suffix.to_vec();
        itemset.push(*item);
        let mut sorted = itemset.clone();
        sorted.sort_unstable();
        found.push((sorted, support));

        if max_len.is_some_and(|max| itemset.len() >= max) {
            continue;
        }

        let conditional = FpTree::build(&tree.conditional_patterns(position), min_count);
        if !conditional.is_empty() {
            grow(&conditional, &itemset, min_count, max_len, found);
        }
    }
}
