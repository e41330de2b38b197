//! Level-wise candidate generation with subset pruning.

use std::collections::HashSet;

use super::encoding::EncodedTransactions;

pub(crate) fn frequent_itemsets(
    encoded: &EncodedTransactions,
    min_count: usize,
    max_len: Option<usize>,
) -> Vec<(Vec<u32>, usize)> {
    let mut found = Vec::new();

    let mut level: Vec<Vec<u32>> = encoded
        .item_counts()
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count >= min_count)
        .map(|(id, count)| {
            found.push((vec![id as u32], count));
            vec![id as u32]
        })
        .collect();

    // Rows shrunk to frequent singletons; nothing else can appear in a candidate.
    let frequent_items: HashSet<u32> = level.iter().map(|itemset| itemset[0]).collect();
    let rows: Vec<Vec<u32>> = encoded
        .rows
        .iter()
        .map(|row| row.iter().copied().filter(|id| frequent_items.contains(id)).collect::<Vec<_>>())
        .filter(|row: &Vec<u32>| row.len() >= 2)
        .collect();

    let mut width = 1;
    while !level.is_empty() && max_len.map_or(true, |max| width < max) {
        let candidates = generate_candidates(&level);
        if candidates.is_empty() {
            break;
        }

        let mut counts = vec![0_usize; candidates.len()];
        for row in rows.iter().filter(|row| row.len() > width) {
            for (index, candidate) in candidates.iter().enumerate() {
                if is_sorted_subset(candidate, row) {
                    counts[index] += 1;
                }
            }
        }

        level = candidates
            .into_iter()
            .zip(counts)
            .filter(|(_, count)| *count >= min_count)
            .map(|(candidate, count)| {
                found.push((candidate.clone(), count));
                candidate
            })
            .collect();
        width += 1;
    }

    found
}

/// Joins itemsets sharing all but their last item, then drops any candidate
/// with an infrequent immediate subset. `level` must be sorted.
fn generate_candidates(level: &[Vec<u32>]) -> Vec<Vec<u32>> {
    let known: HashSet<&[u32]> = level.iter().map(Vec::as_slice).collect();
    let mut candidates = Vec::new();

    for (i, left) in level.iter().enumerate() {
        let prefix = &left[..left.len() - 1];
        for right in &level[i + 1..] {
            if &right[..right.len() - 1] != prefix {
                break;
            }

            let mut candidate = left.clone();
            candidate.push(right[right.len() - 1]);

            let all_subsets_frequent = (0..candidate.len()).all(|skip| {
                let subset: Vec<u32> = candidate
                    .iter()
                    .enumerate()
                    .filter(|(position, _)| *position != skip)
                    .map(|(_, id)| *id)
                    .collect();
                known.contains(subset.as_slice())
            });
            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

fn is_sorted_subset(needle: &[u32], haystack: &[u32]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|wanted| rest.by_ref().any(|id| id == wanted))
}
