// Dense ranking of PPR within groups.

use std::collections::HashMap;
use std::hash::Hash;

/// Zero-sign collapse so `-0.0` and `0.0` share a rank.
fn rank_key(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Dense rank of each value, highest first: ties share a rank and the next
/// distinct value gets `previous + 1`.
///
/// `[300, 300, 250, 100]` ranks as `[1, 1, 2, 3]`.
pub fn dense_rank_desc(values: &[f64]) -> Vec<u32> {
    let mut distinct: Vec<f64> = values.iter().copied().map(rank_key).collect();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup_by(|a, b| a.total_cmp(b).is_eq());

    values
        .iter()
        .map(|&v| {
            let v = rank_key(v);
            let idx = distinct
                .binary_search_by(|d| v.total_cmp(d))
                .unwrap_or_else(|i| i);
            idx as u32 + 1
        })
        .collect()
}

/// Dense rank `values` separately within each group defined by `keys`.
/// Output is aligned with the input order.
pub fn dense_rank_grouped<K: Eq + Hash>(keys: &[K], values: &[f64]) -> Vec<u32> {
    debug_assert_eq!(keys.len(), values.len());

    let mut groups: HashMap<&K, Vec<usize>> = HashMap::new();
    for (i, key) in keys.iter().enumerate() {
        groups.entry(key).or_default().push(i);
    }

    let mut ranks = vec![0; values.len()];
    for members in groups.values() {
        let group_values: Vec<f64> = members.iter().map(|&i| values[i]).collect();
        for (&i, rank) in members.iter().zip(dense_rank_desc(&group_values)) {
            ranks[i] = rank;
        }
    }
    ranks
}
