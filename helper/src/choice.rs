// SPDX-FileCopyrightText: 2024 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

/// Picks an index out of a weighted option list via its cumulative sums.
///
/// Returns the first index whose prefix sum reaches [target].
/// [target] must lie in `[0, total)` where `total` is the sum of all
/// weights. Returns `None` for an empty list or a non-positive total.
pub fn cumulative_pick(weights: &[f64], target: f64) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let mut prefix = Vec::with_capacity(weights.len());
    let mut total = 0.0;
    for w in weights {
        total += w;
        prefix.push(total);
    }
    if total <= 0.0 {
        return None;
    }
    let idx = prefix.partition_point(|cum| *cum < target);
    if idx >= weights.len() {
        // target == total can slip past the last prefix sum.
        return Some(weights.len() - 1);
    }
    Some(idx)
}

/// Sums a weighted option list. Convenience for drawing the target sample.
pub fn total_weight(weights: &[f64]) -> f64 {
    weights.iter().sum()
}
