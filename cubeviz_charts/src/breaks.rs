// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Class breaks for discretized numeric color scales.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
#[allow(unused_imports, reason = "toolchains with these methods in `core` resolve them inherently")]
use crate::float::FloatExt;

/// Sorted finite values.
fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    v.sort_by(f64::total_cmp);
    v
}

/// R-7 quantile of sorted values (`p` in `[0, 1]`).
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let i = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = i.floor();
    #[allow(
        clippy::cast_possible_truncation,
        reason = "floor of a value in [0, n - 1]"
    )]
    let i0 = lo as usize;
    let v0 = sorted[i0];
    let v1 = sorted.get(i0 + 1).copied().unwrap_or(v0);
    Some(v0 + (v1 - v0) * (i - lo))
}

/// `classes - 1` thresholds splitting the data into equal-count classes.
pub fn quantile_thresholds(values: &[f64], classes: usize) -> Vec<f64> {
    let sorted = sorted_finite(values);
    (1..classes)
        .filter_map(|i| quantile_sorted(&sorted, i as f64 / classes as f64))
        .collect()
}

/// `classes - 1` thresholds splitting `[lo, hi]` into equal-width classes.
pub fn quantize_thresholds((lo, hi): (f64, f64), classes: usize) -> Vec<f64> {
    (1..classes)
        .map(|i| lo + (hi - lo) * i as f64 / classes as f64)
        .collect()
}

/// Natural breaks by optimal one-dimensional k-means (ckmeans).
///
/// Returns the last (largest) value of each cluster, so the result has exactly `k` entries
/// whenever `k` does not exceed the number of distinct values. Larger `k` is reduced to
/// the number of distinct values.
pub fn jenks_breaks(values: &[f64], k: usize) -> Vec<f64> {
    let x = sorted_finite(values);
    let n = x.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }
    let distinct = 1 + x.windows(2).filter(|w| w[0] != w[1]).count();
    let k = k.min(distinct);

    let mut s1 = vec![0.0; n + 1];
    let mut s2 = vec![0.0; n + 1];
    for (i, v) in x.iter().enumerate() {
        s1[i + 1] = s1[i] + v;
        s2[i + 1] = s2[i] + v * v;
    }
    // Within-cluster sum of squares for x[j..=i].
    let ssq = |j: usize, i: usize| {
        let m = (i - j + 1) as f64;
        let sum = s1[i + 1] - s1[j];
        (s2[i + 1] - s2[j] - sum * sum / m).max(0.0)
    };

    let mut cost = vec![vec![f64::INFINITY; n]; k];
    let mut start = vec![vec![0_usize; n]; k];
    for i in 0..n {
        cost[0][i] = ssq(0, i);
    }
    for m in 1..k {
        for i in m..n {
            for j in m..=i {
                let c = cost[m - 1][j - 1] + ssq(j, i);
                if c < cost[m][i] {
                    cost[m][i] = c;
                    start[m][i] = j;
                }
            }
        }
    }

    let mut breaks = vec![0.0; k];
    let mut right = n - 1;
    for m in (0..k).rev() {
        breaks[m] = x[right];
        let j = start[m][right];
        if j == 0 {
            break;
        }
        right = j - 1;
    }
    breaks
}

/// How a value equal to a threshold is classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdSide {
    /// The threshold belongs to the class above it.
    Lower,
    /// The threshold belongs to the class below it (cluster upper bounds).
    Upper,
}

/// Class index of `value` given sorted `thresholds`.
pub fn classify(thresholds: &[f64], value: f64, side: ThresholdSide) -> usize {
    match side {
        ThresholdSide::Lower => thresholds.partition_point(|t| *t <= value),
        ThresholdSide::Upper => thresholds.partition_point(|t| *t < value),
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn quantiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_thresholds(&[4.0, 1.0, 3.0, 2.0], 2), vec![2.5]);
    }

    #[test]
    fn quantize_splits_evenly() {
        assert_eq!(quantize_thresholds((0.0, 100.0), 4), vec![25.0, 50.0, 75.0]);
    }

    #[test]
    fn jenks_yields_exactly_k_breaks() {
        let data = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 50.0, 52.0];
        for k in 1..=5 {
            assert_eq!(jenks_breaks(&data, k).len(), k);
        }
        assert_eq!(jenks_breaks(&data, 3), vec![3.0, 12.0, 52.0]);
    }

    #[test]
    fn jenks_caps_at_distinct_values() {
        assert_eq!(jenks_breaks(&[1.0, 1.0, 2.0], 5), vec![1.0, 2.0]);
        assert!(jenks_breaks(&[f64::NAN], 3).is_empty());
    }

    #[test]
    fn upper_side_keeps_cluster_maxima_in_their_class() {
        let breaks = [3.0, 12.0];
        assert_eq!(classify(&breaks, 3.0, ThresholdSide::Upper), 0);
        assert_eq!(classify(&breaks, 3.0, ThresholdSide::Lower), 1);
        assert_eq!(classify(&breaks, 52.0, ThresholdSide::Upper), 2);
    }
}
