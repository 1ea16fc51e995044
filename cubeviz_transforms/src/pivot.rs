// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wide (one row per axis value, one column per segment) tables.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use cubeviz_core::ImputationType;
use hashbrown::HashMap;

/// One long-format input row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LongRow<'a> {
    /// Axis key (band value or temporal key).
    pub key: &'a str,
    /// Numeric axis position used by linear imputation; `NaN` when not applicable.
    pub position: f64,
    /// Segment value.
    pub segment: &'a str,
    /// Measure; `NaN` means absent.
    pub value: f64,
}

/// A wide table with optional cells.
///
/// Data is columnar: `data[segment][row]`.
#[derive(Clone, Debug, PartialEq)]
pub struct WideFrame {
    /// Axis keys, one per row.
    pub keys: Vec<String>,
    /// Numeric axis position per row.
    pub positions: Vec<f64>,
    /// Segment values, one per column.
    pub segments: Vec<String>,
    /// Columnar cells aligned to `segments` then `keys`.
    pub data: Vec<Vec<Option<f64>>>,
}

impl WideFrame {
    /// An all-absent frame.
    pub fn new(keys: Vec<String>, segments: Vec<String>) -> Self {
        let rows = keys.len();
        let positions = (0..rows).map(|i| i as f64).collect();
        let data = vec![vec![None; rows]; segments.len()];
        Self {
            keys,
            positions,
            segments,
            data,
        }
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.keys.len()
    }

    /// Row index of an axis key.
    pub fn row_index(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    /// Column index of a segment.
    pub fn segment_index(&self, segment: &str) -> Option<usize> {
        self.segments.iter().position(|s| s == segment)
    }

    /// Cell by indices.
    pub fn get(&self, row: usize, segment: usize) -> Option<f64> {
        self.data.get(segment)?.get(row).copied().flatten()
    }

    /// Cell by key and segment value.
    pub fn value(&self, key: &str, segment: &str) -> Option<f64> {
        self.get(self.row_index(key)?, self.segment_index(segment)?)
    }

    /// Sum of present cells in a row.
    pub fn row_total(&self, row: usize) -> f64 {
        (0..self.segments.len())
            .filter_map(|s| self.get(row, s))
            .sum()
    }

    /// A copy with every row divided by its total.
    ///
    /// Rows summing to zero stay zero. The receiver is untouched, so switching back to
    /// absolute values uses the original frame.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        for row in 0..self.row_count() {
            let total = self.row_total(row);
            for col in &mut out.data {
                if let Some(v) = col[row].as_mut() {
                    *v = if total == 0.0 { 0.0 } else { *v / total };
                }
            }
        }
        out
    }

    /// Fills absent cells according to `imputation`.
    pub fn impute(&mut self, imputation: ImputationType) {
        match imputation {
            ImputationType::None => {}
            ImputationType::Zeros => {
                for col in &mut self.data {
                    for cell in col.iter_mut().filter(|c| c.is_none()) {
                        *cell = Some(0.0);
                    }
                }
            }
            ImputationType::Linear => {
                for s in 0..self.data.len() {
                    let filled = interpolate(&self.positions, &self.data[s]);
                    self.data[s] = filled;
                }
            }
        }
    }
}

fn interpolate(positions: &[f64], col: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<usize> = (0..col.len()).filter(|&i| col[i].is_some()).collect();
    (0..col.len())
        .map(|i| {
            if col[i].is_some() {
                return col[i];
            }
            // `present` is sorted; find the neighbours around `i`.
            let after = present.partition_point(|&p| p < i);
            let (Some(&lo), Some(&hi)) = (
                after.checked_sub(1).and_then(|j| present.get(j)),
                present.get(after),
            ) else {
                return Some(0.0);
            };
            let (v0, v1) = (col[lo].unwrap_or(0.0), col[hi].unwrap_or(0.0));
            let (p0, p1, p) = (positions[lo], positions[hi], positions[i]);
            let t = if (p1 - p0).is_finite() && p1 != p0 && p.is_finite() {
                (p - p0) / (p1 - p0)
            } else {
                (i - lo) as f64 / (hi - lo) as f64
            };
            Some(v0 + (v1 - v0) * t)
        })
        .collect()
}

/// Pivots long rows into a [`WideFrame`] with rows in `keys` order and columns in
/// `segments` order.
///
/// Rows whose key or segment is not listed are ignored. Duplicate key/segment pairs are
/// summed. `NaN` values count as absent before imputation.
pub fn pivot_wide<'a>(
    rows: impl IntoIterator<Item = LongRow<'a>>,
    keys: &[String],
    segments: &[String],
    imputation: ImputationType,
) -> WideFrame {
    let mut frame = WideFrame::new(keys.to_vec(), segments.to_vec());
    let row_of: HashMap<&str, usize> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect();
    let col_of: HashMap<&str, usize> = segments
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let mut seen_position = vec![false; keys.len()];
    let mut skipped = 0_usize;

    for row in rows {
        let (Some(&r), Some(&c)) = (row_of.get(row.key), col_of.get(row.segment)) else {
            skipped += 1;
            continue;
        };
        if !seen_position[r] && row.position.is_finite() {
            frame.positions[r] = row.position;
            seen_position[r] = true;
        }
        if row.value.is_nan() {
            continue;
        }
        let cell = &mut frame.data[c][r];
        *cell = Some(cell.unwrap_or(0.0) + row.value);
    }
    if skipped > 0 {
        tracing::debug!(skipped, "pivot ignored rows outside the key/segment domain");
    }

    frame.impute(imputation);
    frame
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| String::from(*s)).collect()
    }

    fn scenario_rows() -> Vec<LongRow<'static>> {
        vec![
            LongRow {
                key: "2020",
                position: 2020.0,
                segment: "A",
                value: 10.0,
            },
            LongRow {
                key: "2020",
                position: 2020.0,
                segment: "B",
                value: 5.0,
            },
            LongRow {
                key: "2021",
                position: 2021.0,
                segment: "A",
                value: f64::NAN,
            },
        ]
    }

    #[test]
    fn zero_imputation_fills_null_and_missing_cells() {
        let frame = pivot_wide(
            scenario_rows(),
            &strings(&["2020", "2021"]),
            &strings(&["A", "B"]),
            ImputationType::Zeros,
        );
        assert_eq!(frame.value("2020", "A"), Some(10.0));
        assert_eq!(frame.value("2021", "A"), Some(0.0));
        assert_eq!(frame.value("2021", "B"), Some(0.0));
    }

    #[test]
    fn no_imputation_leaves_gaps_absent() {
        let frame = pivot_wide(
            scenario_rows(),
            &strings(&["2020", "2021"]),
            &strings(&["A", "B"]),
            ImputationType::None,
        );
        assert_eq!(frame.value("2021", "A"), None);
        assert_eq!(frame.value("2021", "B"), None);
        assert_eq!(frame.row_total(1), 0.0);
    }

    #[test]
    fn linear_imputation_interpolates_by_position_and_zeroes_edges() {
        let rows = vec![
            LongRow {
                key: "t0",
                position: 0.0,
                segment: "A",
                value: 10.0,
            },
            LongRow {
                key: "t1",
                position: 1.0,
                segment: "B",
                value: 1.0,
            },
            LongRow {
                key: "t3",
                position: 3.0,
                segment: "A",
                value: 40.0,
            },
            LongRow {
                key: "t4",
                position: 4.0,
                segment: "B",
                value: 1.0,
            },
        ];
        let frame = pivot_wide(
            rows,
            &strings(&["t0", "t1", "t3", "t4"]),
            &strings(&["A", "B"]),
            ImputationType::Linear,
        );
        assert_eq!(frame.value("t1", "A"), Some(20.0));
        assert_eq!(frame.value("t4", "A"), Some(0.0));
        assert_eq!(frame.value("t0", "B"), Some(0.0));
        assert_eq!(frame.value("t3", "B"), Some(1.0));
    }

    #[test]
    fn normalized_rows_sum_to_one_and_original_is_kept() {
        let frame = pivot_wide(
            scenario_rows(),
            &strings(&["2020", "2021"]),
            &strings(&["A", "B"]),
            ImputationType::Zeros,
        );
        let normalized = frame.normalized();
        assert!((normalized.row_total(0) - 1.0).abs() < 1e-12);
        assert_eq!(normalized.row_total(1), 0.0);
        assert_eq!(frame.value("2020", "B"), Some(5.0));
    }
}
