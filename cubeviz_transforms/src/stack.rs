// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stack layouts over a [`WideFrame`].

use alloc::string::String;
use alloc::vec::Vec;

use cubeviz_core::{Sorting, SortingOrder, SortingType};

use crate::pivot::WideFrame;

/// Order in which segments are stacked from the baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackOrder {
    /// Segment order.
    None,
    /// Reverse segment order, so the top of the stack matches the top of the legend.
    Reverse,
    /// Smallest series total at the baseline.
    Ascending,
    /// Largest series total at the baseline.
    Descending,
}

impl StackOrder {
    /// Order implied by a segment sorting: by-total-size sorting stacks by size, everything
    /// else stacks in reverse segment order.
    pub fn from_sorting(sorting: Option<&Sorting>) -> Self {
        match sorting {
            Some(s) if s.sorting_type == SortingType::ByTotalSize => match s.sorting_order {
                SortingOrder::Asc => Self::Ascending,
                SortingOrder::Desc => Self::Descending,
            },
            _ => Self::Reverse,
        }
    }
}

/// Stack baseline offset mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackOffset {
    /// Every segment starts where the previous one ended, signs included.
    Zero,
    /// Positive values stack up from 0, negative values stack down from 0; zero-height
    /// segments sit at 0.
    Diverging,
    /// Like [`StackOffset::Diverging`] but zero-height segments sit on top of the positive
    /// stack, so labels and hover targets do not collapse onto the axis.
    DivergingPositiveZeros,
    /// Zero offset scaled so every row spans `[0, 1]`.
    Normalize,
}

/// One stacked cell. `y1 - y0` is always the signed cell value (absent cells have zero
/// height).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StackPoint {
    /// Baseline side.
    pub y0: f64,
    /// Value side.
    pub y1: f64,
    /// Cell before stacking (after normalization for [`StackOffset::Normalize`]).
    pub value: Option<f64>,
}

impl StackPoint {
    /// Lower edge.
    pub fn min(&self) -> f64 {
        self.y0.min(self.y1)
    }

    /// Upper edge.
    pub fn max(&self) -> f64 {
        self.y0.max(self.y1)
    }
}

/// One stacked segment.
#[derive(Clone, Debug, PartialEq)]
pub struct StackSeries {
    /// Segment value.
    pub segment: String,
    /// Column index in the source frame.
    pub index: usize,
    /// Position from the baseline (0 = first stacked).
    pub stack_index: usize,
    /// Points aligned to the frame rows.
    pub points: Vec<StackPoint>,
}

/// Column indices in stacking order.
pub fn stack_order(frame: &WideFrame, order: StackOrder) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..frame.segments.len()).collect();
    match order {
        StackOrder::None => {}
        StackOrder::Reverse => idx.reverse(),
        StackOrder::Ascending | StackOrder::Descending => {
            let sums: Vec<f64> = (0..frame.segments.len())
                .map(|s| {
                    (0..frame.row_count())
                        .filter_map(|r| frame.get(r, s))
                        .sum()
                })
                .collect();
            idx.sort_by(|&a, &b| sums[a].total_cmp(&sums[b]));
            if order == StackOrder::Descending {
                idx.reverse();
            }
        }
    }
    idx
}

/// Computes a stack layout; series are returned in frame column order.
pub fn stack(frame: &WideFrame, order: StackOrder, offset: StackOffset) -> Vec<StackSeries> {
    let order_idx = stack_order(frame, order);
    let rows = frame.row_count();
    let mut series: Vec<StackSeries> = frame
        .segments
        .iter()
        .enumerate()
        .map(|(index, segment)| StackSeries {
            segment: segment.clone(),
            index,
            stack_index: order_idx.iter().position(|&i| i == index).unwrap_or(index),
            points: Vec::with_capacity(rows),
        })
        .collect();

    for row in 0..rows {
        let total = frame.row_total(row);
        let (mut top, mut pos, mut neg) = (0.0_f64, 0.0_f64, 0.0_f64);
        let mut points = alloc::vec![
            StackPoint {
                y0: 0.0,
                y1: 0.0,
                value: None,
            };
            series.len()
        ];
        for &s in &order_idx {
            let value = frame.get(row, s);
            let dy = value.unwrap_or(0.0);
            let (y0, y1) = match offset {
                StackOffset::Zero | StackOffset::Normalize => {
                    let y0 = top;
                    top += dy;
                    (y0, top)
                }
                StackOffset::Diverging => {
                    if dy > 0.0 {
                        let y0 = pos;
                        pos += dy;
                        (y0, pos)
                    } else if dy < 0.0 {
                        let y0 = neg;
                        neg += dy;
                        (y0, neg)
                    } else {
                        (0.0, 0.0)
                    }
                }
                StackOffset::DivergingPositiveZeros => {
                    if dy >= 0.0 {
                        let y0 = pos;
                        pos += dy;
                        (y0, pos)
                    } else {
                        let y0 = neg;
                        neg += dy;
                        (y0, neg)
                    }
                }
            };
            points[s] = if offset == StackOffset::Normalize && total != 0.0 {
                StackPoint {
                    y0: y0 / total,
                    y1: y1 / total,
                    value: value.map(|v| v / total),
                }
            } else {
                StackPoint { y0, y1, value }
            };
        }
        for (s, p) in points.into_iter().enumerate() {
            series[s].points.push(p);
        }
    }
    series
}

/// `(min, max)` over all stacked edges, or `None` for an empty layout.
pub fn stack_extent(series: &[StackSeries]) -> Option<(f64, f64)> {
    let mut it = series.iter().flat_map(|s| s.points.iter());
    let first = it.next()?;
    Some(it.fold((first.min(), first.max()), |(lo, hi), p| {
        (lo.min(p.min()), hi.max(p.max()))
    }))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn frame(rows: &[&[Option<f64>]]) -> WideFrame {
        let segments: Vec<String> = (0..rows[0].len()).map(|i| alloc::format!("s{i}")).collect();
        let keys: Vec<String> = (0..rows.len()).map(|i| alloc::format!("k{i}")).collect();
        let mut f = WideFrame::new(keys, segments);
        for (r, row) in rows.iter().enumerate() {
            for (s, v) in row.iter().enumerate() {
                f.data[s][r] = *v;
            }
        }
        f
    }

    #[test]
    fn stacked_heights_reconstruct_raw_values() {
        let f = frame(&[
            &[Some(3.0), Some(-2.0), None],
            &[Some(0.0), Some(4.0), Some(-1.5)],
        ]);
        for offset in [
            StackOffset::Zero,
            StackOffset::Diverging,
            StackOffset::DivergingPositiveZeros,
        ] {
            let series = stack(&f, StackOrder::Reverse, offset);
            for row in 0..f.row_count() {
                for s in &series {
                    let raw = f.get(row, s.index).unwrap_or(0.0);
                    let p = s.points[row];
                    assert!((p.y1 - p.y0 - raw).abs() < 1e-12, "{offset:?} row {row}");
                }
                let stacked: f64 = series.iter().map(|s| s.points[row].y1 - s.points[row].y0).sum();
                assert!((stacked - f.row_total(row)).abs() < 1e-12, "{offset:?}");
            }
        }
    }

    #[test]
    fn diverging_places_negatives_below_zero() {
        let f = frame(&[&[Some(3.0), Some(-2.0), Some(1.0), Some(-1.0)]]);
        let series = stack(&f, StackOrder::None, StackOffset::Diverging);
        assert_eq!((series[0].points[0].y0, series[0].points[0].y1), (0.0, 3.0));
        assert_eq!((series[1].points[0].y0, series[1].points[0].y1), (0.0, -2.0));
        assert_eq!((series[2].points[0].y0, series[2].points[0].y1), (3.0, 4.0));
        assert_eq!((series[3].points[0].y0, series[3].points[0].y1), (-2.0, -3.0));
        assert_eq!(stack_extent(&series), Some((-3.0, 4.0)));
    }

    #[test]
    fn positive_zeros_sit_on_top_of_the_positive_stack() {
        let f = frame(&[&[Some(2.0), Some(0.0)]]);
        let plain = stack(&f, StackOrder::None, StackOffset::Diverging);
        let lifted = stack(&f, StackOrder::None, StackOffset::DivergingPositiveZeros);
        assert_eq!(plain[1].points[0].y0, 0.0);
        assert_eq!(lifted[1].points[0].y0, 2.0);
        assert_eq!(lifted[1].points[0].y1, 2.0);
    }

    #[test]
    fn normalize_rows_span_unit_interval() {
        let f = frame(&[&[Some(1.0), Some(3.0)], &[Some(2.0), Some(2.0)]]);
        let series = stack(&f, StackOrder::None, StackOffset::Normalize);
        for row in 0..2 {
            let top = series.iter().map(|s| s.points[row].max()).fold(0.0, f64::max);
            assert!((top - 1.0).abs() < 1e-12);
            let sum: f64 = series.iter().filter_map(|s| s.points[row].value).sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn total_size_sorting_orders_stack_by_series_sum() {
        let f = frame(&[&[Some(5.0), Some(1.0), Some(3.0)]]);
        let desc = Sorting::new(SortingType::ByTotalSize, SortingOrder::Desc);
        let asc = Sorting::new(SortingType::ByTotalSize, SortingOrder::Asc);
        assert_eq!(stack_order(&f, StackOrder::from_sorting(Some(&asc))), vec![1, 2, 0]);
        assert_eq!(stack_order(&f, StackOrder::from_sorting(Some(&desc))), vec![0, 2, 1]);
        assert_eq!(stack_order(&f, StackOrder::from_sorting(None)), vec![2, 1, 0]);
        let series = stack(&f, StackOrder::Ascending, StackOffset::Zero);
        assert_eq!(series[1].stack_index, 0);
        assert_eq!(series[0].points[0].y0, 4.0);
    }
}
