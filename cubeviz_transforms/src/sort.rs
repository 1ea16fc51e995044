// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordering of categorical values.
//!
//! A [`Sorting`] configuration expands into a short list of [`SortKey`] comparators. Values
//! are compared key by key; the first non-equal key decides. Sorting is stable, so values
//! that tie on every key keep their input order.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use cubeviz_core::{Component, Sorting, SortingOrder, SortingType};
use hashbrown::{HashMap, HashSet};
use smallvec::{SmallVec, smallvec};

/// A single comparator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Explicit position from the dimension metadata; values without one go last.
    Position,
    /// Natural, case-insensitive order of labels.
    Label,
    /// Raw value order: numeric when both parse, lexicographic otherwise.
    Value,
    /// Precomputed measure total per value.
    Measure,
    /// Position in a user-given sequence; unseen values go last.
    CustomOrder,
    /// Table cell order: numeric when both parse, natural label order otherwise.
    TableType,
}

/// Comparators implied by a sorting type.
pub fn sorting_keys(sorting_type: SortingType, temporal: bool) -> SmallVec<[SortKey; 3]> {
    match sorting_type {
        SortingType::ByAuto => {
            let tail = if temporal {
                SortKey::Value
            } else {
                SortKey::Label
            };
            smallvec![SortKey::Position, tail]
        }
        SortingType::ByDimensionLabel => smallvec![SortKey::Label],
        SortingType::ByMeasure | SortingType::ByTotalSize => {
            smallvec![SortKey::Measure, SortKey::Label]
        }
        SortingType::ByCustomOrder => smallvec![SortKey::CustomOrder, SortKey::Label],
        SortingType::ByTableSortingType => smallvec![SortKey::TableType],
    }
}

/// Lookup data the comparators read.
#[derive(Clone, Debug, Default)]
pub struct SortContext {
    labels: HashMap<String, String>,
    positions: HashMap<String, f64>,
    totals: HashMap<String, f64>,
    temporal: bool,
}

impl SortContext {
    /// A context with no labels, positions or totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels and positions from a dimension's enumerated values.
    pub fn from_component(component: &Component) -> Self {
        let mut ctx = Self {
            temporal: component.kind.is_temporal(),
            ..Self::default()
        };
        for v in &component.values {
            ctx.labels.insert(v.value.clone(), v.label.clone());
            if let Some(p) = v.position {
                ctx.positions.insert(v.value.clone(), p);
            }
        }
        ctx
    }

    /// Sets measure totals per value.
    #[must_use]
    pub fn with_totals(mut self, totals: HashMap<String, f64>) -> Self {
        self.totals = totals;
        self
    }

    /// Overrides the label of a value.
    #[must_use]
    pub fn with_label(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(value.into(), label.into());
        self
    }

    /// Whether raw values are temporal.
    pub fn is_temporal(&self) -> bool {
        self.temporal
    }

    /// Label of a value, falling back to the value itself.
    pub fn label<'a>(&'a self, value: &'a str) -> &'a str {
        self.labels.get(value).map_or(value, String::as_str)
    }

    fn total(&self, value: &str) -> f64 {
        self.totals
            .get(value)
            .copied()
            .filter(|v| !v.is_nan())
            .unwrap_or(0.0)
    }
}

/// A configured comparator chain.
#[derive(Clone, Debug)]
pub struct CategorySorter<'a> {
    ctx: &'a SortContext,
    keys: SmallVec<[SortKey; 3]>,
    order: SortingOrder,
    custom: HashMap<&'a str, usize>,
}

impl<'a> CategorySorter<'a> {
    /// Builds the comparator chain for `sorting`; `None` behaves like ascending `ByAuto`.
    pub fn new(ctx: &'a SortContext, sorting: Option<&'a Sorting>) -> Self {
        let (sorting_type, order) =
            sorting.map_or((SortingType::ByAuto, SortingOrder::Asc), |s| {
                (s.sorting_type, s.sorting_order)
            });
        let custom: HashMap<&'a str, usize> = sorting
            .map(|s| {
                s.custom_order
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (v.as_str(), i))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            ctx,
            keys: sorting_keys(sorting_type, ctx.temporal),
            order,
            custom,
        }
    }

    /// Comparator keys in evaluation order.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Compares two raw values.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        for &key in &self.keys {
            let ord = self.compare_key(key, a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Applies the sorting order to a comparison.
    fn directed(&self, ord: Ordering) -> Ordering {
        match self.order {
            SortingOrder::Asc => ord,
            SortingOrder::Desc => ord.reverse(),
        }
    }

    /// Values without a rank go last in either order; ranked values follow the order.
    fn ranked<T>(&self, a: Option<T>, b: Option<T>, cmp: impl FnOnce(T, T) -> Ordering) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => self.directed(cmp(x, y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    fn compare_key(&self, key: SortKey, a: &str, b: &str) -> Ordering {
        match key {
            SortKey::Position => self.ranked(
                self.ctx.positions.get(a),
                self.ctx.positions.get(b),
                f64::total_cmp,
            ),
            SortKey::Label => self.directed(natural_cmp(self.ctx.label(a), self.ctx.label(b))),
            SortKey::Value => self.directed(match (parse_number(a), parse_number(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.cmp(b),
            }),
            SortKey::Measure => self.directed(self.ctx.total(a).total_cmp(&self.ctx.total(b))),
            SortKey::CustomOrder => {
                self.ranked(self.custom.get(a), self.custom.get(b), |x, y| x.cmp(y))
            }
            SortKey::TableType => self.directed(match (parse_number(a), parse_number(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => natural_cmp(self.ctx.label(a), self.ctx.label(b)),
            }),
        }
    }

    /// Sorts raw values in place (stable).
    pub fn sort(&self, values: &mut [String]) {
        values.sort_by(|a, b| self.compare(a, b));
    }

    /// Sorts arbitrary items by a raw-value key (stable).
    pub fn sort_by_key<T>(&self, items: &mut [T], key: impl Fn(&T) -> &str) {
        items.sort_by(|a, b| self.compare(key(a), key(b)));
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Natural order: case-insensitive, with digit runs compared by numeric value.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let da = take_digits(&mut ai);
                let db = take_digits(&mut bi);
                let ord = da.len().cmp(&db.len()).then_with(|| da.cmp(&db));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(ca), Some(cb)) => {
                let ord = ca.to_lowercase().cmp(cb.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits(it: &mut core::iter::Peekable<core::str::Chars<'_>>) -> String {
    let mut s = String::new();
    while let Some(&c) = it.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        if !(s.is_empty() && c == '0') {
            s.push(c);
        }
        it.next();
    }
    s
}

/// Distinct values in first-seen order.
pub fn unique_in_order<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String> + AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(String::from(v.as_ref())) {
            out.push(v.into());
        }
    }
    out
}

/// The subset of `all` present in `present`, in `all` order.
///
/// This is how the rendered `segments` are derived from the legend-stable `allSegments`.
pub fn present_in_order<'a>(
    all: &[String],
    present: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let present: HashSet<&str> = present.into_iter().collect();
    all.iter()
        .filter(|s| present.contains(s.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use cubeviz_core::{ComponentKind, DimensionValue};

    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| String::from(*s)).collect()
    }

    #[test]
    fn natural_order_compares_digit_runs_numerically() {
        let mut v = strings(&["item 10", "Item 2", "item 1", "apple"]);
        v.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(v, strings(&["apple", "item 1", "Item 2", "item 10"]));
    }

    #[test]
    fn auto_sorting_uses_positions_then_labels() {
        let component = Component::new("c", "C", ComponentKind::OrdinalDimension).with_values(
            vec![
                DimensionValue::new("low").with_position(0.0),
                DimensionValue::new("high").with_position(2.0),
                DimensionValue::new("mid").with_position(1.0),
                DimensionValue::new("b-unranked"),
                DimensionValue::new("a-unranked"),
            ],
        );
        let ctx = SortContext::from_component(&component);
        let sorter = CategorySorter::new(&ctx, None);
        let mut v = strings(&["b-unranked", "high", "a-unranked", "low", "mid"]);
        sorter.sort(&mut v);
        assert_eq!(
            v,
            strings(&["low", "mid", "high", "a-unranked", "b-unranked"])
        );
    }

    #[test]
    fn descending_auto_sorting_keeps_unranked_values_last() {
        let component = Component::new("c", "C", ComponentKind::OrdinalDimension).with_values(
            vec![
                DimensionValue::new("low").with_position(0.0),
                DimensionValue::new("high").with_position(2.0),
                DimensionValue::new("mid").with_position(1.0),
                DimensionValue::new("b-unranked"),
                DimensionValue::new("a-unranked"),
            ],
        );
        let ctx = SortContext::from_component(&component);
        let sorting = Sorting::new(SortingType::ByAuto, SortingOrder::Desc);
        let mut v = strings(&["a-unranked", "low", "b-unranked", "mid", "high"]);
        CategorySorter::new(&ctx, Some(&sorting)).sort(&mut v);
        assert_eq!(
            v,
            strings(&["high", "mid", "low", "b-unranked", "a-unranked"])
        );
    }

    #[test]
    fn descending_custom_order_keeps_unseen_values_last() {
        let ctx = SortContext::new();
        let mut sorting = Sorting::new(SortingType::ByCustomOrder, SortingOrder::Desc);
        sorting.custom_order = strings(&["z", "x"]);
        let mut v = strings(&["y", "x", "w", "z"]);
        CategorySorter::new(&ctx, Some(&sorting)).sort(&mut v);
        assert_eq!(v, strings(&["x", "z", "y", "w"]));
    }

    #[test]
    fn measure_sorting_reverses_exactly_with_order() {
        let totals: HashMap<String, f64> = [("a", 3.0), ("b", 1.0), ("c", 2.0), ("d", 5.0)]
            .into_iter()
            .map(|(k, v)| (String::from(k), v))
            .collect();
        let ctx = SortContext::new().with_totals(totals);
        let asc = Sorting::new(SortingType::ByMeasure, SortingOrder::Asc);
        let desc = Sorting::new(SortingType::ByMeasure, SortingOrder::Desc);

        let mut up = strings(&["a", "b", "c", "d"]);
        CategorySorter::new(&ctx, Some(&asc)).sort(&mut up);
        let mut down = strings(&["a", "b", "c", "d"]);
        CategorySorter::new(&ctx, Some(&desc)).sort(&mut down);

        assert_eq!(up, strings(&["b", "c", "a", "d"]));
        let mut reversed = up.clone();
        reversed.reverse();
        assert_eq!(down, reversed);
    }

    #[test]
    fn custom_order_puts_unseen_values_last() {
        let ctx = SortContext::new();
        let mut sorting = Sorting::new(SortingType::ByCustomOrder, SortingOrder::Asc);
        sorting.custom_order = strings(&["z", "x"]);
        let mut v = strings(&["y", "x", "w", "z"]);
        CategorySorter::new(&ctx, Some(&sorting)).sort(&mut v);
        assert_eq!(v, strings(&["z", "x", "w", "y"]));
    }

    #[test]
    fn table_sorting_is_numeric_aware() {
        let ctx = SortContext::new();
        let sorting = Sorting::new(SortingType::ByTableSortingType, SortingOrder::Asc);
        let mut v = strings(&["100", "20", "3"]);
        CategorySorter::new(&ctx, Some(&sorting)).sort(&mut v);
        assert_eq!(v, strings(&["3", "20", "100"]));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let ctx = SortContext::new();
        let sorting = Sorting::new(SortingType::ByMeasure, SortingOrder::Asc);
        let sorter = CategorySorter::new(&ctx, Some(&sorting));
        let mut items = vec![("same", 1), ("same", 2), ("same", 3)];
        sorter.sort_by_key(&mut items, |(k, _)| *k);
        assert_eq!(items.iter().map(|(_, i)| *i).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn present_segments_keep_all_segments_order() {
        let all = strings(&["c", "a", "b"]);
        let segments = present_in_order(&all, ["b", "c"]);
        assert_eq!(segments, strings(&["c", "b"]));
        assert!(segments.iter().all(|s| all.contains(s)));
    }
}
