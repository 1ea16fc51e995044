// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grouping for side-by-side (grouped) layouts and per-group totals.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

/// Members sharing an axis key.
#[derive(Clone, Debug, PartialEq)]
pub struct Group<T> {
    /// Axis key.
    pub key: String,
    /// Members, ordered by segment.
    pub members: Vec<T>,
}

/// Groups `items` by axis key, reindexed against `domain`.
///
/// Every domain value yields a group, even when no item falls into it; items whose key is
/// outside the domain are dropped. Within a group members follow `segment_order`, with
/// unknown segments last in input order.
pub fn group_by_key<T>(
    items: impl IntoIterator<Item = T>,
    domain: &[String],
    key: impl Fn(&T) -> Option<String>,
    segment: impl Fn(&T) -> Option<String>,
    segment_order: &[String],
) -> Vec<Group<T>> {
    let slot: HashMap<&str, usize> = domain
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect();
    let rank: HashMap<&str, usize> = segment_order
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let mut groups: Vec<Group<T>> = domain
        .iter()
        .map(|k| Group {
            key: k.clone(),
            members: Vec::new(),
        })
        .collect();
    for item in items {
        let Some(k) = key(&item) else {
            continue;
        };
        if let Some(&i) = slot.get(k.as_str()) {
            groups[i].members.push(item);
        }
    }
    for g in &mut groups {
        g.members.sort_by_key(|m| {
            segment(m)
                .and_then(|s| rank.get(s.as_str()).copied())
                .unwrap_or(usize::MAX)
        });
    }
    groups
}

/// Sums of finite values per key.
pub fn sums_by_key<T>(
    items: impl IntoIterator<Item = T>,
    key: impl Fn(&T) -> Option<String>,
    value: impl Fn(&T) -> f64,
) -> HashMap<String, f64> {
    let mut out: HashMap<String, f64> = HashMap::new();
    for item in items {
        let v = value(&item);
        let Some(k) = key(&item) else {
            continue;
        };
        let slot = out.entry(k).or_insert(0.0);
        if v.is_finite() {
            *slot += v;
        }
    }
    out
}

/// `value / total`, or `0.0` when the total is zero; `NaN` stays `NaN`.
pub fn percent_of(value: f64, total: f64) -> f64 {
    if value.is_nan() {
        f64::NAN
    } else if total == 0.0 || !total.is_finite() {
        0.0
    } else {
        value / total
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn s(v: &str) -> String {
        String::from(v)
    }

    #[test]
    fn groups_are_reindexed_against_the_full_domain() {
        let items = vec![("2021", "B", 1.0), ("2021", "A", 2.0), ("2023", "A", 3.0)];
        let domain = vec![s("2021"), s("2022"), s("2023")];
        let groups = group_by_key(
            items,
            &domain,
            |(k, _, _)| Some(s(k)),
            |(_, seg, _)| Some(s(seg)),
            &[s("A"), s("B")],
        );
        assert_eq!(groups.len(), 3);
        assert!(groups[1].members.is_empty());
        let segs: Vec<&str> = groups[0].members.iter().map(|m| m.1).collect();
        assert_eq!(segs, ["A", "B"]);
    }

    #[test]
    fn sums_skip_non_finite_values() {
        let items = vec![("a", 1.0), ("a", f64::NAN), ("b", 2.0), ("a", 4.0)];
        let sums = sums_by_key(items, |(k, _)| Some(s(k)), |(_, v)| *v);
        assert_eq!(sums.get("a"), Some(&5.0));
        assert_eq!(sums.get("b"), Some(&2.0));
    }

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(percent_of(3.0, 0.0), 0.0);
        assert!(percent_of(f64::NAN, 2.0).is_nan());
        assert_eq!(percent_of(1.0, 4.0), 0.25);
    }
}
