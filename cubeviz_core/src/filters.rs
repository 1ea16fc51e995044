// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interactive filter state and the per-chart store registry used by dashboards.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Absolute or percent-of-total display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Calculation {
    /// Raw values.
    #[default]
    Identity,
    /// Each value divided by the total of its axis position.
    Percent,
}

/// A brushed time interval, in seconds since the epoch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive start.
    pub from: f64,
    /// Inclusive end.
    pub to: f64,
}

impl TimeRange {
    /// Whether `t` lies within the range.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.from.min(self.to) && t <= self.from.max(self.to)
    }
}

/// Current values of a chart's interactive filters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractiveFiltersState {
    /// Legend visibility per segment value; absent means visible.
    pub legend: BTreeMap<String, bool>,
    /// Brushed time range.
    pub time_range: Option<TimeRange>,
    /// Absolute/percent switch.
    pub calculation: Calculation,
    /// Selected value per filterable dimension.
    pub data_filters: BTreeMap<String, String>,
}

impl InteractiveFiltersState {
    /// Whether a segment is currently shown.
    pub fn is_visible(&self, segment: &str) -> bool {
        self.legend.get(segment).copied().unwrap_or(true)
    }

    /// Flips the visibility of a segment.
    pub fn toggle_legend(&mut self, segment: &str) {
        let visible = self.is_visible(segment);
        self.legend.insert(segment.into(), !visible);
    }
}

/// One chart's filter state plus a change counter.
#[derive(Clone, Debug, Default)]
pub struct FilterStore {
    state: InteractiveFiltersState,
    version: u64,
}

impl FilterStore {
    /// Current state.
    pub fn state(&self) -> &InteractiveFiltersState {
        &self.state
    }

    /// Incremented on every update.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn update(&mut self, f: impl FnOnce(&mut InteractiveFiltersState)) {
        f(&mut self.state);
        self.version += 1;
    }
}

/// Filter stores keyed by chart.
///
/// A single chart updates its own store with [`FilterStoreRegistry::update_one`]. Dashboard
/// wide filters (shared time range, shared data filters) go through
/// [`FilterStoreRegistry::update_all`], which applies the same change to every registered
/// chart.
#[derive(Clone, Debug, Default)]
pub struct FilterStoreRegistry {
    stores: HashMap<String, FilterStore>,
}

impl FilterStoreRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a chart; an existing store is kept.
    pub fn register(&mut self, key: impl Into<String>) -> &FilterStore {
        self.stores.entry(key.into()).or_default()
    }

    /// Drops a chart's store.
    pub fn remove(&mut self, key: &str) -> Option<FilterStore> {
        self.stores.remove(key)
    }

    /// Borrow a store.
    pub fn store(&self, key: &str) -> Option<&FilterStore> {
        self.stores.get(key)
    }

    /// Snapshot of a chart's state, safe to hand to a derivation pass.
    pub fn snapshot(&self, key: &str) -> Option<InteractiveFiltersState> {
        self.stores.get(key).map(|s| s.state.clone())
    }

    /// Updates one chart. Returns `false` when the key is not registered.
    pub fn update_one(&mut self, key: &str, f: impl FnOnce(&mut InteractiveFiltersState)) -> bool {
        match self.stores.get_mut(key) {
            Some(store) => {
                store.update(f);
                true
            }
            None => {
                tracing::warn!(key, "filter update for unregistered chart");
                false
            }
        }
    }

    /// Applies the same update to every registered chart.
    pub fn update_all(&mut self, f: impl Fn(&mut InteractiveFiltersState)) {
        for store in self.stores.values_mut() {
            store.update(&f);
        }
    }

    /// Registered chart keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn update_one_touches_only_its_chart() {
        let mut registry = FilterStoreRegistry::new();
        registry.register("a");
        registry.register("b");
        assert!(registry.update_one("a", |s| s.toggle_legend("X")));
        assert!(!registry.snapshot("a").unwrap().is_visible("X"));
        assert!(registry.snapshot("b").unwrap().is_visible("X"));
        assert_eq!(registry.store("b").unwrap().version(), 0);
        assert!(!registry.update_one("missing", |_| {}));
    }

    #[test]
    fn update_all_broadcasts_dashboard_filters() {
        let mut registry = FilterStoreRegistry::new();
        for key in ["a", "b", "c"] {
            registry.register(key);
        }
        registry.update_all(|s| {
            s.time_range = Some(TimeRange {
                from: 0.0,
                to: 10.0,
            });
        });
        for key in registry.keys() {
            let store = registry.store(key).unwrap();
            assert_eq!(store.version(), 1);
            assert!(store.state().time_range.unwrap().contains(5.0));
        }
    }

    #[test]
    fn snapshots_are_detached_from_later_updates() {
        let mut registry = FilterStoreRegistry::new();
        registry.register("a");
        let before = registry.snapshot("a").unwrap();
        registry.update_one("a", |s| s.calculation = Calculation::Percent);
        assert_eq!(before.calculation, Calculation::Identity);
        assert_eq!(
            registry.snapshot("a").unwrap().calculation,
            Calculation::Percent
        );
    }
}
