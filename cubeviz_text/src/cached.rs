// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::sync::Arc;
use core::cell::{Cell, RefCell};

use hashbrown::HashMap;

use crate::{FontWeight, TextMeasurer, TextMetrics, TextStyle};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Key {
    text: String,
    size: u64,
    weight: FontWeight,
    family: Arc<str>,
}

/// Memoizes another measurer.
///
/// Interior mutability keeps the [`TextMeasurer`] signature `&self`; the cache is not shared
/// across threads.
#[derive(Debug)]
pub struct CachedTextMeasurer<M> {
    inner: M,
    cache: RefCell<HashMap<Key, TextMetrics>>,
    generation: Cell<u64>,
}

impl<M: TextMeasurer> CachedTextMeasurer<M> {
    /// Wraps `inner`.
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
            generation: Cell::new(0),
        }
    }

    /// Number of distinct measurements held.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// `true` when nothing has been measured yet.
    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// Drops all cached measurements, e.g. after web fonts finished loading.
    ///
    /// Bumps [`TextMeasurer::revision`] so cached chart states are derived again.
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
        self.generation.set(self.generation.get().wrapping_add(1));
    }
}

impl<M: TextMeasurer> TextMeasurer for CachedTextMeasurer<M> {
    fn revision(&self) -> u64 {
        self.generation.get().wrapping_add(self.inner.revision())
    }

    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let key = Key {
            text: text.into(),
            size: style.size.to_bits(),
            weight: style.weight,
            family: style.family.clone(),
        };
        if let Some(m) = self.cache.borrow().get(&key) {
            return *m;
        }
        let m = self.inner.measure(text, style);
        self.cache.borrow_mut().insert(key, m);
        m
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::cell::Cell;

    use super::*;
    use crate::HeuristicTextMeasurer;

    struct Counting<'a>(&'a Cell<usize>);

    impl TextMeasurer for Counting<'_> {
        fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
            self.0.set(self.0.get() + 1);
            HeuristicTextMeasurer.measure(text, style)
        }
    }

    #[test]
    fn repeated_labels_hit_the_cache() {
        let calls = Cell::new(0);
        let measurer = CachedTextMeasurer::new(Counting(&calls));
        let style = TextStyle::new(12.0);
        let a = measurer.measure("2020", &style);
        let b = measurer.measure("2020", &style);
        assert_eq!(a, b);
        assert_eq!(calls.get(), 1);
        measurer.measure("2020", &TextStyle::new(14.0));
        assert_eq!(calls.get(), 2);
        assert_eq!(measurer.len(), 2);
    }

    #[test]
    fn clearing_bumps_the_revision() {
        let measurer = CachedTextMeasurer::new(HeuristicTextMeasurer);
        let style = TextStyle::new(12.0);
        measurer.measure("2020", &style);
        let before = measurer.revision();
        measurer.clear();
        assert!(measurer.is_empty(), "cleared");
        assert_ne!(measurer.revision(), before, "fonts may have changed");
    }
}
