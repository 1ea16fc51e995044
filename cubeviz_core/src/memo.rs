// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content-keyed memoization of derived values.
//!
//! A derivation declares its inputs by feeding them into a [`Fingerprint`]. [`Memo`] reruns
//! the derivation only when the fingerprint differs from the previous call; otherwise it hands
//! back the same [`Arc`], so callers can compare results with [`Arc::ptr_eq`].

use alloc::sync::Arc;
use core::fmt;
use core::hash::{BuildHasher, Hasher};

use hashbrown::DefaultHashBuilder;

use crate::observation::{Observation, ObservationValue};

/// Incremental hash of derivation inputs.
pub struct Fingerprint {
    hasher: <DefaultHashBuilder as BuildHasher>::Hasher,
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fingerprint")
            .field("value", &self.finish())
            .finish()
    }
}

impl Fingerprint {
    /// Feeds a float by bit pattern; all `NaN`s hash alike.
    pub fn f64(&mut self, v: f64) -> &mut Self {
        let bits = if v.is_nan() { f64::NAN.to_bits() } else { v.to_bits() };
        self.hasher.write_u64(bits);
        self
    }

    /// Feeds a string, length-prefixed.
    pub fn str(&mut self, s: &str) -> &mut Self {
        self.hasher.write_usize(s.len());
        self.hasher.write(s.as_bytes());
        self
    }

    /// Feeds an integer.
    pub fn usize(&mut self, v: usize) -> &mut Self {
        self.hasher.write_usize(v);
        self
    }

    /// Feeds a counter or version.
    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.hasher.write_u64(v);
        self
    }

    /// Feeds a flag.
    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.hasher.write_u8(u8::from(v));
        self
    }

    /// Feeds one observation.
    pub fn observation(&mut self, o: &Observation) -> &mut Self {
        for (id, value) in o.iter() {
            self.str(id);
            match value {
                ObservationValue::Null => self.usize(0),
                ObservationValue::Number(v) => self.usize(1).f64(*v),
                ObservationValue::Text(s) => self.usize(2).str(s),
                ObservationValue::Date(v) => self.usize(3).f64(*v),
            };
        }
        self.usize(usize::MAX)
    }

    /// Feeds a dataset.
    pub fn observations(&mut self, data: &[Observation]) -> &mut Self {
        self.usize(data.len());
        for o in data {
            self.observation(o);
        }
        self
    }

    /// Feeds the `Debug` rendering of a value.
    ///
    /// Configuration and metadata types contain floats and maps, so they are fingerprinted
    /// through their `Debug` output rather than `Hash`.
    pub fn debug(&mut self, value: &impl fmt::Debug) -> &mut Self {
        let mut w = HashWriter(&mut self.hasher);
        // Writing into a hasher cannot fail.
        let _ = fmt::write(&mut w, format_args!("{value:?}"));
        self.hasher.write_u8(0xff);
        self
    }

    /// The fingerprint value.
    pub fn finish(&self) -> u64 {
        self.hasher.finish()
    }
}

struct HashWriter<'a, H>(&'a mut H);

impl<H: Hasher> fmt::Write for HashWriter<'_, H> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write(s.as_bytes());
        Ok(())
    }
}

/// Single-slot cache of the last derived value.
pub struct Memo<V> {
    build: DefaultHashBuilder,
    last: Option<(u64, Arc<V>)>,
    derivations: u64,
}

impl<V> fmt::Debug for Memo<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("key", &self.last.as_ref().map(|(k, _)| *k))
            .field("derivations", &self.derivations)
            .finish_non_exhaustive()
    }
}

impl<V> Default for Memo<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Memo<V> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            build: DefaultHashBuilder::default(),
            last: None,
            derivations: 0,
        }
    }

    /// Starts a fingerprint compatible with this cache.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            hasher: self.build.build_hasher(),
        }
    }

    /// Returns the cached value for `key`, deriving it if the key changed.
    pub fn get_or_derive(&mut self, key: u64, derive: impl FnOnce() -> V) -> Arc<V> {
        match self.try_get_or_derive(key, || Ok::<V, core::convert::Infallible>(derive())) {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`Memo::get_or_derive`]; errors are not cached.
    pub fn try_get_or_derive<E>(
        &mut self,
        key: u64,
        derive: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some((last_key, value)) = &self.last
            && *last_key == key
        {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(derive()?);
        self.derivations += 1;
        tracing::debug!(key, derivations = self.derivations, "memo recomputed");
        self.last = Some((key, Arc::clone(&value)));
        Ok(value)
    }

    /// Number of times the derivation actually ran.
    pub fn derivations(&self) -> u64 {
        self.derivations
    }

    /// Forgets the cached value.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn key(memo: &Memo<f64>, data: &[Observation], width: f64) -> u64 {
        let mut fp = memo.fingerprint();
        fp.observations(data).f64(width);
        fp.finish()
    }

    #[test]
    fn unchanged_inputs_reuse_identity() {
        let data = vec![Observation::new().with("v", 1.0)];
        let mut memo = Memo::new();
        let k = key(&memo, &data, 600.0);
        let a = memo.get_or_derive(k, || 1.0);
        let k = key(&memo, &data, 600.0);
        let b = memo.get_or_derive(k, || 2.0);
        assert!(Arc::ptr_eq(&a, &b), "same inputs must reuse the value");
        assert_eq!(memo.derivations(), 1);
    }

    #[test]
    fn any_changed_input_recomputes() {
        let data = vec![Observation::new().with("v", 1.0)];
        let changed = vec![Observation::new().with("v", 2.0)];
        let mut memo = Memo::new();
        let a = memo.get_or_derive(key(&memo, &data, 600.0), || 1.0);
        let b = memo.get_or_derive(key(&memo, &changed, 600.0), || 2.0);
        let c = memo.get_or_derive(key(&memo, &changed, 300.0), || 3.0);
        assert!(!Arc::ptr_eq(&a, &b), "data change must recompute");
        assert_eq!((*b, *c), (2.0, 3.0));
        assert_eq!(memo.derivations(), 3);
    }

    #[test]
    fn errors_are_not_cached() {
        let mut memo: Memo<f64> = Memo::new();
        let k = memo.fingerprint().str("a").finish();
        assert!(memo.try_get_or_derive(k, || Err("boom")).is_err());
        assert_eq!(*memo.try_get_or_derive(k, || Ok::<_, &str>(4.0)).unwrap(), 4.0);
    }

    #[test]
    fn debug_fingerprint_tracks_config_changes() {
        let memo: Memo<()> = Memo::new();
        let a = memo.fingerprint().debug(&crate::Sorting::default()).finish();
        let b = memo
            .fingerprint()
            .debug(&crate::Sorting::new(
                crate::SortingType::ByMeasure,
                crate::SortingOrder::Desc,
            ))
            .finish();
        assert_ne!(a, b);
    }
}
