// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional scales.
//!
//! Every scale is built in two explicit steps. A `*Spec` holds the domain and options and is
//! all that margin estimation needs (tick labels come from its domain). Once margins
//! and bounds are known, `instantiate(range)` returns an immutable scale. Nothing is
//! mutated after construction, so the domain-then-range order cannot be violated by
//! aliasing.

use alloc::string::String;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
#[allow(unused_imports, reason = "toolchains with these methods in `core` resolve them inherently")]
use crate::float::FloatExt;

use hashbrown::HashMap;

use crate::time;

/// Domain used when no finite value is available.
pub const DEFAULT_DOMAIN: (f64, f64) = (0.0, 100.0);

/// A linear mapping from a continuous domain to a continuous range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLinear {
    domain: (f64, f64),
    range: (f64, f64),
}

/// Specification for a linear scale (domain + options, no range yet).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLinearSpec {
    /// Domain in data units.
    pub domain: (f64, f64),
    /// Whether to extend the domain to tick boundaries.
    pub nice: bool,
}

impl ScaleLinear {
    /// Creates a new scale mapping `domain` values to `range` values.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Maps a value from domain space into range space.
    pub fn map(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = d1 - d0;
        if denom == 0.0 {
            return r0;
        }
        let t = (x - d0) / denom;
        r0 + t * (r1 - r0)
    }

    /// Maps a range value back into the domain.
    pub fn invert(&self, y: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = r1 - r0;
        if denom == 0.0 {
            return d0;
        }
        d0 + (y - r0) / denom * (d1 - d0)
    }

    /// Domain as `(start, end)`.
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Range as `(start, end)`.
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Returns “nice-ish” tick values inside the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = ordered(self.domain);
        let eps = (hi - lo).abs() * 1e-9;
        nice_ticks(lo, hi, count)
            .into_iter()
            .filter(|t| *t >= lo - eps && *t <= hi + eps)
            .collect()
    }

    /// Distance between consecutive ticks for `count`.
    pub fn tick_step(&self, count: usize) -> f64 {
        let (lo, hi) = ordered(self.domain);
        nice_step((hi - lo) / count.max(1) as f64)
    }
}

impl ScaleLinearSpec {
    /// Creates a new linear scale spec.
    pub fn new(domain: (f64, f64)) -> Self {
        Self {
            domain,
            nice: false,
        }
    }

    /// Enables or disables nice-domain behavior.
    pub fn with_nice(mut self, nice: bool) -> Self {
        self.nice = nice;
        self
    }

    /// Returns the effective domain after applying `nice` (if enabled).
    pub fn resolved_domain(&self, tick_count: usize) -> (f64, f64) {
        if !self.nice {
            return self.domain;
        }
        let ticks = nice_ticks(self.domain.0, self.domain.1, tick_count);
        match (ticks.first(), ticks.last()) {
            (Some(&first), Some(&last)) if ticks.len() >= 2 => (first, last),
            _ => self.domain,
        }
    }

    /// Tick values of the resolved domain, for margin estimation before a range exists.
    pub fn ticks(&self, tick_count: usize) -> Vec<f64> {
        ScaleLinear::new(self.resolved_domain(tick_count), (0.0, 1.0)).ticks(tick_count)
    }

    /// Instantiates a concrete scale using the `resolved_domain` (respecting `nice`).
    pub fn instantiate(&self, range: (f64, f64), tick_count: usize) -> ScaleLinear {
        ScaleLinear::new(self.resolved_domain(tick_count), range)
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

pub(crate) fn nice_ticks(mut min: f64, mut max: f64, count: usize) -> Vec<f64> {
    if count == 0 || !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    if min == max {
        return alloc::vec![min];
    }
    if min > max {
        core::mem::swap(&mut min, &mut max);
    }
    let span = max - min;
    let step0 = span / count.max(1) as f64;
    let step = nice_step(step0);
    if step == 0.0 {
        return alloc::vec![min, max];
    }

    let start = (min / step).floor() * step;
    let stop = (max / step).ceil() * step;

    let n_f = ((stop - start) / step).round();
    let n = if n_f.is_finite() && n_f >= 0.0 {
        let n_f = n_f.min(10_000.0);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "guarded by finite/non-negative checks and capped at 10k"
        )]
        {
            n_f as u64
        }
    } else {
        0
    };
    // Multiplying the index keeps ticks like 0.3 free of accumulated error.
    (0..=n)
        .map(|i| clean_zero(start + step * i as f64))
        .collect()
}

fn clean_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn nice_step(step: f64) -> f64 {
    if !step.is_finite() || step <= 0.0 {
        return 0.0;
    }
    let power = step.log10().floor();
    #[allow(
        clippy::cast_possible_truncation,
        reason = "finite log10 of a positive f64 is within ±324"
    )]
    let base = 10_f64.powi(power as i32);
    let error = step / base;
    let nice = if error >= 7.5 {
        10.0
    } else if error >= 3.5 {
        5.0
    } else if error >= 1.5 {
        2.0
    } else {
        1.0
    };
    nice * base
}

/// Options for [`numeric_domain`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DomainOptions<'a> {
    /// Extend the domain to include zero.
    pub floor_zero: bool,
    /// User-fixed domain; wins over data when finite.
    pub custom: Option<[f64; 2]>,
    /// Extra values that must be inside the domain (limits).
    pub include: &'a [f64],
}

/// `[min, max]` over the finite `values`, adjusted by `options`.
///
/// Empty or all-`NaN` input resolves to [`DEFAULT_DOMAIN`]. A single distinct value is
/// widened by one unit on each side.
pub fn numeric_domain(values: impl IntoIterator<Item = f64>, options: &DomainOptions<'_>) -> (f64, f64) {
    if let Some([a, b]) = options.custom
        && a.is_finite()
        && b.is_finite()
        && a != b
    {
        return ordered((a, b));
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.into_iter().chain(options.include.iter().copied()) {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        tracing::debug!("no finite values; using the default domain");
        return DEFAULT_DOMAIN;
    }
    if options.floor_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if lo == hi {
        return (lo - 1.0, hi + 1.0);
    }
    (lo, hi)
}

/// A time scale: a linear scale over seconds since the epoch with calendar ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleTime {
    inner: ScaleLinear,
}

/// Specification for a time scale (domain, no range yet).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleTimeSpec {
    /// Domain in seconds since the epoch.
    pub domain: (f64, f64),
}

impl ScaleTime {
    /// Creates a new time scale.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            inner: ScaleLinear::new(domain, range),
        }
    }

    /// Maps a timestamp into range space.
    pub fn map(&self, t: f64) -> f64 {
        self.inner.map(t)
    }

    /// Maps a range value back to a timestamp.
    pub fn invert(&self, x: f64) -> f64 {
        self.inner.invert(x)
    }

    /// Calendar-aligned ticks inside the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (a, b) = self.inner.domain();
        time::nice_time_ticks(a, b, count)
    }

    /// Domain as `(start, end)`.
    pub fn domain(&self) -> (f64, f64) {
        self.inner.domain()
    }

    /// Range as `(start, end)`.
    pub fn range(&self) -> (f64, f64) {
        self.inner.range()
    }
}

impl ScaleTimeSpec {
    /// Creates a new time scale spec.
    pub fn new(domain: (f64, f64)) -> Self {
        Self { domain }
    }

    /// Instantiates a concrete scale for a given output range.
    pub fn instantiate(&self, range: (f64, f64)) -> ScaleTime {
        ScaleTime::new(self.domain, range)
    }
}

/// A discrete band scale over ordered categorical keys.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleBand {
    domain: Vec<String>,
    index: HashMap<String, usize>,
    start: f64,
    step: f64,
    bandwidth: f64,
}

/// Specification for a band scale (ordered domain + padding, no range yet).
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleBandSpec {
    /// Ordered keys.
    pub domain: Vec<String>,
    /// Inner padding as a fraction of the step.
    pub padding_inner: f64,
    /// Outer padding as a fraction of the step.
    pub padding_outer: f64,
    /// Where leftover space goes: 0 start, 0.5 centered, 1 end.
    pub align: f64,
}

impl ScaleBandSpec {
    /// Creates a band scale spec with no padding.
    pub fn new(domain: Vec<String>) -> Self {
        Self {
            domain,
            padding_inner: 0.0,
            padding_outer: 0.0,
            align: 0.5,
        }
    }

    /// Sets inner and outer padding in step units.
    pub fn with_padding(mut self, inner: f64, outer: f64) -> Self {
        self.padding_inner = inner.clamp(0.0, 1.0);
        self.padding_outer = outer.max(0.0);
        self
    }

    /// Instantiates a concrete scale for a given output range.
    pub fn instantiate(&self, range: (f64, f64)) -> ScaleBand {
        let (r0, r1) = ordered(range);
        let n = self.domain.len() as f64;
        let step = (r1 - r0) / (n - self.padding_inner + 2.0 * self.padding_outer).max(1.0);
        let start = r0 + (r1 - r0 - step * (n - self.padding_inner)) * self.align;
        let index = self
            .domain
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        ScaleBand {
            domain: self.domain.clone(),
            index,
            start,
            step,
            bandwidth: step * (1.0 - self.padding_inner),
        }
    }
}

impl ScaleBand {
    /// Ordered keys.
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// Start of the band for `key`.
    pub fn position(&self, key: &str) -> Option<f64> {
        self.index
            .get(key)
            .map(|&i| self.start + self.step * i as f64)
    }

    /// Center of the band for `key`.
    pub fn center(&self, key: &str) -> Option<f64> {
        self.position(key).map(|p| p + 0.5 * self.bandwidth)
    }

    /// Width of a band.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Distance between band starts.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// The key whose step contains `px`, clamped to the first/last band.
    pub fn invert(&self, px: f64) -> Option<&str> {
        if self.domain.is_empty() || self.step <= 0.0 {
            return self.domain.first().map(String::as_str);
        }
        let i = ((px - self.start) / self.step).floor().max(0.0);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "non-negative and clamped to the domain length below"
        )]
        let i = (i as usize).min(self.domain.len() - 1);
        self.domain.get(i).map(String::as_str)
    }
}

/// A square-root scale, used for symbol radii so areas are proportional to values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleSqrt {
    domain: (f64, f64),
    range: (f64, f64),
}

impl ScaleSqrt {
    /// Creates a new scale; negative inputs map by magnitude.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Maps a value into range space.
    pub fn map(&self, x: f64) -> f64 {
        let s = |v: f64| v.abs().sqrt();
        ScaleLinear::new((s(self.domain.0), s(self.domain.1)), self.range).map(s(x))
    }
}

/// A discrete mapping from categorical keys to range values.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleOrdinal<T> {
    index: HashMap<String, usize>,
    domain: Vec<String>,
    range: Vec<T>,
    unknown: T,
}

impl<T: Clone> ScaleOrdinal<T> {
    /// Keys map to `range` by position, cycling when the range is shorter.
    pub fn new(domain: Vec<String>, range: Vec<T>, unknown: T) -> Self {
        let index = domain
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        Self {
            index,
            domain,
            range,
            unknown,
        }
    }

    /// Value for `key`; keys outside the domain get the unknown value.
    pub fn get(&self, key: &str) -> &T {
        match self.index.get(key) {
            Some(&i) if !self.range.is_empty() => &self.range[i % self.range.len()],
            _ => &self.unknown,
        }
    }

    /// Ordered keys.
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// Range values.
    pub fn range(&self) -> &[T] {
        &self.range
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn keys(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| String::from(*s)).collect()
    }

    #[test]
    fn linear_maps_and_inverts() {
        let s = ScaleLinearSpec::new((0.0, 10.0)).instantiate((100.0, 0.0), 5);
        assert!((s.map(5.0) - 50.0).abs() < 1e-9);
        assert!((s.invert(25.0) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn nice_domain_extends_to_tick_boundaries() {
        let spec = ScaleLinearSpec::new((3.0, 97.0)).with_nice(true);
        assert_eq!(spec.resolved_domain(5), (0.0, 100.0));
        assert_eq!(spec.ticks(5), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[test]
    fn degenerate_domains_fall_back_to_default() {
        let opts = DomainOptions::default();
        assert_eq!(numeric_domain([], &opts), DEFAULT_DOMAIN);
        assert_eq!(numeric_domain([f64::NAN, f64::NAN], &opts), DEFAULT_DOMAIN);
    }

    #[test]
    fn custom_domain_wins_and_limits_extend() {
        let custom = DomainOptions {
            custom: Some([0.0, 50.0]),
            ..DomainOptions::default()
        };
        assert_eq!(numeric_domain([10.0, 500.0], &custom), (0.0, 50.0));
        let limits = DomainOptions {
            include: &[80.0],
            floor_zero: true,
            ..DomainOptions::default()
        };
        assert_eq!(numeric_domain([10.0, 20.0], &limits), (0.0, 80.0));
    }

    #[test]
    fn band_positions_follow_domain_order() {
        let band = ScaleBandSpec::new(keys(&["a", "b", "c", "d"]))
            .with_padding(0.0, 0.0)
            .instantiate((0.0, 100.0));
        assert_eq!(band.position("a"), Some(0.0));
        assert_eq!(band.position("c"), Some(50.0));
        assert_eq!(band.bandwidth(), 25.0);
        assert_eq!(band.invert(60.0), Some("c"));
        assert_eq!(band.invert(-5.0), Some("a"));
        assert_eq!(band.invert(1000.0), Some("d"));
        assert_eq!(band.position("z"), None);
    }

    #[test]
    fn band_padding_shrinks_bandwidth() {
        let band = ScaleBandSpec::new(keys(&["a", "b"]))
            .with_padding(0.5, 0.25)
            .instantiate((0.0, 100.0));
        // step = 100 / (2 - 0.5 + 0.5) = 50, bandwidth = 25, start = 0 + (100 - 75) * 0.5
        assert!((band.step() - 50.0).abs() < 1e-9);
        assert!((band.bandwidth() - 25.0).abs() < 1e-9);
        assert!((band.position("a").unwrap() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn ordinal_cycles_and_handles_unknown_keys() {
        let s = ScaleOrdinal::new(keys(&["a", "b", "c"]), vec![1, 2], 0);
        assert_eq!(*s.get("a"), 1);
        assert_eq!(*s.get("c"), 1);
        assert_eq!(*s.get("zzz"), 0);
    }

    #[test]
    fn sqrt_scale_is_area_proportional() {
        let s = ScaleSqrt::new((0.0, 100.0), (0.0, 10.0));
        assert!((s.map(25.0) - 5.0).abs() < 1e-9);
    }
}
