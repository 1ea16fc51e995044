// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Number formatting for ticks, tooltips and value labels.

use alloc::format;
use alloc::string::String;

#[cfg(not(feature = "std"))]
#[allow(unused_imports, reason = "toolchains with these methods in `core` resolve them inherently")]
use crate::float::FloatExt;

use cubeviz_core::Component;

/// Rendered in place of missing numbers.
pub const MISSING_VALUE: &str = "-";

const THOUSANDS_SEPARATOR: char = '\u{2019}';

/// Formats `value` with a fixed number of decimals and grouped thousands.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return String::from(MISSING_VALUE);
    }
    let raw = format!("{:.*}", decimals, value.abs());
    let (int, frac) = raw.split_once('.').unwrap_or((raw.as_str(), ""));
    let mut out = String::with_capacity(raw.len() + int.len() / 3 + 1);
    // "-0" is not a useful rendering.
    if value < 0.0 && raw.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(THOUSANDS_SEPARATOR);
        }
        out.push(ch);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Decimals needed to tell ticks `step` apart.
pub fn decimals_for_step(step: f64) -> usize {
    if !step.is_finite() || step <= 0.0 || step >= 1.0 {
        return 0;
    }
    let d = -step.log10().floor();
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "positive and bounded for steps below 1"
    )]
    let d = d.min(12.0) as usize;
    d
}

/// Formats a tick value for an axis with the given tick step.
pub fn format_tick(value: f64, step: f64) -> String {
    format_number(value, decimals_for_step(step))
}

/// Formats measure values with their unit, resolution and calculation mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueFormatter {
    /// Unit appended after the number.
    pub unit: Option<String>,
    /// Fixed decimals; automatic when `None`.
    pub decimals: Option<usize>,
    /// Values are fractions rendered as percentages.
    pub percent: bool,
}

impl ValueFormatter {
    /// Formatter for a measure component.
    pub fn for_component(component: &Component) -> Self {
        Self {
            unit: component.unit.clone(),
            decimals: component.resolution,
            percent: false,
        }
    }

    /// A formatter for fractions of a total.
    pub fn percent() -> Self {
        Self {
            unit: None,
            decimals: Some(1),
            percent: true,
        }
    }

    /// The number alone.
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return String::from(MISSING_VALUE);
        }
        let value = if self.percent { value * 100.0 } else { value };
        match self.decimals {
            Some(d) => format_number(value, d),
            None => auto_format(value),
        }
    }

    /// The number with its unit or percent sign.
    pub fn format_with_unit(&self, value: f64) -> String {
        let number = self.format(value);
        if !value.is_finite() {
            return number;
        }
        if self.percent {
            return format!("{number}%");
        }
        match self.unit.as_deref() {
            Some("%") => format!("{number}%"),
            Some(unit) if !unit.is_empty() => format!("{number} {unit}"),
            _ => number,
        }
    }

    /// Error rendering: `± e` for symmetric bounds, `[lo, hi]` otherwise.
    pub fn format_error(&self, value: f64, (lo, hi): (f64, f64)) -> String {
        let below = value - lo;
        let above = hi - value;
        if (below - above).abs() <= f64::EPSILON * value.abs().max(1.0) {
            format!("± {}", self.format(above))
        } else {
            format!("[{}, {}]", self.format(lo), self.format(hi))
        }
    }
}

/// Integers without decimals; other values to two decimals with trailing zeros removed.
fn auto_format(value: f64) -> String {
    if value == value.floor() || value.abs() >= 1e15 {
        return format_number(value, 0);
    }
    let s = format_number(value, 2);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    String::from(s)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use cubeviz_core::ComponentKind;

    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_number(1_234_567.0, 0), "1\u{2019}234\u{2019}567");
        assert_eq!(format_number(-1234.5, 1), "-1\u{2019}234.5");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(-0.0001, 1), "0.0");
    }

    #[test]
    fn nan_renders_as_dash() {
        assert_eq!(format_number(f64::NAN, 2), "-");
        assert_eq!(ValueFormatter::default().format_with_unit(f64::NAN), "-");
    }

    #[test]
    fn tick_decimals_follow_step() {
        assert_eq!(decimals_for_step(20.0), 0);
        assert_eq!(decimals_for_step(0.5), 1);
        assert_eq!(decimals_for_step(0.05), 2);
        assert_eq!(format_tick(0.25, 0.05), "0.25");
    }

    #[test]
    fn units_and_percent() {
        let c = Component::new("m", "M", ComponentKind::NumericalMeasure).with_unit("t");
        let f = ValueFormatter::for_component(&c);
        assert_eq!(f.format_with_unit(12.5), "12.5 t");
        assert_eq!(f.format_with_unit(3.0), "3 t");
        assert_eq!(ValueFormatter::percent().format_with_unit(0.25), "25.0%");
    }

    #[test]
    fn errors_render_symmetric_or_as_interval() {
        let f = ValueFormatter::default();
        assert_eq!(f.format_error(10.0, (8.0, 12.0)), "± 2");
        assert_eq!(f.format_error(10.0, (9.0, 12.0)), "[9, 12]");
    }
}
