// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color palettes and color scales.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use cubeviz_core::{ColorInterpolation, ColorScaleType, Component};
use peniko::Color;
use peniko::color::Srgb;

use crate::breaks::{self, ThresholdSide};
use crate::scale::{DomainOptions, ScaleOrdinal, numeric_domain};

/// Color for keys or values that no scale covers.
pub const UNKNOWN_COLOR: Color = Color::from_rgb8(0xcc, 0xcc, 0xcc);

/// Fill used when a chart has a single series and no configured color.
pub const DEFAULT_COLOR: Color = CATEGORY10[0];

const CATEGORY10: [Color; 10] = [
    Color::from_rgb8(0x1f, 0x77, 0xb4),
    Color::from_rgb8(0xff, 0x7f, 0x0e),
    Color::from_rgb8(0x2c, 0xa0, 0x2c),
    Color::from_rgb8(0xd6, 0x27, 0x28),
    Color::from_rgb8(0x94, 0x67, 0xbd),
    Color::from_rgb8(0x8c, 0x56, 0x4b),
    Color::from_rgb8(0xe3, 0x77, 0xc2),
    Color::from_rgb8(0x7f, 0x7f, 0x7f),
    Color::from_rgb8(0xbc, 0xbd, 0x22),
    Color::from_rgb8(0x17, 0xbe, 0xcf),
];
const ACCENT: [Color; 8] = [
    Color::from_rgb8(0x7f, 0xc9, 0x7f),
    Color::from_rgb8(0xbe, 0xae, 0xd4),
    Color::from_rgb8(0xfd, 0xc0, 0x86),
    Color::from_rgb8(0xff, 0xff, 0x99),
    Color::from_rgb8(0x38, 0x6c, 0xb0),
    Color::from_rgb8(0xf0, 0x02, 0x7f),
    Color::from_rgb8(0xbf, 0x5b, 0x17),
    Color::from_rgb8(0x66, 0x66, 0x66),
];
const DARK2: [Color; 8] = [
    Color::from_rgb8(0x1b, 0x9e, 0x77),
    Color::from_rgb8(0xd9, 0x5f, 0x02),
    Color::from_rgb8(0x75, 0x70, 0xb3),
    Color::from_rgb8(0xe7, 0x29, 0x8a),
    Color::from_rgb8(0x66, 0xa6, 0x1e),
    Color::from_rgb8(0xe6, 0xab, 0x02),
    Color::from_rgb8(0xa6, 0x76, 0x1d),
    Color::from_rgb8(0x66, 0x66, 0x66),
];
const PASTEL1: [Color; 9] = [
    Color::from_rgb8(0xfb, 0xb4, 0xae),
    Color::from_rgb8(0xb3, 0xcd, 0xe3),
    Color::from_rgb8(0xcc, 0xeb, 0xc5),
    Color::from_rgb8(0xde, 0xcb, 0xe4),
    Color::from_rgb8(0xfe, 0xd9, 0xa6),
    Color::from_rgb8(0xff, 0xff, 0xcc),
    Color::from_rgb8(0xe5, 0xd8, 0xbd),
    Color::from_rgb8(0xfd, 0xda, 0xec),
    Color::from_rgb8(0xf2, 0xf2, 0xf2),
];
const PASTEL2: [Color; 8] = [
    Color::from_rgb8(0xb3, 0xe2, 0xcd),
    Color::from_rgb8(0xfd, 0xcd, 0xac),
    Color::from_rgb8(0xcb, 0xd5, 0xe8),
    Color::from_rgb8(0xf4, 0xca, 0xe4),
    Color::from_rgb8(0xe6, 0xf5, 0xc9),
    Color::from_rgb8(0xff, 0xf2, 0xae),
    Color::from_rgb8(0xf1, 0xe2, 0xcc),
    Color::from_rgb8(0xcc, 0xcc, 0xcc),
];
const SET1: [Color; 9] = [
    Color::from_rgb8(0xe4, 0x1a, 0x1c),
    Color::from_rgb8(0x37, 0x7e, 0xb8),
    Color::from_rgb8(0x4d, 0xaf, 0x4a),
    Color::from_rgb8(0x98, 0x4e, 0xa3),
    Color::from_rgb8(0xff, 0x7f, 0x00),
    Color::from_rgb8(0xff, 0xff, 0x33),
    Color::from_rgb8(0xa6, 0x56, 0x28),
    Color::from_rgb8(0xf7, 0x81, 0xbf),
    Color::from_rgb8(0x99, 0x99, 0x99),
];
const SET2: [Color; 8] = [
    Color::from_rgb8(0x66, 0xc2, 0xa5),
    Color::from_rgb8(0xfc, 0x8d, 0x62),
    Color::from_rgb8(0x8d, 0xa0, 0xcb),
    Color::from_rgb8(0xe7, 0x8a, 0xc3),
    Color::from_rgb8(0xa6, 0xd8, 0x54),
    Color::from_rgb8(0xff, 0xd9, 0x2f),
    Color::from_rgb8(0xe5, 0xc4, 0x94),
    Color::from_rgb8(0xb3, 0xb3, 0xb3),
];
const SET3: [Color; 12] = [
    Color::from_rgb8(0x8d, 0xd3, 0xc7),
    Color::from_rgb8(0xff, 0xff, 0xb3),
    Color::from_rgb8(0xbe, 0xba, 0xda),
    Color::from_rgb8(0xfb, 0x80, 0x72),
    Color::from_rgb8(0x80, 0xb1, 0xd3),
    Color::from_rgb8(0xfd, 0xb4, 0x62),
    Color::from_rgb8(0xb3, 0xde, 0x69),
    Color::from_rgb8(0xfc, 0xcd, 0xe5),
    Color::from_rgb8(0xd9, 0xd9, 0xd9),
    Color::from_rgb8(0xbc, 0x80, 0xbd),
    Color::from_rgb8(0xcc, 0xeb, 0xc5),
    Color::from_rgb8(0xff, 0xed, 0x6f),
];
const TABLEAU10: [Color; 10] = [
    Color::from_rgb8(0x4e, 0x79, 0xa7),
    Color::from_rgb8(0xf2, 0x8e, 0x2c),
    Color::from_rgb8(0xe1, 0x57, 0x59),
    Color::from_rgb8(0x76, 0xb7, 0xb2),
    Color::from_rgb8(0x59, 0xa1, 0x4f),
    Color::from_rgb8(0xed, 0xc9, 0x49),
    Color::from_rgb8(0xaf, 0x7a, 0xa1),
    Color::from_rgb8(0xff, 0x9d, 0xa7),
    Color::from_rgb8(0x9c, 0x75, 0x5f),
    Color::from_rgb8(0xba, 0xb0, 0xab),
];
const BLUES: [Color; 3] = [
    Color::from_rgb8(0xf7, 0xfb, 0xff),
    Color::from_rgb8(0x6b, 0xae, 0xd6),
    Color::from_rgb8(0x08, 0x30, 0x6b),
];
const GREENS: [Color; 3] = [
    Color::from_rgb8(0xf7, 0xfc, 0xf5),
    Color::from_rgb8(0x74, 0xc4, 0x76),
    Color::from_rgb8(0x00, 0x44, 0x1b),
];
const GREYS: [Color; 3] = [
    Color::from_rgb8(0xff, 0xff, 0xff),
    Color::from_rgb8(0x96, 0x96, 0x96),
    Color::from_rgb8(0x00, 0x00, 0x00),
];
const ORANGES: [Color; 3] = [
    Color::from_rgb8(0xff, 0xf5, 0xeb),
    Color::from_rgb8(0xfd, 0x8d, 0x3c),
    Color::from_rgb8(0x7f, 0x27, 0x04),
];
const PURPLES: [Color; 3] = [
    Color::from_rgb8(0xfc, 0xfb, 0xfd),
    Color::from_rgb8(0x9e, 0x9a, 0xc8),
    Color::from_rgb8(0x3f, 0x00, 0x7d),
];
const REDS: [Color; 3] = [
    Color::from_rgb8(0xff, 0xf5, 0xf0),
    Color::from_rgb8(0xfb, 0x6a, 0x4a),
    Color::from_rgb8(0x67, 0x00, 0x0d),
];
const VIRIDIS: [Color; 5] = [
    Color::from_rgb8(0x44, 0x01, 0x54),
    Color::from_rgb8(0x3b, 0x52, 0x8b),
    Color::from_rgb8(0x21, 0x91, 0x8c),
    Color::from_rgb8(0x5e, 0xc9, 0x62),
    Color::from_rgb8(0xfd, 0xe7, 0x25),
];
const RD_BU: [Color; 5] = [
    Color::from_rgb8(0x67, 0x00, 0x1f),
    Color::from_rgb8(0xf4, 0xa5, 0x82),
    Color::from_rgb8(0xf7, 0xf7, 0xf7),
    Color::from_rgb8(0x92, 0xc5, 0xde),
    Color::from_rgb8(0x05, 0x30, 0x61),
];
const PU_OR: [Color; 5] = [
    Color::from_rgb8(0x7f, 0x3b, 0x08),
    Color::from_rgb8(0xfd, 0xb8, 0x63),
    Color::from_rgb8(0xf7, 0xf7, 0xf7),
    Color::from_rgb8(0xb2, 0xab, 0xd2),
    Color::from_rgb8(0x2d, 0x00, 0x4b),
];
const BR_BG: [Color; 5] = [
    Color::from_rgb8(0x54, 0x30, 0x05),
    Color::from_rgb8(0xdf, 0xc2, 0x7d),
    Color::from_rgb8(0xf5, 0xf5, 0xf5),
    Color::from_rgb8(0x80, 0xcd, 0xc1),
    Color::from_rgb8(0x00, 0x3c, 0x30),
];
const PR_GN: [Color; 5] = [
    Color::from_rgb8(0x40, 0x00, 0x4b),
    Color::from_rgb8(0xc2, 0xa5, 0xcf),
    Color::from_rgb8(0xf7, 0xf7, 0xf7),
    Color::from_rgb8(0xa6, 0xdb, 0xa0),
    Color::from_rgb8(0x00, 0x44, 0x1b),
];
const PI_YG: [Color; 5] = [
    Color::from_rgb8(0x8e, 0x01, 0x52),
    Color::from_rgb8(0xf1, 0xb6, 0xda),
    Color::from_rgb8(0xf7, 0xf7, 0xf7),
    Color::from_rgb8(0xb8, 0xe1, 0x86),
    Color::from_rgb8(0x27, 0x64, 0x19),
];
const RD_YL_BU: [Color; 5] = [
    Color::from_rgb8(0xa5, 0x00, 0x26),
    Color::from_rgb8(0xfd, 0xae, 0x61),
    Color::from_rgb8(0xff, 0xff, 0xbf),
    Color::from_rgb8(0xab, 0xd9, 0xe9),
    Color::from_rgb8(0x31, 0x36, 0x95),
];
const RD_YL_GN: [Color; 5] = [
    Color::from_rgb8(0xa5, 0x00, 0x26),
    Color::from_rgb8(0xfd, 0xae, 0x61),
    Color::from_rgb8(0xff, 0xff, 0xbf),
    Color::from_rgb8(0xa6, 0xd9, 0x6a),
    Color::from_rgb8(0x00, 0x68, 0x37),
];

/// Categorical palette by id. Unknown ids fall back to `category10`.
pub fn categorical_palette(id: Option<&str>) -> &'static [Color] {
    match id.unwrap_or_default() {
        "accent" => &ACCENT,
        "dark2" => &DARK2,
        "pastel1" => &PASTEL1,
        "pastel2" => &PASTEL2,
        "set1" => &SET1,
        "set2" => &SET2,
        "set3" => &SET3,
        "tableau10" => &TABLEAU10,
        _ => &CATEGORY10,
    }
}

/// Piecewise-linear interpolation through evenly spaced color stops.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interpolator {
    stops: &'static [Color],
    diverging: bool,
}

impl Interpolator {
    /// Color at `t` in `[0, 1]`; out-of-range `t` is clamped.
    pub fn at(&self, t: f64) -> Color {
        let Some(last) = self.stops.len().checked_sub(1) else {
            return UNKNOWN_COLOR;
        };
        if last == 0 || !t.is_finite() {
            return self.stops[0];
        }
        let x = t.clamp(0.0, 1.0) * last as f64;
        let i = (0..last).rfind(|i| *i as f64 <= x).unwrap_or(0);
        lerp(self.stops[i], self.stops[i + 1], x - i as f64)
    }

    /// `n` evenly spaced samples from start to end.
    pub fn samples(&self, n: usize) -> Vec<Color> {
        match n {
            0 => Vec::new(),
            1 => alloc::vec![self.at(0.5)],
            _ => (0..n).map(|i| self.at(i as f64 / (n - 1) as f64)).collect(),
        }
    }

    /// Whether this is a two-sided palette.
    pub fn is_diverging(&self) -> bool {
        self.diverging
    }
}

/// Sequential or diverging interpolator by id. Unknown ids fall back to `blues`.
pub fn interpolator(id: Option<&str>) -> Interpolator {
    let (stops, diverging): (&'static [Color], bool) = match id.unwrap_or_default() {
        "greens" => (&GREENS, false),
        "greys" => (&GREYS, false),
        "oranges" => (&ORANGES, false),
        "purples" => (&PURPLES, false),
        "reds" => (&REDS, false),
        "viridis" => (&VIRIDIS, false),
        "RdBu" => (&RD_BU, true),
        "PuOr" => (&PU_OR, true),
        "BrBG" => (&BR_BG, true),
        "PRGn" => (&PR_GN, true),
        "PiYG" => (&PI_YG, true),
        "RdYlBu" => (&RD_YL_BU, true),
        "RdYlGn" => (&RD_YL_GN, true),
        _ => (&BLUES, false),
    };
    Interpolator { stops, diverging }
}

#[allow(clippy::cast_possible_truncation, reason = "color channels are f32")]
fn lerp(a: Color, b: Color, t: f64) -> Color {
    let t = t as f32;
    let mut c = [0.0_f32; 4];
    for (i, out) in c.iter_mut().enumerate() {
        *out = a.components[i] + (b.components[i] - a.components[i]) * t;
    }
    Color::new(c)
}

/// Parses any CSS color string.
pub fn parse_css_color(s: &str) -> Option<Color> {
    peniko::color::parse_color(s.trim())
        .ok()
        .map(|c| c.to_alpha_color::<Srgb>())
}

/// `#rrggbb` for opaque colors, `#rrggbbaa` otherwise.
pub fn to_hex(color: Color) -> String {
    let c = color.to_rgba8();
    if c.a == 0xff {
        format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
    }
}

/// One color per key of `domain`.
///
/// An explicit mapping entry wins, then a color attached to the dimension value, then the
/// palette color at the key's position.
pub fn categorical_colors(
    domain: &[String],
    palette_id: Option<&str>,
    mapping: &BTreeMap<String, String>,
    component: Option<&Component>,
) -> ScaleOrdinal<Color> {
    let palette = categorical_palette(palette_id);
    let range = domain
        .iter()
        .enumerate()
        .map(|(i, key)| {
            mapping
                .get(key)
                .and_then(|c| parse_css_color(c))
                .or_else(|| {
                    component
                        .and_then(|c| c.value(key))
                        .and_then(|v| v.color.as_deref())
                        .and_then(parse_css_color)
                })
                .unwrap_or(palette[i % palette.len()])
        })
        .collect();
    ScaleOrdinal::new(domain.to_vec(), range, UNKNOWN_COLOR)
}

/// A color scale over a numeric measure.
#[derive(Clone, Debug, PartialEq)]
pub enum NumericColorScale {
    /// Continuous interpolation over the data extent.
    Continuous {
        /// Data extent.
        domain: (f64, f64),
        /// Palette.
        interpolator: Interpolator,
    },
    /// Discrete classes separated by thresholds.
    Classed {
        /// Sorted class boundaries; `colors.len() == thresholds.len() + 1`.
        thresholds: Vec<f64>,
        /// One color per class.
        colors: Vec<Color>,
        /// Which class a value equal to a threshold falls into.
        side: ThresholdSide,
    },
}

impl NumericColorScale {
    /// Builds a scale over `values`.
    pub fn new(
        values: &[f64],
        palette_id: Option<&str>,
        scale_type: ColorScaleType,
        interpolation: ColorInterpolation,
        classes: usize,
    ) -> Self {
        let interpolator = interpolator(palette_id);
        let domain = numeric_domain(values.iter().copied(), &DomainOptions::default());
        if scale_type == ColorScaleType::Continuous {
            return Self::Continuous {
                domain,
                interpolator,
            };
        }
        let classes = classes.max(1);
        let (thresholds, side) = match interpolation {
            ColorInterpolation::Linear | ColorInterpolation::Quantize => (
                breaks::quantize_thresholds(domain, classes),
                ThresholdSide::Lower,
            ),
            ColorInterpolation::Quantile => (
                breaks::quantile_thresholds(values, classes),
                ThresholdSide::Lower,
            ),
            ColorInterpolation::Jenks => {
                let mut b = breaks::jenks_breaks(values, classes);
                // The last cluster's upper bound is the maximum, not a boundary.
                b.pop();
                (b, ThresholdSide::Upper)
            }
        };
        let colors = interpolator.samples(thresholds.len() + 1);
        Self::Classed {
            thresholds,
            colors,
            side,
        }
    }

    /// Color for `value`; `NaN` is unknown.
    pub fn color(&self, value: f64) -> Color {
        if !value.is_finite() {
            return UNKNOWN_COLOR;
        }
        match self {
            Self::Continuous {
                domain: (lo, hi),
                interpolator,
            } => {
                let t = if hi == lo { 0.5 } else { (value - lo) / (hi - lo) };
                interpolator.at(t)
            }
            Self::Classed {
                thresholds,
                colors,
                side,
            } => {
                let i = breaks::classify(thresholds, value, *side);
                colors.get(i).copied().unwrap_or(UNKNOWN_COLOR)
            }
        }
    }
}

/// The resolved color encoding of a chart.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorScale {
    /// Every mark has the same color.
    Fixed(Color),
    /// Colors by segment key.
    Categorical(ScaleOrdinal<Color>),
    /// Colors by measure value.
    Numeric(NumericColorScale),
}

impl ColorScale {
    /// Color for a categorical key.
    pub fn for_key(&self, key: &str) -> Color {
        match self {
            Self::Fixed(c) => *c,
            Self::Categorical(s) => *s.get(key),
            Self::Numeric(_) => UNKNOWN_COLOR,
        }
    }

    /// Color for a numeric value.
    pub fn for_value(&self, value: f64) -> Color {
        match self {
            Self::Fixed(c) => *c,
            Self::Categorical(_) => UNKNOWN_COLOR,
            Self::Numeric(s) => s.color(value),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;
    use alloc::vec;

    use cubeviz_core::{ComponentKind, DimensionValue};

    use super::*;

    #[test]
    fn mapping_then_metadata_then_palette() {
        let component = Component::new("c", "C", ComponentKind::NominalDimension)
            .with_values(vec![DimensionValue::new("b").with_color("#00ff00")]);
        let mut mapping = BTreeMap::new();
        mapping.insert("a".to_string(), "red".to_string());
        let domain = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let s = categorical_colors(&domain, Some("set1"), &mapping, Some(&component));
        assert_eq!(to_hex(*s.get("a")), "#ff0000");
        assert_eq!(to_hex(*s.get("b")), "#00ff00");
        assert_eq!(to_hex(*s.get("c")), "#4daf4a");
        assert_eq!(*s.get("zzz"), UNKNOWN_COLOR);
    }

    #[test]
    fn interpolator_hits_stops() {
        let blues = interpolator(Some("blues"));
        assert_eq!(to_hex(blues.at(0.0)), "#f7fbff");
        assert_eq!(to_hex(blues.at(1.0)), "#08306b");
        assert_eq!(to_hex(blues.at(0.5)), "#6baed6");
        assert!(interpolator(Some("RdBu")).is_diverging());
    }

    #[test]
    fn jenks_classes_cover_all_values() {
        let values = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 50.0, 52.0];
        let scale = NumericColorScale::new(
            &values,
            Some("reds"),
            ColorScaleType::Discrete,
            ColorInterpolation::Jenks,
            3,
        );
        let NumericColorScale::Classed { thresholds, colors, .. } = &scale else {
            panic!("expected classes");
        };
        assert_eq!(thresholds, &vec![3.0, 12.0]);
        assert_eq!(colors.len(), 3);
        assert_eq!(scale.color(3.0), colors[0]);
        assert_eq!(scale.color(11.0), colors[1]);
        assert_eq!(scale.color(52.0), colors[2]);
        assert_eq!(scale.color(f64::NAN), UNKNOWN_COLOR);
    }
}
