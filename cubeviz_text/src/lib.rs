// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text measurement for chart margin computation.
//!
//! Chart margins depend on how wide the longest tick label renders, so labels are
//! measured through [`TextMeasurer`] rather than estimated from character counts.
//! Backends:
//! - [`HeuristicTextMeasurer`]: deterministic estimate for tests and headless runs.
//! - [`WebTextMeasurer`]: HTML canvas `measureText` on `wasm32`.
//! - [`CachedTextMeasurer`]: memoizes another measurer. The same tick labels come back
//!   on every derivation pass.

#![no_std]

extern crate alloc;

mod cached;
mod web;

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;

pub use cached::CachedTextMeasurer;
pub use web::WebTextMeasurer;

/// Font stack of chart labels.
pub const DEFAULT_FONT_FAMILY: &str = "\"Source Sans Pro\", Helvetica, Arial, sans-serif";

/// Measures single-line labels.
pub trait TextMeasurer {
    /// Metrics of `text` set in `style`. Line breaks are not interpreted.
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;

    /// Changes whenever the same measurer may start returning different metrics, e.g.
    /// after a web font finished loading. Derivation caches key on it.
    fn revision(&self) -> u64 {
        0
    }

    /// Widest label, or `0.0` when there are none.
    fn max_width<'a>(&self, labels: &mut dyn Iterator<Item = &'a str>, style: &TextStyle) -> f64 {
        labels
            .map(|s| self.measure(s, style).width)
            .fold(0.0, f64::max)
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        (**self).measure(text, style)
    }

    fn revision(&self) -> u64 {
        (**self).revision()
    }
}

/// Label weight. Charts only set tick labels regular and axis titles bold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontWeight {
    /// CSS `400`.
    #[default]
    Regular,
    /// CSS `700`.
    Bold,
}

impl FontWeight {
    /// Numeric CSS weight.
    #[must_use]
    pub fn css_value(self) -> u16 {
        match self {
            Self::Regular => 400,
            Self::Bold => 700,
        }
    }
}

/// How a label is set.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size: f64,
    /// Label weight.
    pub weight: FontWeight,
    /// CSS font stack.
    pub family: Arc<str>,
}

impl TextStyle {
    /// Regular labels of `size` pixels in [`DEFAULT_FONT_FAMILY`].
    #[must_use]
    pub fn new(size: f64) -> Self {
        Self {
            size,
            weight: FontWeight::Regular,
            family: Arc::from(DEFAULT_FONT_FAMILY),
        }
    }

    /// Sets the weight.
    #[must_use]
    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the font stack.
    #[must_use]
    pub fn with_family(mut self, family: impl Into<Arc<str>>) -> Self {
        self.family = family.into();
        self
    }

    /// CSS `font` shorthand, e.g. `700 14px sans-serif`.
    #[must_use]
    pub fn css_font(&self) -> String {
        format!("{} {}px {}", self.weight.css_value(), self.size, self.family)
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new(12.0)
    }
}

/// Size of one measured label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    /// Horizontal advance.
    pub width: f64,
    /// Baseline to top.
    pub ascent: f64,
    /// Baseline to bottom.
    pub descent: f64,
}

impl TextMetrics {
    /// Metrics with the usual 80/20 split of `size` around the baseline.
    #[must_use]
    pub fn with_default_extent(width: f64, size: f64) -> Self {
        Self {
            width,
            ascent: 0.8 * size,
            descent: 0.2 * size,
        }
    }

    /// `ascent + descent`.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// Deterministic measurer for headless derivation.
///
/// Digits and separators are narrower than letters in the proportional fonts charts use, so
/// the estimate distinguishes a few glyph classes instead of a flat em fraction.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicTextMeasurer;

impl HeuristicTextMeasurer {
    fn glyph_em(c: char) -> f64 {
        match c {
            '.' | ',' | '\'' | '\u{2019}' | ':' | ';' | '!' | '|' | 'i' | 'l' | 'j' => 0.28,
            ' ' | '-' | '(' | ')' | 'f' | 't' | 'r' => 0.34,
            '0'..='9' => 0.56,
            'm' | 'w' | 'M' | 'W' | '%' => 0.86,
            c if c.is_uppercase() => 0.66,
            _ => 0.55,
        }
    }
}

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let ems: f64 = text.chars().map(Self::glyph_em).sum();
        let boldness = match style.weight {
            FontWeight::Regular => 1.0,
            FontWeight::Bold => 1.06,
        };
        TextMetrics::with_default_extent(ems * style.size * boldness, style.size)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn heuristic_is_deterministic_and_monotonic_in_length() {
        let style = TextStyle::new(12.0);
        let a = HeuristicTextMeasurer.measure("1'000", &style);
        let b = HeuristicTextMeasurer.measure("1'000", &style);
        let c = HeuristicTextMeasurer.measure("10'000", &style);
        assert_eq!(a, b, "same label, same metrics");
        assert!(c.width > a.width, "an extra digit widens the label");
        assert!((a.height() - 12.0).abs() < 1e-9, "height spans the font size");
    }

    #[test]
    fn bold_titles_are_wider() {
        let regular = TextStyle::new(14.0);
        let bold = regular.clone().with_weight(FontWeight::Bold);
        assert!(
            HeuristicTextMeasurer.measure("Value", &bold).width
                > HeuristicTextMeasurer.measure("Value", &regular).width,
            "bold widens"
        );
    }

    #[test]
    fn max_width_picks_the_widest_label() {
        let style = TextStyle::default();
        let labels = ["0", "50", "100"];
        let widest = HeuristicTextMeasurer.max_width(&mut labels.iter().copied(), &style);
        let expected = HeuristicTextMeasurer.measure("100", &style).width;
        assert!((widest - expected).abs() < 1e-9, "widest is the longest number");
        assert_eq!(
            HeuristicTextMeasurer.max_width(&mut core::iter::empty(), &style),
            0.0,
            "no labels take no room"
        );
    }

    #[test]
    fn css_font_shorthand() {
        let style = TextStyle::new(12.0)
            .with_weight(FontWeight::Bold)
            .with_family("sans-serif");
        assert_eq!(style.css_font(), "700 12px sans-serif");
    }
}
