// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Margin estimation from measured tick labels (the measure pass).
//!
//! Margins depend only on the labels handed in, never on scale ranges, so they can be
//! computed before any range is known.

use alloc::string::String;

use cubeviz_text::{FontWeight, TextMeasurer, TextStyle};
use kurbo::Insets;

/// Tick label font size.
pub const TICK_FONT_SIZE: f64 = 12.0;
/// Axis title font size.
pub const AXIS_TITLE_FONT_SIZE: f64 = 14.0;
/// Gap between tick marks and their labels.
pub const TICK_PADDING: f64 = 6.0;
/// Gap between an axis title and the plot.
pub const AXIS_TITLE_PADDING: f64 = 8.0;
/// Extra room below the plot for the time range brush.
pub const BRUSH_BOTTOM_SPACE: f64 = 100.0;
/// Height of one bar in bar charts.
pub const BAR_HEIGHT: f64 = 24.0;
/// Gap between bars.
pub const BAR_SPACE: f64 = 8.0;
/// Margin on sides without labels.
pub const MIN_MARGIN: f64 = 12.0;
/// Room kept on the right for the last horizontal tick label.
pub const RIGHT_MARGIN: f64 = 24.0;

/// Tick label style.
pub fn tick_style() -> TextStyle {
    TextStyle::new(TICK_FONT_SIZE)
}

/// Axis title style.
pub fn title_style() -> TextStyle {
    TextStyle::new(AXIS_TITLE_FONT_SIZE).with_weight(FontWeight::Bold)
}

/// Label sets and guides that reserve space around the plot.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChartPadding<'a> {
    /// Labels of the left axis.
    pub left_labels: &'a [String],
    /// Labels of the right axis (dual axis charts).
    pub right_labels: &'a [String],
    /// Labels of a horizontal axis below the plot.
    pub bottom_labels: &'a [String],
    /// Horizontal axis labels are rotated by 90° (column band labels).
    pub rotate_bottom_labels: bool,
    /// Title above the left axis.
    pub left_title: Option<&'a str>,
    /// Title above the right axis.
    pub right_title: Option<&'a str>,
    /// Title below the horizontal axis.
    pub bottom_title: Option<&'a str>,
    /// A time range brush sits below the plot.
    pub time_brush: bool,
}

impl ChartPadding<'_> {
    /// Estimates margins with `measurer`.
    pub fn margins(&self, measurer: &dyn TextMeasurer) -> Insets {
        let ticks = tick_style();
        let titles = title_style();
        let widest = |labels: &[String]| {
            measurer.max_width(&mut labels.iter().map(String::as_str), &ticks)
        };
        let tick_height = measurer.measure("0", &ticks).height();
        let title_height = measurer.measure("T", &titles).height();

        let left = if self.left_labels.is_empty() {
            MIN_MARGIN
        } else {
            widest(self.left_labels) + TICK_PADDING + MIN_MARGIN
        };
        let right = if self.right_labels.is_empty() {
            RIGHT_MARGIN
        } else {
            widest(self.right_labels) + TICK_PADDING + MIN_MARGIN
        };
        let top = if self.left_title.is_some() || self.right_title.is_some() {
            title_height + AXIS_TITLE_PADDING + tick_height / 2.0
        } else {
            MIN_MARGIN + tick_height / 2.0
        };
        let mut bottom = if self.bottom_labels.is_empty() {
            MIN_MARGIN
        } else if self.rotate_bottom_labels {
            widest(self.bottom_labels) + TICK_PADDING + MIN_MARGIN
        } else {
            tick_height + TICK_PADDING + MIN_MARGIN
        };
        if self.bottom_title.is_some() {
            bottom += title_height + AXIS_TITLE_PADDING;
        }
        if self.time_brush {
            bottom += BRUSH_BOTTOM_SPACE;
        }
        Insets::new(left, top, right, bottom)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;
    use alloc::vec::Vec;

    use cubeviz_text::HeuristicTextMeasurer;

    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wider_labels_widen_the_left_margin() {
        let short = labels(&["0", "50"]);
        let long = labels(&["0", "50\u{2019}000"]);
        let m = HeuristicTextMeasurer;
        let a = ChartPadding { left_labels: &short, ..ChartPadding::default() }.margins(&m);
        let b = ChartPadding { left_labels: &long, ..ChartPadding::default() }.margins(&m);
        assert!(b.x0 > a.x0);
        assert_eq!(a.y0, b.y0);
    }

    #[test]
    fn brush_adds_bottom_space() {
        let m = HeuristicTextMeasurer;
        let x = labels(&["2020"]);
        let plain = ChartPadding { bottom_labels: &x, ..ChartPadding::default() };
        let brushed = ChartPadding { time_brush: true, ..plain };
        assert_eq!(brushed.margins(&m).y1 - plain.margins(&m).y1, BRUSH_BOTTOM_SPACE);
    }

    #[test]
    fn margins_are_deterministic() {
        let m = HeuristicTextMeasurer;
        let l = labels(&["1", "10", "100"]);
        let p = ChartPadding {
            left_labels: &l,
            left_title: Some("Measure"),
            ..ChartPadding::default()
        };
        assert_eq!(p.margins(&m), p.margins(&m));
    }
}
