// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chart dimensions and the arrange pass.
//!
//! Layout happens in two passes:
//! - **Measure**: estimate margins from tick labels and titles (see [`crate::padding`]).
//! - **Arrange**: derive the plot size from the container width and margins.
//!
//! Scale ranges are taken from the arranged [`Bounds`] only.

use kurbo::{Insets, Rect, Size};

/// Container widths below this are treated as mobile.
pub const MOBILE_BREAKPOINT: f64 = 600.0;

/// Plot height over plot width when nothing else is specified.
pub const DEFAULT_ASPECT_RATIO: f64 = 0.4;

/// The space a chart is rendered into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartDimensions {
    /// Container width in pixels.
    pub width: f64,
    /// Plot height over plot width.
    pub aspect_ratio: f64,
    /// Narrow viewport; tooltips fall back to a fixed placement.
    pub is_mobile: bool,
}

impl ChartDimensions {
    /// Dimensions for a container `width` pixels wide.
    pub fn new(width: f64) -> Self {
        Self {
            width: width.max(0.0),
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            is_mobile: width < MOBILE_BREAKPOINT,
        }
    }

    /// Sets the aspect ratio.
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect_ratio: f64) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Overrides mobile detection.
    #[must_use]
    pub fn with_mobile(mut self, is_mobile: bool) -> Self {
        self.is_mobile = is_mobile;
        self
    }
}

impl Default for ChartDimensions {
    fn default() -> Self {
        Self::new(800.0)
    }
}

/// Arranged chart geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Outer width.
    pub width: f64,
    /// Outer height.
    pub height: f64,
    /// Space reserved around the plot.
    pub margins: Insets,
    /// Plot width.
    pub chart_width: f64,
    /// Plot height.
    pub chart_height: f64,
}

impl Bounds {
    /// Plot width from the container, plot height from the aspect ratio.
    pub fn arrange(dimensions: &ChartDimensions, margins: Insets) -> Self {
        let chart_width = (dimensions.width - margins.x0 - margins.x1).max(0.0);
        Self::with_chart_height(dimensions, margins, chart_width * dimensions.aspect_ratio)
    }

    /// Plot width from the container with an explicit plot height.
    pub fn with_chart_height(dimensions: &ChartDimensions, margins: Insets, chart_height: f64) -> Self {
        let chart_width = (dimensions.width - margins.x0 - margins.x1).max(0.0);
        let chart_height = chart_height.max(0.0);
        Self {
            width: dimensions.width,
            height: chart_height + margins.y0 + margins.y1,
            margins,
            chart_width,
            chart_height,
        }
    }

    /// The plot rectangle in outer coordinates.
    pub fn plot_rect(&self) -> Rect {
        Rect::new(
            self.margins.x0,
            self.margins.y0,
            self.margins.x0 + self.chart_width,
            self.margins.y0 + self.chart_height,
        )
    }

    /// Outer size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn arrange_subtracts_margins() {
        let dims = ChartDimensions::new(500.0).with_aspect_ratio(0.5);
        assert!(dims.is_mobile);
        let b = Bounds::arrange(&dims, Insets::new(40.0, 10.0, 20.0, 30.0));
        assert_eq!(b.chart_width, 440.0);
        assert_eq!(b.chart_height, 220.0);
        assert_eq!(b.height, 260.0);
        assert_eq!(b.plot_rect(), Rect::new(40.0, 10.0, 480.0, 230.0));
    }

    #[test]
    fn margins_wider_than_the_container_collapse_the_plot() {
        let b = Bounds::arrange(&ChartDimensions::new(50.0), Insets::uniform(40.0));
        assert_eq!(b.chart_width, 0.0);
        assert_eq!(b.chart_height, 0.0);
    }
}
