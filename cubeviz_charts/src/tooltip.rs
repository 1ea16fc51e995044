// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tooltip and hover annotation descriptions.

use alloc::string::String;
use alloc::vec::Vec;

use peniko::Color;

use crate::layout::ChartDimensions;

/// Horizontal tooltip alignment relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TooltipX {
    /// Tooltip extends to the left of the anchor.
    Left,
    /// Tooltip is centered on the anchor.
    Center,
    /// Tooltip extends to the right of the anchor.
    Right,
}

/// Vertical tooltip alignment relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TooltipY {
    /// Tooltip sits above the anchor.
    Top,
    /// Tooltip is centered on the anchor.
    Middle,
    /// Tooltip sits below the anchor.
    Bottom,
}

/// Where a tooltip box goes relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TooltipPlacement {
    /// Horizontal alignment.
    pub x: TooltipX,
    /// Vertical alignment.
    pub y: TooltipY,
}

/// Placement used on mobile viewports.
pub const MOBILE_PLACEMENT: TooltipPlacement = TooltipPlacement {
    x: TooltipX::Center,
    y: TooltipY::Bottom,
};

/// Keeps the tooltip inside the plot based on where the anchor is.
///
/// Anchors on top of a mark (`top_anchor`) center the box above it except near the edges.
/// Other anchors put the box beside the mark on the side with more room.
pub fn centered_placement(chart_width: f64, x_anchor: f64, top_anchor: bool) -> TooltipPlacement {
    if top_anchor {
        let x = if x_anchor < chart_width * 0.2 {
            TooltipX::Right
        } else if x_anchor > chart_width * 0.8 {
            TooltipX::Left
        } else {
            TooltipX::Center
        };
        TooltipPlacement { x, y: TooltipY::Top }
    } else {
        let x = if x_anchor < chart_width * 0.5 {
            TooltipX::Right
        } else {
            TooltipX::Left
        };
        TooltipPlacement {
            x,
            y: TooltipY::Middle,
        }
    }
}

/// [`centered_placement`], or [`MOBILE_PLACEMENT`] on mobile.
pub fn placement(
    dimensions: &ChartDimensions,
    chart_width: f64,
    x_anchor: f64,
    top_anchor: bool,
) -> TooltipPlacement {
    if dimensions.is_mobile {
        MOBILE_PLACEMENT
    } else {
        centered_placement(chart_width, x_anchor, top_anchor)
    }
}

/// One line of a tooltip.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipValue {
    /// Segment or series label.
    pub label: String,
    /// Formatted value; `-` when missing.
    pub value: String,
    /// Formatted error range.
    pub error: Option<String>,
    /// Swatch color.
    pub color: Option<Color>,
}

/// A resolved tooltip for the hovered observation.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipInfo {
    /// Anchor x in plot coordinates.
    pub x_anchor: f64,
    /// Anchor y in plot coordinates.
    pub y_anchor: f64,
    /// Box placement.
    pub placement: TooltipPlacement,
    /// The hovered value.
    pub datum: TooltipValue,
    /// All values at the hovered position, in segment order.
    pub values: Vec<TooltipValue>,
}

/// Hover highlight for the hovered observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnotationInfo {
    /// Highlight x in plot coordinates.
    pub x: f64,
    /// Highlight y in plot coordinates.
    pub y: f64,
    /// Highlight color.
    pub color: Color,
}

/// Orders tooltip values by resolved segment index and drops the index.
pub fn in_segment_order(mut values: Vec<(usize, TooltipValue)>) -> Vec<TooltipValue> {
    values.sort_by_key(|(i, _)| *i);
    values.into_iter().map(|(_, v)| v).collect()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    #[test]
    fn top_anchored_placement_flips_near_edges() {
        let p = |x| centered_placement(100.0, x, true);
        assert_eq!(p(10.0), TooltipPlacement { x: TooltipX::Right, y: TooltipY::Top });
        assert_eq!(p(50.0), TooltipPlacement { x: TooltipX::Center, y: TooltipY::Top });
        assert_eq!(p(90.0), TooltipPlacement { x: TooltipX::Left, y: TooltipY::Top });
    }

    #[test]
    fn side_placement_uses_the_roomier_half() {
        assert_eq!(centered_placement(100.0, 30.0, false).x, TooltipX::Right);
        assert_eq!(centered_placement(100.0, 70.0, false).x, TooltipX::Left);
        assert_eq!(centered_placement(100.0, 70.0, false).y, TooltipY::Middle);
    }

    #[test]
    fn mobile_falls_back_to_bottom_center() {
        let dims = ChartDimensions::new(320.0);
        assert_eq!(placement(&dims, 300.0, 10.0, true), MOBILE_PLACEMENT);
    }

    #[test]
    fn values_follow_segment_order() {
        let v = |l: &str| TooltipValue {
            label: l.to_string(),
            value: "-".to_string(),
            error: None,
            color: None,
        };
        let sorted = in_segment_order(vec![(2, v("c")), (0, v("a")), (1, v("b"))]);
        let labels: Vec<_> = sorted.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, ["a", "b", "c"]);
    }
}
