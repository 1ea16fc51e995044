// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pie charts: one arc per segment.
//!
//! Angles follow the clock: 0 is twelve o'clock and angles grow clockwise.

use alloc::string::String;
use alloc::vec::Vec;
use core::f64::consts::{FRAC_PI_2, TAU};

use cubeviz_core::{ChartError, Observation, PieConfig};
use cubeviz_transforms::sums_by_key;
use kurbo::{CircleSegment, Insets, Point};

use crate::accessors::{NumericGetter, StringGetter};
use crate::chart_data::{
    ChartInputs, DataViews, Segments, resolve_segments, segment_colors, value_formatter,
};
use crate::color::ColorScale;
#[cfg(not(feature = "std"))]
#[allow(unused_imports, reason = "toolchains with these methods in `core` resolve them inherently")]
use crate::float::FloatExt;
use crate::format::ValueFormatter;
use crate::layout::{Bounds, ChartDimensions};
use crate::padding::MIN_MARGIN;
use crate::tooltip::{self, AnnotationInfo, TooltipInfo, TooltipValue};

/// One arc.
#[derive(Clone, Debug, PartialEq)]
pub struct PieArc {
    /// Segment value.
    pub segment: String,
    /// Summed measure; negative sums get no angle.
    pub value: f64,
    /// Clockwise from twelve o'clock, in radians.
    pub start_angle: f64,
    /// Clockwise from twelve o'clock, in radians.
    pub end_angle: f64,
}

impl PieArc {
    /// Angle in the middle of the arc.
    pub fn mid_angle(&self) -> f64 {
        (self.start_angle + self.end_angle) / 2.0
    }
}

/// Resolved state of a pie chart.
#[derive(Clone, Debug)]
pub struct PieState {
    /// Arranged geometry.
    pub bounds: Bounds,
    /// Ordered segments.
    pub segments: Segments,
    /// Arc colors.
    pub colors: ColorScale,
    /// Arcs in segment order.
    pub arcs: Vec<PieArc>,
    /// Sum over all arcs.
    pub total: f64,
    /// Formatter for tooltip values.
    pub formatter: ValueFormatter,
    dimensions: ChartDimensions,
    segment: StringGetter,
}

/// Derives a pie chart.
#[tracing::instrument(skip_all, fields(y = %config.fields.y.component_id))]
pub fn derive_pie_state(config: &PieConfig, inputs: &ChartInputs<'_>) -> Result<PieState, ChartError> {
    let fields = &config.fields;
    let y_component = inputs.measure(&fields.y.component_id, "y")?;
    let segment_component = inputs.components.require(&fields.segment.component_id)?;
    let value = NumericGetter::new(y_component.id.clone());
    let segment = StringGetter::new(segment_component.id.clone());
    let views = DataViews::new(
        inputs,
        &config.interactive_filters_config,
        None,
        Some(&segment),
        false,
    );
    let segments = resolve_segments(&fields.segment, segment_component, &segment, &views, Some(&value));

    let sums = sums_by_key(views.chart.iter(), |o| segment.get(o), |o| value.get(o));
    let sized: Vec<(String, f64)> = segments
        .segments
        .iter()
        .filter_map(|s| Some((s.clone(), *sums.get(s)?)))
        .collect();
    let total: f64 = sized.iter().map(|(_, v)| v.max(0.0)).sum();
    let mut angle = 0.0;
    let arcs = sized
        .into_iter()
        .map(|(segment, value)| {
            let sweep = if total > 0.0 {
                value.max(0.0) / total * TAU
            } else {
                0.0
            };
            let start_angle = angle;
            angle += sweep;
            PieArc {
                segment,
                value,
                start_angle,
                end_angle: angle,
            }
        })
        .collect::<Vec<_>>();

    let dims = inputs.dimensions;
    let bounds = Bounds::arrange(&dims, Insets::uniform(MIN_MARGIN));
    let colors = segment_colors(&fields.color, Some(&segments), Some(segment_component));
    tracing::debug!(arcs = arcs.len(), total, "derived pie chart");

    Ok(PieState {
        bounds,
        segments,
        colors,
        arcs,
        total,
        formatter: value_formatter(y_component, false),
        dimensions: dims,
        segment,
    })
}

impl PieState {
    /// Outer radius.
    pub fn radius(&self) -> f64 {
        self.bounds.chart_width.min(self.bounds.chart_height) / 2.0
    }

    /// Pie center in plot coordinates.
    pub fn center(&self) -> Point {
        Point::new(self.bounds.chart_width / 2.0, self.bounds.chart_height / 2.0)
    }

    /// Point at `radius` from the center along a clock angle.
    pub fn point_at(&self, angle: f64, radius: f64) -> Point {
        let c = self.center();
        Point::new(c.x + radius * angle.sin(), c.y - radius * angle.cos())
    }

    /// Arc centroid at half the radius.
    pub fn centroid(&self, arc: &PieArc) -> Point {
        self.point_at(arc.mid_angle(), self.radius() / 2.0)
    }

    /// Wedge geometry of an arc.
    pub fn wedge(&self, arc: &PieArc) -> CircleSegment {
        CircleSegment::new(
            self.center(),
            self.radius(),
            0.0,
            arc.start_angle - FRAC_PI_2,
            arc.end_angle - arc.start_angle,
        )
    }

    fn arc_of(&self, o: &Observation) -> Option<&PieArc> {
        let key = self.segment.get(o)?;
        self.arcs.iter().find(|a| a.segment == key)
    }

    /// Tooltip for the hovered arc, anchored at its centroid.
    pub fn tooltip_info(&self, o: &Observation) -> Option<TooltipInfo> {
        let arc = self.arc_of(o)?;
        let anchor = self.centroid(arc);
        let share = if self.total > 0.0 { arc.value / self.total } else { f64::NAN };
        Some(TooltipInfo {
            x_anchor: anchor.x,
            y_anchor: anchor.y,
            placement: tooltip::placement(&self.dimensions, self.bounds.chart_width, anchor.x, false),
            datum: TooltipValue {
                label: self.segments.label(&arc.segment).into(),
                value: self.formatter.format_with_unit(arc.value),
                error: None,
                color: Some(self.colors.for_key(&arc.segment)),
            },
            values: alloc::vec![TooltipValue {
                label: self.segments.label(&arc.segment).into(),
                value: ValueFormatter::percent().format_with_unit(share),
                error: None,
                color: None,
            }],
        })
    }

    /// Highlight at the outer edge of the hovered arc.
    pub fn annotation_info(&self, o: &Observation) -> Option<AnnotationInfo> {
        let arc = self.arc_of(o)?;
        let p = self.point_at(arc.mid_angle(), self.radius());
        Some(AnnotationInfo {
            x: p.x,
            y: p.y,
            color: self.colors.for_key(&arc.segment),
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use cubeviz_core::{
        Component, ComponentKind, Components, InteractiveFiltersState, MeasureField, PieFields,
        SegmentField, Sorting, SortingOrder, SortingType,
    };
    use cubeviz_text::HeuristicTextMeasurer;

    use super::*;

    #[test]
    fn arcs_cover_the_circle_in_measure_order() {
        let components = Components::new(vec![
            Component::new("val", "Value", ComponentKind::NumericalMeasure),
            Component::new("cat", "Category", ComponentKind::NominalDimension),
        ]);
        let observations: Vec<Observation> = [("a", 1.0), ("b", 3.0), ("c", -2.0), ("a", 1.0)]
            .into_iter()
            .map(|(c, v)| Observation::new().with("cat", c).with("val", v))
            .collect();
        let mut segment = SegmentField::new("cat");
        segment.sorting = Some(Sorting::new(SortingType::ByMeasure, SortingOrder::Desc));
        let config = PieConfig::new(PieFields {
            y: MeasureField::new("val"),
            segment,
            color: cubeviz_core::ColorField::default(),
        });
        let filters = InteractiveFiltersState::default();
        let inputs = ChartInputs::new(
            &observations,
            &components,
            &filters,
            ChartDimensions::new(400.0).with_aspect_ratio(1.0),
            &HeuristicTextMeasurer,
        );
        let state = derive_pie_state(&config, &inputs).unwrap();
        let order: Vec<&str> = state.arcs.iter().map(|a| a.segment.as_str()).collect();
        assert_eq!(order, ["b", "a", "c"]);
        assert!((state.arcs[1].end_angle - TAU).abs() < 1e-12);
        assert_eq!(state.arcs[2].start_angle, state.arcs[2].end_angle);
        assert!((state.arcs[0].end_angle - TAU * 0.6).abs() < 1e-12);
        let top = state.point_at(0.0, state.radius());
        assert!((top.x - state.center().x).abs() < 1e-9);
        assert!(top.y < state.center().y);
    }
}
