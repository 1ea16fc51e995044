// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scatterplots: two measures against each other.

use alloc::string::String;
use alloc::vec::Vec;

use cubeviz_core::{ChartError, Observation, ScatterplotConfig};
use kurbo::Point;
use peniko::Color;

use crate::accessors::{NumericGetter, StringGetter};
use crate::chart_data::{
    Axis, ChartInputs, DataViews, Segments, X_TICK_SPACING, Y_TICK_SPACING, active_limits,
    domain_options, limit_values, padding_labels, resolve_segments, segment_colors,
    segment_encoding, tick_count, value_formatter,
};
use crate::color::ColorScale;
use crate::format::ValueFormatter;
use crate::layout::{Bounds, ChartDimensions};
use crate::padding::ChartPadding;
use crate::scale::{ScaleLinear, ScaleLinearSpec, numeric_domain};
use crate::tooltip::{self, AnnotationInfo, TooltipInfo, TooltipValue};

/// Radius of a scatterplot dot.
pub const DOT_RADIUS: f64 = 4.0;

/// One plotted dot, in data units.
#[derive(Clone, Debug, PartialEq)]
pub struct ScatterPoint {
    /// Horizontal measure.
    pub x: f64,
    /// Vertical measure.
    pub y: f64,
    /// Segment value, empty without a segment.
    pub segment: String,
}

/// Resolved state of a scatterplot.
#[derive(Clone, Debug)]
pub struct ScatterplotState {
    /// Arranged geometry.
    pub bounds: Bounds,
    /// Horizontal measure axis.
    pub x_scale: ScaleLinear,
    /// Vertical measure axis.
    pub y_scale: ScaleLinear,
    /// Horizontal ticks.
    pub x_axis: Axis,
    /// Vertical ticks.
    pub y_axis: Axis,
    /// Ordered segments.
    pub segments: Option<Segments>,
    /// Dot colors.
    pub colors: ColorScale,
    /// Dots with both coordinates present, in segment order.
    pub points: Vec<ScatterPoint>,
    /// Formatter for the horizontal measure.
    pub x_formatter: ValueFormatter,
    /// Formatter for the vertical measure.
    pub y_formatter: ValueFormatter,
    x_title: String,
    y_title: String,
    dimensions: ChartDimensions,
    x: NumericGetter,
    y: NumericGetter,
    segment: Option<StringGetter>,
}

/// Derives a scatterplot.
#[tracing::instrument(skip_all, fields(x = %config.fields.x.component_id, y = %config.fields.y.component_id))]
pub fn derive_scatterplot_state(
    config: &ScatterplotConfig,
    inputs: &ChartInputs<'_>,
) -> Result<ScatterplotState, ChartError> {
    let fields = &config.fields;
    let interactive = &config.interactive_filters_config;
    let x_component = inputs.measure(&fields.x.component_id, "x")?;
    let y_component = inputs.measure(&fields.y.component_id, "y")?;
    let x = NumericGetter::new(x_component.id.clone());
    let y = NumericGetter::new(y_component.id.clone());
    let segment_enc = segment_encoding(inputs.components, fields.segment.as_ref());
    let segment = segment_enc.as_ref().map(|(_, g)| g.clone());
    let views = DataViews::new(inputs, interactive, None, segment.as_ref(), false);
    let segments = match (&fields.segment, &segment_enc) {
        (Some(f), Some((c, g))) => Some(resolve_segments(f, c, g, &views, None)),
        _ => None,
    };

    let x_limits = limit_values(&active_limits(x_component, &fields.x));
    let y_limits = limit_values(&active_limits(y_component, &fields.y));
    let x_options = domain_options(&fields.x, &x_limits, true);
    let y_options = domain_options(&fields.y, &y_limits, true);
    let x_of = |rows: &[&Observation]| rows.iter().map(|o| x.get(o)).collect::<Vec<_>>();
    let y_of = |rows: &[&Observation]| rows.iter().map(|o| y.get(o)).collect::<Vec<_>>();
    let x_domain = numeric_domain(x_of(&views.scales[..]), &x_options);
    let y_domain = numeric_domain(y_of(&views.scales[..]), &y_options);
    let padding_domain = numeric_domain(y_of(&views.filtered[..]), &y_options);

    let dims = inputs.dimensions;
    let x_ticks = tick_count(dims.width, X_TICK_SPACING);
    let y_ticks = tick_count(dims.width * dims.aspect_ratio, Y_TICK_SPACING);
    let y_labels = padding_labels(padding_domain, y_ticks, false);
    let margins = ChartPadding {
        left_labels: &y_labels,
        left_title: Some(y_component.label.as_str()),
        bottom_title: Some(x_component.label.as_str()),
        ..ChartPadding::default()
    }
    .margins(inputs.measurer);
    let bounds = Bounds::arrange(&dims, margins);

    let x_scale = ScaleLinearSpec::new(x_domain)
        .with_nice(true)
        .instantiate((0.0, bounds.chart_width), x_ticks);
    let y_scale = ScaleLinearSpec::new(y_domain)
        .with_nice(true)
        .instantiate((bounds.chart_height, 0.0), y_ticks);
    let x_axis = Axis::linear(x_component.label.clone(), &x_scale, x_ticks, false);
    let y_axis = Axis::linear(y_component.label.clone(), &y_scale, y_ticks, false);

    let segment_of = |o: &Observation| match &segment {
        Some(s) => s.get(o),
        None => Some(String::new()),
    };
    let mut points: Vec<ScatterPoint> = views
        .chart
        .iter()
        .filter_map(|o| {
            let (px, py) = (x.get(o), y.get(o));
            if !(px.is_finite() && py.is_finite()) {
                return None;
            }
            Some(ScatterPoint {
                x: px,
                y: py,
                segment: segment_of(o)?,
            })
        })
        .collect();
    if let Some(s) = &segments {
        points.sort_by_key(|p| s.index_of(&p.segment).unwrap_or(usize::MAX));
    }
    let colors = segment_colors(&fields.color, segments.as_ref(), segment_enc.as_ref().map(|(c, _)| *c));
    tracing::debug!(points = points.len(), ?x_domain, ?y_domain, "derived scatterplot");

    Ok(ScatterplotState {
        bounds,
        x_scale,
        y_scale,
        x_axis,
        y_axis,
        segments,
        colors,
        points,
        x_formatter: value_formatter(x_component, false),
        y_formatter: value_formatter(y_component, false),
        x_title: x_component.label.clone(),
        y_title: y_component.label.clone(),
        dimensions: dims,
        x,
        y,
        segment,
    })
}

impl ScatterplotState {
    fn segment_of(&self, o: &Observation) -> Option<String> {
        match &self.segment {
            Some(s) => s.get(o),
            None => Some(String::new()),
        }
    }

    /// Dot centers in plot coordinates with their colors.
    pub fn dots(&self) -> Vec<(Point, Color)> {
        self.points
            .iter()
            .map(|p| {
                (
                    Point::new(self.x_scale.map(p.x), self.y_scale.map(p.y)),
                    self.colors.for_key(&p.segment),
                )
            })
            .collect()
    }

    /// Tooltip for the hovered dot: both coordinates.
    pub fn tooltip_info(&self, o: &Observation) -> Option<TooltipInfo> {
        let (x, y) = (self.x.get(o), self.y.get(o));
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let segment = self.segment_of(o)?;
        let color = self.colors.for_key(&segment);
        let x_anchor = self.x_scale.map(x);
        let label = match &self.segments {
            Some(s) => s.label(&segment).into(),
            None => self.y_title.clone(),
        };
        Some(TooltipInfo {
            x_anchor,
            y_anchor: self.y_scale.map(y),
            placement: tooltip::placement(&self.dimensions, self.bounds.chart_width, x_anchor, false),
            datum: TooltipValue {
                label,
                value: self.y_formatter.format_with_unit(y),
                error: None,
                color: Some(color),
            },
            values: alloc::vec![
                TooltipValue {
                    label: self.x_title.clone(),
                    value: self.x_formatter.format_with_unit(x),
                    error: None,
                    color: None,
                },
                TooltipValue {
                    label: self.y_title.clone(),
                    value: self.y_formatter.format_with_unit(y),
                    error: None,
                    color: None,
                },
            ],
        })
    }

    /// Highlight for the hovered dot.
    pub fn annotation_info(&self, o: &Observation) -> Option<AnnotationInfo> {
        let (x, y) = (self.x.get(o), self.y.get(o));
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        Some(AnnotationInfo {
            x: self.x_scale.map(x),
            y: self.y_scale.map(y),
            color: self.colors.for_key(&self.segment_of(o)?),
        })
    }
}
