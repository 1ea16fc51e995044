// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line charts: one series per segment over a time axis.
//!
//! Lines never impute. A missing value breaks the line instead of dropping it to zero.

use alloc::string::String;
use alloc::vec::Vec;

use cubeviz_core::{ChartError, Component, LineConfig, Limit, Observation, TimeUnit};
use kurbo::BezPath;
use peniko::Color;

use crate::accessors::{ErrorGetter, NumericGetter, StringGetter, TemporalGetter};
use crate::chart_data::{
    Axis, ChartInputs, DataViews, Segments, X_TICK_SPACING, Y_TICK_SPACING, active_limits,
    domain_options, limit_values, padding_labels, resolve_segments, segment_colors,
    segment_encoding, tick_count, value_formatter,
};
use crate::color::ColorScale;
use crate::format::ValueFormatter;
use crate::layout::{Bounds, ChartDimensions};
use crate::padding::ChartPadding;
use crate::scale::{
    DomainOptions, ScaleLinear, ScaleLinearSpec, ScaleTime, ScaleTimeSpec, numeric_domain,
};
use crate::time::{format_time, format_time_tick};
use crate::tooltip::{self, AnnotationInfo, TooltipInfo, TooltipValue, in_segment_order};

/// A point on a line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePoint {
    /// Seconds since the epoch.
    pub t: f64,
    /// Measure value; `NaN` breaks the line.
    pub value: f64,
    /// Error range.
    pub error: Option<(f64, f64)>,
}

/// One line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSeries {
    /// Segment value, or the measure id for multi-measure charts.
    pub key: String,
    /// Points sorted by time.
    pub points: Vec<LinePoint>,
}

/// Resolved state of a line chart.
#[derive(Clone, Debug)]
pub struct LineState {
    /// Arranged geometry.
    pub bounds: Bounds,
    /// Time axis.
    pub x_scale: ScaleTime,
    /// Full time extent for the range brush.
    pub x_scale_time_range: ScaleTime,
    /// Measure axis.
    pub y_scale: ScaleLinear,
    /// Time axis ticks.
    pub x_axis: Axis,
    /// Measure axis ticks.
    pub y_axis: Axis,
    /// Ordered segments.
    pub segments: Option<Segments>,
    /// Stroke colors.
    pub colors: ColorScale,
    /// Lines in segment order.
    pub series: Vec<LineSeries>,
    /// Limits drawn on the measure axis.
    pub limits: Vec<Limit>,
    /// Formatter for tooltip values.
    pub formatter: ValueFormatter,
    time_unit: Option<TimeUnit>,
    dimensions: ChartDimensions,
    time: TemporalGetter,
    value: NumericGetter,
    segment: Option<StringGetter>,
    error: Option<ErrorGetter>,
}

/// Time getter for an x field, which must be temporal.
pub(crate) fn temporal_x(component: &Component) -> Result<TemporalGetter, ChartError> {
    if component.kind.is_temporal() {
        Ok(TemporalGetter::new(component))
    } else {
        Err(ChartError::InvalidComponent {
            id: component.id.clone(),
            role: "x",
            expected: "a temporal dimension",
        })
    }
}

/// Extent of the timestamps in `rows`.
pub(crate) fn time_domain(rows: &[&Observation], time: &TemporalGetter) -> (f64, f64) {
    numeric_domain(
        rows.iter().filter_map(|o| time.get(o)),
        &DomainOptions::default(),
    )
}

/// Time ticks and labels for a domain and a plot width.
pub(crate) fn time_axis(title: &str, domain: (f64, f64), width: f64) -> Axis {
    let scale = ScaleTimeSpec::new(domain).instantiate((0.0, width.max(1.0)));
    let ticks = scale.ticks(tick_count(width, X_TICK_SPACING));
    let step = match ticks.as_slice() {
        [a, b, ..] => b - a,
        _ => domain.1 - domain.0,
    };
    let labels = ticks.iter().map(|t| format_time_tick(*t, step)).collect();
    Axis {
        title: title.into(),
        ticks,
        labels,
    }
}

/// A polyline through finite points, broken at gaps.
pub(crate) fn line_path(points: impl IntoIterator<Item = (f64, f64)>) -> BezPath {
    let mut path = BezPath::new();
    let mut pen_down = false;
    for (x, y) in points {
        if !(x.is_finite() && y.is_finite()) {
            pen_down = false;
            continue;
        }
        if pen_down {
            path.line_to((x, y));
        } else {
            path.move_to((x, y));
            pen_down = true;
        }
    }
    path
}

/// Groups rows into series keyed by `key`, in `order`, sorted by time.
pub(crate) fn collect_series(
    rows: &[&Observation],
    order: &[String],
    time: &TemporalGetter,
    key: impl Fn(&Observation) -> Option<String>,
    value: impl Fn(&Observation) -> f64,
    error: impl Fn(&Observation, f64) -> Option<(f64, f64)>,
) -> Vec<LineSeries> {
    let mut series: Vec<LineSeries> = order
        .iter()
        .map(|k| LineSeries {
            key: k.clone(),
            points: Vec::new(),
        })
        .collect();
    for o in rows {
        let (Some(k), Some(t)) = (key(o), time.get(o)) else {
            continue;
        };
        if let Some(s) = series.iter_mut().find(|s| s.key == k) {
            let v = value(o);
            s.points.push(LinePoint {
                t,
                value: v,
                error: error(o, v),
            });
        }
    }
    for s in &mut series {
        s.points.sort_by(|a, b| a.t.total_cmp(&b.t));
    }
    series
}

/// Derives a line chart.
#[tracing::instrument(skip_all, fields(y = %config.fields.y.component_id))]
pub fn derive_line_state(config: &LineConfig, inputs: &ChartInputs<'_>) -> Result<LineState, ChartError> {
    let fields = &config.fields;
    let interactive = &config.interactive_filters_config;
    let x_component = inputs.components.require(&fields.x.component_id)?;
    let time = temporal_x(x_component)?;
    let y_component = inputs.measure(&fields.y.component_id, "y")?;
    let value = NumericGetter::new(y_component.id.clone());
    let error = ErrorGetter::for_measure(inputs.components, y_component, &fields.y);
    let segment_enc = segment_encoding(inputs.components, fields.segment.as_ref());
    let segment = segment_enc.as_ref().map(|(_, g)| g.clone());
    let views = DataViews::new(
        inputs,
        interactive,
        Some(&time),
        segment.as_ref(),
        fields.y.dynamic_scale,
    );
    let segments = match (&fields.segment, &segment_enc) {
        (Some(f), Some((c, g))) => Some(resolve_segments(f, c, g, &views, Some(&value))),
        _ => None,
    };

    let limits = active_limits(y_component, &fields.y);
    let limit_vals = limit_values(&limits);
    let options = domain_options(&fields.y, &limit_vals, !fields.y.dynamic_scale);
    let with_errors = |rows: &[&Observation]| -> Vec<f64> {
        rows.iter()
            .flat_map(|o| {
                let v = value.get(o);
                let (lo, hi) = error.as_ref().and_then(|e| e.get(o, v)).unwrap_or((v, v));
                [v, lo, hi]
            })
            .collect()
    };
    let y_domain = numeric_domain(with_errors(&views.scales[..]), &options);
    let padding_domain = numeric_domain(with_errors(&views.filtered[..]), &options);
    let x_domain = time_domain(&views.chart, &time);
    let full_x_domain = time_domain(&views.filtered, &time);

    let dims = inputs.dimensions;
    let y_ticks = tick_count(dims.width * dims.aspect_ratio, Y_TICK_SPACING);
    let y_labels = padding_labels(padding_domain, y_ticks, false);
    let x_padding_axis = time_axis(&x_component.label, full_x_domain, dims.width);
    let margins = ChartPadding {
        left_labels: &y_labels,
        bottom_labels: &x_padding_axis.labels,
        left_title: Some(y_component.label.as_str()),
        time_brush: interactive.time_range,
        ..ChartPadding::default()
    }
    .margins(inputs.measurer);
    let bounds = Bounds::arrange(&dims, margins);

    let x_scale = ScaleTimeSpec::new(x_domain).instantiate((0.0, bounds.chart_width));
    let x_scale_time_range = ScaleTimeSpec::new(full_x_domain).instantiate((0.0, bounds.chart_width));
    let y_scale = ScaleLinearSpec::new(y_domain)
        .with_nice(true)
        .instantiate((bounds.chart_height, 0.0), y_ticks);
    let x_axis = time_axis(&x_component.label, x_domain, bounds.chart_width);
    let y_axis = Axis::linear(y_component.label.clone(), &y_scale, y_ticks, false);

    let order: Vec<String> = match &segments {
        Some(s) => s.segments.clone(),
        None => alloc::vec![String::new()],
    };
    let series = collect_series(
        &views.chart,
        &order,
        &time,
        |o| match &segment {
            Some(s) => s.get(o),
            None => Some(String::new()),
        },
        |o| value.get(o),
        |o, v| error.as_ref().and_then(|e| e.get(o, v)),
    );
    let colors = segment_colors(&fields.color, segments.as_ref(), segment_enc.as_ref().map(|(c, _)| *c));
    tracing::debug!(series = series.len(), ?x_domain, ?y_domain, "derived line chart");

    Ok(LineState {
        bounds,
        x_scale,
        x_scale_time_range,
        y_scale,
        x_axis,
        y_axis,
        segments,
        colors,
        series,
        limits,
        formatter: value_formatter(y_component, false),
        time_unit: x_component.time_unit,
        dimensions: dims,
        time,
        value,
        segment,
        error,
    })
}

impl LineState {
    fn key_of(&self, o: &Observation) -> Option<String> {
        match &self.segment {
            Some(s) => s.get(o),
            None => Some(String::new()),
        }
    }

    /// Stroke paths in plot coordinates, one per series.
    pub fn paths(&self) -> Vec<(String, BezPath, Color)> {
        self.series
            .iter()
            .map(|s| {
                let path = line_path(
                    s.points
                        .iter()
                        .map(|p| (self.x_scale.map(p.t), self.y_scale.map(p.value))),
                );
                (s.key.clone(), path, self.colors.for_key(&s.key))
            })
            .collect()
    }

    /// The timestamp nearest to a pointer x coordinate.
    pub fn nearest_time(&self, px: f64) -> Option<f64> {
        let target = self.x_scale.invert(px);
        self.series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.t))
            .min_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()))
    }

    /// Tooltip for the hovered observation.
    pub fn tooltip_info(&self, o: &Observation) -> Option<TooltipInfo> {
        let t = self.time.get(o)?;
        let key = self.key_of(o)?;
        let value = self.value.get(o);
        let x_anchor = self.x_scale.map(t);
        let y_anchor = self.y_scale.map(if value.is_finite() { value } else { 0.0 });
        let color = self.colors.for_key(&key);
        let error = self
            .error
            .as_ref()
            .and_then(|e| e.get(o, value))
            .map(|e| self.formatter.format_error(value, e));
        let datum = TooltipValue {
            label: match &self.segments {
                Some(s) => s.label(&key).into(),
                None => format_time(t, self.time_unit),
            },
            value: self.formatter.format_with_unit(value),
            error,
            color: Some(color),
        };
        let values = match &self.segments {
            Some(segments) => in_segment_order(
                self.series
                    .iter()
                    .filter_map(|s| {
                        let p = s.points.iter().find(|p| p.t == t)?;
                        Some((
                            segments.index_of(&s.key).unwrap_or(usize::MAX),
                            TooltipValue {
                                label: segments.label(&s.key).into(),
                                value: self.formatter.format_with_unit(p.value),
                                error: p.error.map(|e| self.formatter.format_error(p.value, e)),
                                color: Some(self.colors.for_key(&s.key)),
                            },
                        ))
                    })
                    .collect(),
            ),
            None => Vec::new(),
        };
        Some(TooltipInfo {
            x_anchor,
            y_anchor,
            placement: tooltip::placement(&self.dimensions, self.bounds.chart_width, x_anchor, false),
            datum,
            values,
        })
    }

    /// Highlight for the hovered observation.
    pub fn annotation_info(&self, o: &Observation) -> Option<AnnotationInfo> {
        let t = self.time.get(o)?;
        let key = self.key_of(o)?;
        let value = self.value.get(o);
        Some(AnnotationInfo {
            x: self.x_scale.map(t),
            y: self.y_scale.map(if value.is_finite() { value } else { 0.0 }),
            color: self.colors.for_key(&key),
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use kurbo::PathEl;

    use super::*;

    #[test]
    fn gaps_break_the_line() {
        let path = line_path([(0.0, 0.0), (1.0, 1.0), (2.0, f64::NAN), (3.0, 3.0), (4.0, 4.0)]);
        let moves = path
            .elements()
            .iter()
            .filter(|e| matches!(e, PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
        assert_eq!(path.elements().len(), 4);
    }
}
