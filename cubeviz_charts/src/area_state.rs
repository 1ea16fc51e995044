// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stacked area charts over a time axis.

use alloc::string::String;
use alloc::vec::Vec;

use cubeviz_core::{
    AreaConfig, Calculation, ChartError, ImputationType, Limit, Observation, TimeUnit,
};
use cubeviz_transforms::{
    LongRow, StackOffset, StackOrder, StackSeries, WideFrame, percent_of, pivot_wide, stack,
    stack_extent, unique_in_order,
};
use kurbo::BezPath;
use peniko::Color;

use crate::accessors::{NumericGetter, StringGetter, TemporalGetter};
use crate::chart_data::{
    Axis, ChartInputs, DataViews, Segments, Y_TICK_SPACING, active_limits, domain_options,
    limit_values, padding_labels, resolve_segments, segment_colors, segment_encoding, tick_count,
    value_formatter,
};
use crate::color::ColorScale;
use crate::format::ValueFormatter;
use crate::layout::{Bounds, ChartDimensions};
use crate::line_state::{temporal_x, time_axis, time_domain};
use crate::padding::ChartPadding;
use crate::scale::{ScaleLinear, ScaleLinearSpec, ScaleTime, ScaleTimeSpec, numeric_domain};
use crate::time::format_time;
use crate::tooltip::{self, AnnotationInfo, TooltipInfo, TooltipValue, in_segment_order};

/// Resolved state of an area chart.
#[derive(Clone, Debug)]
pub struct AreaState {
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
    /// Fill colors.
    pub colors: ColorScale,
    /// Time keys by segments, after imputation.
    pub frame: WideFrame,
    /// Stack layout in segment order.
    pub series: Vec<StackSeries>,
    /// Values are fractions of their time step total.
    pub percent: bool,
    /// Limits drawn on the measure axis.
    pub limits: Vec<Limit>,
    /// Formatter for tooltip values.
    pub formatter: ValueFormatter,
    time_unit: Option<TimeUnit>,
    dimensions: ChartDimensions,
    x: StringGetter,
    time: TemporalGetter,
    value: NumericGetter,
    segment: Option<StringGetter>,
}

struct Stacker<'g> {
    x: &'g StringGetter,
    time: &'g TemporalGetter,
    value: &'g NumericGetter,
    segment: Option<&'g StringGetter>,
    segments: &'g [String],
    imputation: ImputationType,
    order: StackOrder,
}

impl Stacker<'_> {
    fn segment_of(&self, o: &Observation) -> Option<String> {
        match self.segment {
            Some(s) => s.get(o),
            None => Some(String::new()),
        }
    }

    /// Pivots `rows` to time keys sorted by time.
    fn frame(&self, rows: &[&Observation]) -> WideFrame {
        let mut cells: Vec<(String, f64, String, f64)> = rows
            .iter()
            .filter_map(|o| {
                Some((
                    self.x.get(o)?,
                    self.time.get(o)?,
                    self.segment_of(o)?,
                    self.value.get(o),
                ))
            })
            .collect();
        cells.sort_by(|a, b| a.1.total_cmp(&b.1));
        let keys = unique_in_order(cells.iter().map(|c| c.0.as_str()));
        let long = cells.iter().map(|(key, t, segment, value)| LongRow {
            key: key.as_str(),
            position: *t,
            segment: segment.as_str(),
            value: *value,
        });
        pivot_wide(long, &keys, self.segments, self.imputation)
    }

    fn stack(&self, frame: &WideFrame, percent: bool) -> Vec<StackSeries> {
        let offset = if percent {
            StackOffset::Normalize
        } else {
            StackOffset::Diverging
        };
        stack(frame, self.order, offset)
    }
}

/// Derives an area chart.
///
/// Absent cells follow the segment's imputation (none by default, so gaps have zero
/// height and no tooltip line). The percent toggle normalizes every time step.
#[tracing::instrument(skip_all, fields(y = %config.fields.y.component_id))]
pub fn derive_area_state(config: &AreaConfig, inputs: &ChartInputs<'_>) -> Result<AreaState, ChartError> {
    let fields = &config.fields;
    let interactive = &config.interactive_filters_config;
    let x_component = inputs.components.require(&fields.x.component_id)?;
    let time = temporal_x(x_component)?;
    let x = StringGetter::new(x_component.id.clone());
    let y_component = inputs.measure(&fields.y.component_id, "y")?;
    let value = NumericGetter::new(y_component.id.clone());
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
    let segment_values: Vec<String> = match &segments {
        Some(s) => s.segments.clone(),
        None => alloc::vec![String::new()],
    };
    let percent = segments.is_some()
        && interactive.calculation
        && inputs.filters.calculation == Calculation::Percent;
    let stacker = Stacker {
        x: &x,
        time: &time,
        value: &value,
        segment: segment.as_ref(),
        segments: &segment_values,
        imputation: fields
            .segment
            .as_ref()
            .map_or(ImputationType::None, |s| s.imputation_type),
        order: StackOrder::from_sorting(fields.segment.as_ref().and_then(|s| s.sorting.as_ref())),
    };

    let limits = active_limits(y_component, &fields.y);
    let limit_vals = limit_values(&limits);
    let options = domain_options(&fields.y, &limit_vals, true);
    let extent = |rows: &[&Observation], percent: bool| {
        let frame = stacker.frame(rows);
        stack_extent(&stacker.stack(&frame, percent))
            .map(|(lo, hi)| alloc::vec![lo, hi])
            .unwrap_or_default()
    };
    let y_domain = numeric_domain(extent(&views.scales[..], percent), &options);
    let padding_domain = numeric_domain(extent(&views.filtered[..], false), &options);
    let x_domain = time_domain(&views.chart, &time);
    let full_x_domain = time_domain(&views.filtered, &time);

    let dims = inputs.dimensions;
    let y_ticks = tick_count(dims.width * dims.aspect_ratio, Y_TICK_SPACING);
    let y_labels = padding_labels(
        padding_domain,
        y_ticks,
        segments.is_some() && interactive.calculation,
    );
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
    let y_axis = Axis::linear(y_component.label.clone(), &y_scale, y_ticks, percent);

    let frame = stacker.frame(&views.chart);
    let series = stacker.stack(&frame, percent);
    let colors = segment_colors(&fields.color, segments.as_ref(), segment_enc.as_ref().map(|(c, _)| *c));
    tracing::debug!(
        steps = frame.row_count(),
        segments = frame.segments.len(),
        ?y_domain,
        percent,
        "derived area chart"
    );

    Ok(AreaState {
        bounds,
        x_scale,
        x_scale_time_range,
        y_scale,
        x_axis,
        y_axis,
        segments,
        colors,
        frame,
        series,
        percent,
        limits,
        formatter: value_formatter(y_component, percent),
        time_unit: x_component.time_unit,
        dimensions: dims,
        x,
        time,
        value,
        segment,
    })
}

impl AreaState {
    fn segment_of(&self, o: &Observation) -> Option<String> {
        match &self.segment {
            Some(s) => s.get(o),
            None => Some(String::new()),
        }
    }

    /// Closed area outlines in plot coordinates, one per segment.
    pub fn areas(&self) -> Vec<(String, BezPath, Color)> {
        self.series
            .iter()
            .map(|s| {
                let xs: Vec<f64> = self.frame.positions.iter().map(|t| self.x_scale.map(*t)).collect();
                let mut path = BezPath::new();
                for (i, (x, p)) in xs.iter().zip(&s.points).enumerate() {
                    let pt = (*x, self.y_scale.map(p.y1));
                    if i == 0 {
                        path.move_to(pt);
                    } else {
                        path.line_to(pt);
                    }
                }
                for (x, p) in xs.iter().zip(&s.points).rev() {
                    path.line_to((*x, self.y_scale.map(p.y0)));
                }
                if !s.points.is_empty() {
                    path.close_path();
                }
                (s.segment.clone(), path, self.colors.for_key(&s.segment))
            })
            .collect()
    }

    /// Value shown for a cell, as a fraction in percent mode.
    fn shown(&self, row: usize, column: usize) -> Option<f64> {
        let v = self.frame.get(row, column)?;
        Some(if self.percent {
            percent_of(v, self.frame.row_total(row))
        } else {
            v
        })
    }

    /// Tooltip for the hovered observation.
    pub fn tooltip_info(&self, o: &Observation) -> Option<TooltipInfo> {
        let key = self.x.get(o)?;
        let t = self.time.get(o)?;
        let segment = self.segment_of(o)?;
        let row = self.frame.row_index(&key)?;
        let column = self.frame.segment_index(&segment);
        let top = self
            .series
            .iter()
            .filter_map(|s| s.points.get(row))
            .map(|p| p.max())
            .reduce(f64::max)
            .unwrap_or(0.0);
        let x_anchor = self.x_scale.map(t);
        // Imputed cells only position the stack; a missing value is shown as missing.
        let shown = if self.value.get(o).is_finite() {
            column.and_then(|c| self.shown(row, c)).unwrap_or(f64::NAN)
        } else {
            f64::NAN
        };
        let color = self.colors.for_key(&segment);
        let datum = TooltipValue {
            label: match &self.segments {
                Some(s) => s.label(&segment).into(),
                None => format_time(t, self.time_unit),
            },
            value: self.formatter.format_with_unit(shown),
            error: None,
            color: Some(color),
        };
        let values = match &self.segments {
            Some(segments) => in_segment_order(
                self.frame
                    .segments
                    .iter()
                    .enumerate()
                    .filter_map(|(c, s)| {
                        let v = self.shown(row, c)?;
                        Some((
                            segments.index_of(s).unwrap_or(usize::MAX),
                            TooltipValue {
                                label: segments.label(s).into(),
                                value: self.formatter.format_with_unit(v),
                                error: None,
                                color: Some(self.colors.for_key(s)),
                            },
                        ))
                    })
                    .collect(),
            ),
            None => Vec::new(),
        };
        Some(TooltipInfo {
            x_anchor,
            y_anchor: self.y_scale.map(top),
            placement: tooltip::placement(&self.dimensions, self.bounds.chart_width, x_anchor, false),
            datum,
            values,
        })
    }

    /// Highlight at the top of the hovered segment.
    pub fn annotation_info(&self, o: &Observation) -> Option<AnnotationInfo> {
        let key = self.x.get(o)?;
        let t = self.time.get(o)?;
        let segment = self.segment_of(o)?;
        let row = self.frame.row_index(&key)?;
        let column = self.frame.segment_index(&segment)?;
        let p = self.series.get(column)?.points.get(row)?;
        Some(AnnotationInfo {
            x: self.x_scale.map(t),
            y: self.y_scale.map(p.y1),
            color: self.colors.for_key(&segment),
        })
    }
}
