// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Combo charts: several measures over one time axis.
//!
//! Combo data is wide. Every observation carries all plotted measures, so each measure
//! becomes its own series and is colored by measure id rather than by a segment.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use cubeviz_core::{
    ChartError, ColorField, ComboLineColumnConfig, ComboLineDualConfig, ComboLineSingleConfig,
    Component, GenericField, InteractiveFiltersConfig, LineAxisOrientation, Observation,
    TimeUnit,
};
use cubeviz_transforms::unique_in_order;
use kurbo::{BezPath, Rect};
use peniko::Color;

use crate::accessors::{NumericGetter, StringGetter, TemporalGetter};
use crate::chart_data::{
    Axis, ChartInputs, DataViews, Y_TICK_SPACING, padding_labels, tick_count, value_formatter,
};
use crate::color::{ColorScale, categorical_colors};
use crate::format::ValueFormatter;
use crate::layout::{Bounds, ChartDimensions};
use crate::line_state::{LineSeries, collect_series, line_path, temporal_x, time_axis, time_domain};
use crate::padding::ChartPadding;
use crate::scale::{
    DomainOptions, ScaleBand, ScaleBandSpec, ScaleLinear, ScaleLinearSpec, ScaleTime,
    ScaleTimeSpec, numeric_domain,
};
use crate::time::format_time;
use crate::tooltip::{self, AnnotationInfo, TooltipInfo, TooltipValue};

/// Band padding of the line-column x axis.
const COMBO_BAND_PADDING: (f64, f64) = (0.3, 0.2);

/// One plotted measure.
#[derive(Clone, Debug)]
pub struct ComboMeasure {
    /// Component id; also the series key and color key.
    pub id: String,
    /// Legend and tooltip label.
    pub label: String,
    /// Value formatter.
    pub formatter: ValueFormatter,
    getter: NumericGetter,
}

impl ComboMeasure {
    fn new(component: &Component) -> Self {
        Self {
            id: component.id.clone(),
            label: component.label.clone(),
            formatter: value_formatter(component, false),
            getter: NumericGetter::new(component.id.clone()),
        }
    }

    /// Value of the observation.
    pub fn get(&self, o: &Observation) -> f64 {
        self.getter.get(o)
    }

    fn tooltip_value(&self, o: &Observation, colors: &ColorScale) -> TooltipValue {
        TooltipValue {
            label: self.label.clone(),
            value: self.formatter.format_with_unit(self.get(o)),
            error: None,
            color: Some(colors.for_key(&self.id)),
        }
    }
}

/// A measure axis with the measures it carries.
#[derive(Clone, Debug)]
pub struct ComboAxis {
    /// Measures on this axis.
    pub measures: Vec<ComboMeasure>,
    /// Value scale.
    pub scale: ScaleLinear,
    /// Ticks and title.
    pub axis: Axis,
}

impl ComboAxis {
    fn carries(&self, id: &str) -> bool {
        self.measures.iter().any(|m| m.id == id)
    }
}

fn measures(inputs: &ChartInputs<'_>, ids: &[&str], role: &'static str) -> Result<Vec<ComboMeasure>, ChartError> {
    ids.iter()
        .map(|id| inputs.measure(id, role).map(ComboMeasure::new))
        .collect()
}

/// Extent of several measures over `rows`, floored at zero.
fn measures_domain(rows: &[&Observation], measures: &[ComboMeasure]) -> (f64, f64) {
    numeric_domain(
        rows.iter().flat_map(|o| measures.iter().map(|m| m.get(o))),
        &DomainOptions {
            floor_zero: true,
            ..DomainOptions::default()
        },
    )
}

/// Colors keyed by measure id.
fn measure_colors(color: Option<&ColorField>, ids: &[String]) -> ColorScale {
    let no_mapping = BTreeMap::new();
    let (palette, mapping) = match color {
        Some(ColorField::Measures {
            palette_id,
            color_mapping,
        }) => (palette_id.as_deref(), color_mapping),
        _ => (None, &no_mapping),
    };
    ColorScale::Categorical(categorical_colors(ids, palette, mapping, None))
}

fn axis_title(measures: &[ComboMeasure]) -> String {
    let labels: Vec<&str> = measures.iter().map(|m| m.label.as_str()).collect();
    labels.join(", ")
}

/// Resolved state of a line-single or line-dual combo.
#[derive(Clone, Debug)]
pub struct ComboLineState {
    /// Arranged geometry.
    pub bounds: Bounds,
    /// Time axis.
    pub x_scale: ScaleTime,
    /// Full time extent for the range brush.
    pub x_scale_time_range: ScaleTime,
    /// Time axis ticks.
    pub x_axis: Axis,
    /// Left axis.
    pub left: ComboAxis,
    /// Right axis (line-dual only).
    pub right: Option<ComboAxis>,
    /// One line per measure, keyed by measure id.
    pub series: Vec<LineSeries>,
    /// Colors keyed by measure id.
    pub colors: ColorScale,
    time_unit: Option<TimeUnit>,
    dimensions: ChartDimensions,
    time: TemporalGetter,
}

struct TimeContext<'a> {
    time: TemporalGetter,
    x_component: &'a Component,
    views: DataViews<'a>,
}

fn time_context<'a>(
    inputs: &ChartInputs<'a>,
    x: &GenericField,
    interactive: &InteractiveFiltersConfig,
) -> Result<TimeContext<'a>, ChartError> {
    let x_component = inputs.components.require(&x.component_id)?;
    let time = temporal_x(x_component)?;
    let views = DataViews::new(inputs, interactive, Some(&time), None, false);
    Ok(TimeContext {
        time,
        x_component,
        views,
    })
}

fn derive_combo_lines(
    ctx: TimeContext<'_>,
    inputs: &ChartInputs<'_>,
    left: Vec<ComboMeasure>,
    right: Option<Vec<ComboMeasure>>,
    color: Option<&ColorField>,
    time_brush: bool,
) -> ComboLineState {
    let TimeContext {
        time,
        x_component,
        views,
    } = ctx;
    let dims = inputs.dimensions;
    let y_ticks = tick_count(dims.width * dims.aspect_ratio, Y_TICK_SPACING);
    let left_labels = padding_labels(measures_domain(&views.filtered, &left), y_ticks, false);
    let right_labels = right
        .as_ref()
        .map(|r| padding_labels(measures_domain(&views.filtered, r), y_ticks, false))
        .unwrap_or_default();
    let left_title = axis_title(&left);
    let right_title = right.as_deref().map(axis_title);
    let x_domain = time_domain(&views.chart, &time);
    let full_x_domain = time_domain(&views.filtered, &time);
    let x_padding_axis = time_axis(&x_component.label, full_x_domain, dims.width);
    let margins = ChartPadding {
        left_labels: &left_labels,
        right_labels: &right_labels,
        bottom_labels: &x_padding_axis.labels,
        left_title: Some(left_title.as_str()),
        right_title: right_title.as_deref(),
        time_brush,
        ..ChartPadding::default()
    }
    .margins(inputs.measurer);
    let bounds = Bounds::arrange(&dims, margins);

    let y_axis = |measures: Vec<ComboMeasure>, title: String| {
        let scale = ScaleLinearSpec::new(measures_domain(&views.scales, &measures))
            .with_nice(true)
            .instantiate((bounds.chart_height, 0.0), y_ticks);
        let axis = Axis::linear(title, &scale, y_ticks, false);
        ComboAxis {
            measures,
            scale,
            axis,
        }
    };
    let left = y_axis(left, left_title);
    let right = right.map(|r| {
        let title = axis_title(&r);
        y_axis(r, title)
    });

    let all: Vec<&ComboMeasure> = left
        .measures
        .iter()
        .chain(right.iter().flat_map(|r| r.measures.iter()))
        .collect();
    let ids: Vec<String> = all.iter().map(|m| m.id.clone()).collect();
    let series: Vec<LineSeries> = all
        .iter()
        .flat_map(|m| {
            collect_series(
                &views.chart,
                core::slice::from_ref(&m.id),
                &time,
                |_| Some(m.id.clone()),
                |o| m.get(o),
                |_, _| None,
            )
        })
        .collect();
    let colors = measure_colors(color, &ids);
    tracing::debug!(series = series.len(), dual = right.is_some(), ?x_domain, "derived combo lines");

    ComboLineState {
        bounds,
        x_scale: ScaleTimeSpec::new(x_domain).instantiate((0.0, bounds.chart_width)),
        x_scale_time_range: ScaleTimeSpec::new(full_x_domain).instantiate((0.0, bounds.chart_width)),
        x_axis: time_axis(&x_component.label, x_domain, bounds.chart_width),
        left,
        right,
        series,
        colors,
        time_unit: x_component.time_unit,
        dimensions: dims,
        time,
    }
}

/// Derives a combo chart with several measures on one axis.
#[tracing::instrument(skip_all, fields(measures = config.fields.y.len()))]
pub fn derive_combo_line_single_state(
    config: &ComboLineSingleConfig,
    inputs: &ChartInputs<'_>,
) -> Result<ComboLineState, ChartError> {
    let fields = &config.fields;
    if fields.y.is_empty() {
        return Err(ChartError::MissingField {
            chart: "comboLineSingle",
            role: "y",
        });
    }
    let interactive = &config.interactive_filters_config;
    let ctx = time_context(inputs, &fields.x, interactive)?;
    let ids: Vec<&str> = fields.y.iter().map(String::as_str).collect();
    let left = measures(inputs, &ids, "y")?;
    Ok(derive_combo_lines(
        ctx,
        inputs,
        left,
        None,
        fields.color.as_ref(),
        interactive.time_range,
    ))
}

/// Derives a combo chart with a left and a right measure axis.
#[tracing::instrument(
    skip_all,
    fields(left = %config.fields.left_axis_component_id, right = %config.fields.right_axis_component_id)
)]
pub fn derive_combo_line_dual_state(
    config: &ComboLineDualConfig,
    inputs: &ChartInputs<'_>,
) -> Result<ComboLineState, ChartError> {
    let fields = &config.fields;
    let interactive = &config.interactive_filters_config;
    let ctx = time_context(inputs, &fields.x, interactive)?;
    let left = measures(inputs, &[fields.left_axis_component_id.as_str()], "leftAxis")?;
    let right = measures(inputs, &[fields.right_axis_component_id.as_str()], "rightAxis")?;
    Ok(derive_combo_lines(
        ctx,
        inputs,
        left,
        Some(right),
        fields.color.as_ref(),
        interactive.time_range,
    ))
}

impl ComboLineState {
    fn axis_of(&self, id: &str) -> &ComboAxis {
        match &self.right {
            Some(r) if r.carries(id) => r,
            _ => &self.left,
        }
    }

    fn measures(&self) -> impl Iterator<Item = &ComboMeasure> {
        self.left
            .measures
            .iter()
            .chain(self.right.iter().flat_map(|r| r.measures.iter()))
    }

    /// Stroke paths in plot coordinates, one per measure.
    pub fn paths(&self) -> Vec<(String, BezPath, Color)> {
        self.series
            .iter()
            .map(|s| {
                let scale = &self.axis_of(&s.key).scale;
                let path = line_path(
                    s.points
                        .iter()
                        .map(|p| (self.x_scale.map(p.t), scale.map(p.value))),
                );
                (s.key.clone(), path, self.colors.for_key(&s.key))
            })
            .collect()
    }

    /// Topmost finite measure position of `o`, with the measure it belongs to.
    fn top(&self, o: &Observation) -> Option<(f64, &ComboMeasure)> {
        self.measures()
            .filter_map(|m| {
                let v = m.get(o);
                v.is_finite().then(|| (self.axis_of(&m.id).scale.map(v), m))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }

    /// Tooltip listing every measure at the hovered time.
    pub fn tooltip_info(&self, o: &Observation) -> Option<TooltipInfo> {
        let t = self.time.get(o)?;
        let x_anchor = self.x_scale.map(t);
        let y_anchor = self.top(o).map_or(self.bounds.chart_height, |(y, _)| y);
        let values: Vec<TooltipValue> = self
            .measures()
            .map(|m| m.tooltip_value(o, &self.colors))
            .collect();
        Some(TooltipInfo {
            x_anchor,
            y_anchor,
            placement: tooltip::placement(&self.dimensions, self.bounds.chart_width, x_anchor, false),
            datum: TooltipValue {
                label: format_time(t, self.time_unit),
                value: String::new(),
                error: None,
                color: None,
            },
            values,
        })
    }

    /// Highlight at the topmost measure of the hovered time.
    pub fn annotation_info(&self, o: &Observation) -> Option<AnnotationInfo> {
        let t = self.time.get(o)?;
        let (y, m) = self.top(o)?;
        Some(AnnotationInfo {
            x: self.x_scale.map(t),
            y,
            color: self.colors.for_key(&m.id),
        })
    }
}

/// One column of a line-column combo.
#[derive(Clone, Debug, PartialEq)]
pub struct ComboColumn {
    /// Band key (the raw time value).
    pub key: String,
    /// Column value.
    pub value: f64,
    /// Line value at the same time.
    pub line_value: f64,
}

/// Resolved state of a line-column combo.
#[derive(Clone, Debug)]
pub struct ComboLineColumnState {
    /// Arranged geometry.
    pub bounds: Bounds,
    /// Time keys as bands, sorted by time.
    pub x_scale: ScaleBand,
    /// Formatted band labels.
    pub x_labels: Vec<String>,
    /// Axis carrying the columns.
    pub column_axis: ComboAxis,
    /// Axis carrying the line.
    pub line_axis: ComboAxis,
    /// Side of the line axis.
    pub line_axis_orientation: LineAxisOrientation,
    /// Columns in band order.
    pub columns: Vec<ComboColumn>,
    /// Colors keyed by measure id.
    pub colors: ColorScale,
    dimensions: ChartDimensions,
    x: StringGetter,
}

/// Derives a combo chart with columns on one axis and a line on the other.
#[tracing::instrument(
    skip_all,
    fields(column = %config.fields.column_component_id, line = %config.fields.line_component_id)
)]
pub fn derive_combo_line_column_state(
    config: &ComboLineColumnConfig,
    inputs: &ChartInputs<'_>,
) -> Result<ComboLineColumnState, ChartError> {
    let fields = &config.fields;
    let ctx = time_context(inputs, &fields.x, &config.interactive_filters_config)?;
    let column = measures(inputs, &[fields.column_component_id.as_str()], "column")?;
    let line = measures(inputs, &[fields.line_component_id.as_str()], "line")?;
    let TimeContext {
        time,
        x_component,
        views,
    } = ctx;
    let x = StringGetter::new(x_component.id.clone());

    let mut timed: Vec<(f64, &Observation)> = views
        .chart
        .iter()
        .filter_map(|o| Some((time.get(o)?, *o)))
        .collect();
    timed.sort_by(|a, b| a.0.total_cmp(&b.0));
    let keys = unique_in_order(timed.iter().filter_map(|(_, o)| x.get(o)));
    let x_labels: Vec<String> = keys
        .iter()
        .map(|k| {
            timed
                .iter()
                .find(|(_, o)| x.get(o).as_deref() == Some(k.as_str()))
                .map_or_else(|| k.clone(), |(t, _)| format_time(*t, x_component.time_unit))
        })
        .collect();

    let dims = inputs.dimensions;
    let y_ticks = tick_count(dims.width * dims.aspect_ratio, Y_TICK_SPACING);
    let column_labels = padding_labels(measures_domain(&views.filtered, &column), y_ticks, false);
    let line_labels = padding_labels(measures_domain(&views.filtered, &line), y_ticks, false);
    let column_title = axis_title(&column);
    let line_title = axis_title(&line);
    let line_on_left = fields.line_axis_orientation == LineAxisOrientation::Left;
    let (left_labels, right_labels, left_title, right_title) = if line_on_left {
        (&line_labels, &column_labels, &line_title, &column_title)
    } else {
        (&column_labels, &line_labels, &column_title, &line_title)
    };
    let margins = ChartPadding {
        left_labels,
        right_labels,
        bottom_labels: &x_labels,
        rotate_bottom_labels: true,
        left_title: Some(left_title.as_str()),
        right_title: Some(right_title.as_str()),
        ..ChartPadding::default()
    }
    .margins(inputs.measurer);
    let bounds = Bounds::arrange(&dims, margins);

    let x_scale = ScaleBandSpec::new(keys)
        .with_padding(COMBO_BAND_PADDING.0, COMBO_BAND_PADDING.1)
        .instantiate((0.0, bounds.chart_width));
    let y_axis = |measures: Vec<ComboMeasure>, title: String| {
        let scale = ScaleLinearSpec::new(measures_domain(&views.scales, &measures))
            .with_nice(true)
            .instantiate((bounds.chart_height, 0.0), y_ticks);
        let axis = Axis::linear(title, &scale, y_ticks, false);
        ComboAxis {
            measures,
            scale,
            axis,
        }
    };
    let column_axis = y_axis(column, column_title.clone());
    let line_axis = y_axis(line, line_title.clone());

    let columns: Vec<ComboColumn> = x_scale
        .domain()
        .iter()
        .filter_map(|k| {
            let (_, o) = timed.iter().find(|(_, o)| x.get(o).as_deref() == Some(k.as_str()))?;
            Some(ComboColumn {
                key: k.clone(),
                value: column_axis.measures[0].get(o),
                line_value: line_axis.measures[0].get(o),
            })
        })
        .collect();
    let ids = [column_axis.measures[0].id.clone(), line_axis.measures[0].id.clone()];
    let colors = measure_colors(fields.color.as_ref(), &ids);
    tracing::debug!(bands = columns.len(), line_on_left, "derived line-column combo");

    Ok(ComboLineColumnState {
        bounds,
        x_scale,
        x_labels,
        column_axis,
        line_axis,
        line_axis_orientation: fields.line_axis_orientation,
        columns,
        colors,
        dimensions: dims,
        x,
    })
}

impl ComboLineColumnState {
    fn column_measure(&self) -> &ComboMeasure {
        &self.column_axis.measures[0]
    }

    fn line_measure(&self) -> &ComboMeasure {
        &self.line_axis.measures[0]
    }

    /// Column rectangles in plot coordinates.
    pub fn column_rects(&self) -> Vec<(String, Rect, Color)> {
        let color = self.colors.for_key(&self.column_measure().id);
        let scale = &self.column_axis.scale;
        self.columns
            .iter()
            .filter(|c| c.value.is_finite())
            .filter_map(|c| {
                let x0 = self.x_scale.position(&c.key)?;
                let (a, b) = (scale.map(0.0), scale.map(c.value));
                Some((
                    c.key.clone(),
                    Rect::new(x0, a.min(b), x0 + self.x_scale.bandwidth(), a.max(b)),
                    color,
                ))
            })
            .collect()
    }

    /// The line through band centers.
    pub fn line_path(&self) -> BezPath {
        let scale = &self.line_axis.scale;
        line_path(self.columns.iter().map(|c| {
            (
                self.x_scale.center(&c.key).unwrap_or(f64::NAN),
                scale.map(c.line_value),
            )
        }))
    }

    /// Tooltip with the column and line values of the hovered band.
    pub fn tooltip_info(&self, o: &Observation) -> Option<TooltipInfo> {
        let key = self.x.get(o)?;
        let index = self.x_scale.domain().iter().position(|k| *k == key)?;
        let x_anchor = self.x_scale.center(&key)?;
        let column_y = self.column_axis.scale.map(self.column_measure().get(o).max(0.0));
        let line_y = self.line_axis.scale.map(self.line_measure().get(o));
        let y_anchor = [column_y, line_y]
            .into_iter()
            .filter(|y| y.is_finite())
            .reduce(f64::min)
            .unwrap_or(self.bounds.chart_height);
        Some(TooltipInfo {
            x_anchor,
            y_anchor,
            placement: tooltip::placement(&self.dimensions, self.bounds.chart_width, x_anchor, true),
            datum: TooltipValue {
                label: self.x_labels.get(index).cloned().unwrap_or(key),
                value: String::new(),
                error: None,
                color: None,
            },
            values: alloc::vec![
                self.column_measure().tooltip_value(o, &self.colors),
                self.line_measure().tooltip_value(o, &self.colors),
            ],
        })
    }

    /// Highlight on the line at the hovered band.
    pub fn annotation_info(&self, o: &Observation) -> Option<AnnotationInfo> {
        let key = self.x.get(o)?;
        Some(AnnotationInfo {
            x: self.x_scale.center(&key)?,
            y: self.line_axis.scale.map(self.line_measure().get(o)),
            color: self.colors.for_key(&self.line_measure().id),
        })
    }
}
