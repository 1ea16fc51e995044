// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Band charts: categories along a band axis, a measure along a linear axis.
//!
//! Columns and bars share this derivation and differ only in [`Orientation`]. With a
//! segment field the marks are either stacked (absent cells imputed as zero, diverging
//! around the baseline) or grouped side by side inside each band.

use alloc::string::String;
use alloc::vec::Vec;

use cubeviz_core::{
    Calculation, ChartError, ColorField, GenericField, ImputationType, InteractiveFiltersConfig,
    Limit, MeasureField, Observation, SegmentField, SegmentKind,
};
use cubeviz_transforms::{
    CategorySorter, Group, LongRow, SortContext, StackOffset, StackOrder, StackSeries, WideFrame,
    group_by_key, percent_of, pivot_wide, stack, stack_extent, sums_by_key, unique_in_order,
};
use kurbo::Rect;
use peniko::Color;

use crate::accessors::{ErrorGetter, LabelGetter, NumericGetter, StringGetter, TemporalGetter};
use crate::chart_data::{
    Axis, ChartInputs, DataViews, Segments, X_TICK_SPACING, Y_TICK_SPACING, active_limits,
    domain_options, limit_values, padding_labels, resolve_segments, segment_colors,
    segment_encoding, tick_count, value_formatter,
};
use crate::color::ColorScale;
use crate::format::ValueFormatter;
use crate::layout::{Bounds, ChartDimensions};
use crate::padding::{BAR_HEIGHT, BAR_SPACE, ChartPadding};
use crate::scale::{ScaleBand, ScaleBandSpec, ScaleLinear, ScaleLinearSpec, numeric_domain};
use crate::tooltip::{self, AnnotationInfo, TooltipInfo, TooltipValue, in_segment_order};

/// Inner and outer band padding for columns.
const COLUMN_PADDING: (f64, f64) = (0.3, 0.2);
/// Inner and outer band padding for bars.
const BAR_PADDING: (f64, f64) = (0.25, 0.1);
/// Inner padding between grouped marks.
const GROUP_PADDING: f64 = 0.1;

/// Direction of the band axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Bands along x, values along y (columns).
    Vertical,
    /// Bands along y, values along x (bars).
    Horizontal,
}

/// One observation on a band chart.
#[derive(Clone, Debug, PartialEq)]
pub struct BandDatum {
    /// Band key.
    pub key: String,
    /// Segment value.
    pub segment: Option<String>,
    /// Measure value (a fraction in percent mode).
    pub value: f64,
    /// Error range.
    pub error: Option<(f64, f64)>,
}

/// Derived marks of a band chart.
#[derive(Clone, Debug, PartialEq)]
pub enum BandLayout {
    /// One mark per band.
    Simple(Vec<BandDatum>),
    /// Stacked segments per band.
    Stacked {
        /// Band keys by segment values.
        frame: WideFrame,
        /// Stack layout in segment order.
        series: Vec<StackSeries>,
    },
    /// Side-by-side segments per band; one group per band key.
    Grouped(Vec<Group<BandDatum>>),
}

/// A drawable band mark.
#[derive(Clone, Debug, PartialEq)]
pub struct BandMark {
    /// Band key.
    pub key: String,
    /// Segment value.
    pub segment: Option<String>,
    /// Mark rectangle in plot coordinates.
    pub rect: Rect,
    /// Fill.
    pub color: Color,
}

/// Resolved state of a column or bar chart.
#[derive(Clone, Debug)]
pub struct BandChartState {
    /// Band axis direction.
    pub orientation: Orientation,
    /// Arranged geometry.
    pub bounds: Bounds,
    /// Band positions (sorted keys).
    pub band_scale: ScaleBand,
    /// Unpadded band scale for pointer lookup.
    pub interaction_scale: ScaleBand,
    /// Sub-bands inside a band for grouped layouts.
    pub group_scale: Option<ScaleBand>,
    /// Measure scale.
    pub value_scale: ScaleLinear,
    /// Band labels aligned with the band scale domain.
    pub band_labels: Vec<String>,
    /// Measure axis.
    pub value_axis: Axis,
    /// Ordered segments.
    pub segments: Option<Segments>,
    /// Fill colors.
    pub colors: ColorScale,
    /// Marks.
    pub layout: BandLayout,
    /// Values are fractions of their band total.
    pub percent: bool,
    /// Limits drawn on the measure axis.
    pub limits: Vec<Limit>,
    /// Formatter for tooltip values.
    pub formatter: ValueFormatter,
    dimensions: ChartDimensions,
    band: StringGetter,
    labels: LabelGetter,
    value: NumericGetter,
    segment: Option<StringGetter>,
    error: Option<ErrorGetter>,
}

/// Field roles of a band chart.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BandFields<'c> {
    pub band: &'c GenericField,
    pub value: &'c MeasureField,
    pub segment: Option<&'c SegmentField>,
    pub color: &'c ColorField,
    pub interactive: &'c InteractiveFiltersConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Simple,
    Stacked,
    Grouped,
}

struct Encodings<'g> {
    band: &'g StringGetter,
    value: &'g NumericGetter,
    segment: Option<&'g StringGetter>,
    error: Option<&'g ErrorGetter>,
}

impl Encodings<'_> {
    fn datum(&self, o: &Observation) -> Option<BandDatum> {
        let value = self.value.get(o);
        Some(BandDatum {
            key: self.band.get(o)?,
            segment: self.segment.and_then(|s| s.get(o)),
            value,
            error: self.error.and_then(|e| e.get(o, value)),
        })
    }

    fn layout(
        &self,
        rows: &[&Observation],
        mode: Mode,
        keys: &[String],
        segments: &[String],
        percent: bool,
        order: StackOrder,
    ) -> BandLayout {
        match mode {
            Mode::Simple => BandLayout::Simple(rows.iter().filter_map(|o| self.datum(o)).collect()),
            Mode::Stacked => {
                let cells: Vec<(String, String, f64)> = rows
                    .iter()
                    .filter_map(|o| {
                        Some((self.band.get(o)?, self.segment?.get(o)?, self.value.get(o)))
                    })
                    .collect();
                let long = cells.iter().map(|(key, segment, value)| LongRow {
                    key: key.as_str(),
                    position: f64::NAN,
                    segment: segment.as_str(),
                    value: *value,
                });
                let mut frame = pivot_wide(long, keys, segments, ImputationType::Zeros);
                if percent {
                    frame = frame.normalized();
                }
                let series = stack(&frame, order, StackOffset::DivergingPositiveZeros);
                BandLayout::Stacked { frame, series }
            }
            Mode::Grouped => {
                let mut data: Vec<BandDatum> = rows.iter().filter_map(|o| self.datum(o)).collect();
                if percent {
                    let totals = sums_by_key(data.iter(), |d| Some(d.key.clone()), |d| d.value);
                    for d in &mut data {
                        let total = totals.get(&d.key).copied().unwrap_or(0.0);
                        d.value = percent_of(d.value, total);
                        d.error = None;
                    }
                }
                BandLayout::Grouped(group_by_key(
                    data,
                    keys,
                    |d| Some(d.key.clone()),
                    |d| d.segment.clone(),
                    segments,
                ))
            }
        }
    }
}

/// Values the measure domain has to cover.
fn layout_extent(layout: &BandLayout) -> Vec<f64> {
    let datum_values = |d: &BandDatum| {
        let (lo, hi) = d.error.unwrap_or((d.value, d.value));
        [d.value, lo, hi]
    };
    match layout {
        BandLayout::Simple(data) => data.iter().flat_map(datum_values).collect(),
        BandLayout::Stacked { series, .. } => stack_extent(series)
            .map(|(lo, hi)| alloc::vec![lo, hi])
            .unwrap_or_default(),
        BandLayout::Grouped(groups) => groups
            .iter()
            .flat_map(|g| g.members.iter())
            .flat_map(datum_values)
            .collect(),
    }
}

fn keys_of(rows: &[&Observation], band: &StringGetter) -> Vec<String> {
    unique_in_order(rows.iter().filter_map(|o| band.get(o)))
}

pub(crate) fn derive_band_chart(
    fields: &BandFields<'_>,
    inputs: &ChartInputs<'_>,
    orientation: Orientation,
) -> Result<BandChartState, ChartError> {
    let band_component = inputs.components.require(&fields.band.component_id)?;
    let value_component = inputs.measure(&fields.value.component_id, "value")?;
    let band = StringGetter::new(band_component.id.clone());
    let value = NumericGetter::new(value_component.id.clone());
    let error = ErrorGetter::for_measure(inputs.components, value_component, fields.value);
    let segment_enc = segment_encoding(inputs.components, fields.segment);
    let segment = segment_enc.as_ref().map(|(_, g)| g.clone());
    let time = band_component
        .kind
        .is_temporal()
        .then(|| TemporalGetter::new(band_component));
    let views = DataViews::new(
        inputs,
        fields.interactive,
        time.as_ref(),
        segment.as_ref(),
        fields.value.dynamic_scale,
    );

    let mut keys = keys_of(&views.chart, &band);
    let ctx = SortContext::from_component(band_component).with_totals(sums_by_key(
        views.chart.iter(),
        |o| band.get(o),
        |o| value.get(o),
    ));
    let sorter = CategorySorter::new(&ctx, fields.band.sorting.as_ref());
    sorter.sort(&mut keys);
    let labels = LabelGetter::new(band_component, fields.band.use_abbreviations);
    let band_labels: Vec<String> = keys.iter().map(|k| labels.label(k).into()).collect();

    let segments = match (fields.segment, &segment_enc) {
        (Some(f), Some((c, g))) => Some(resolve_segments(f, c, g, &views, Some(&value))),
        _ => None,
    };
    let mode = match (fields.segment, &segments) {
        (Some(f), Some(_)) if f.kind == SegmentKind::Grouped => Mode::Grouped,
        (Some(_), Some(_)) => Mode::Stacked,
        _ => Mode::Simple,
    };
    let percent = mode != Mode::Simple
        && fields.interactive.calculation
        && inputs.filters.calculation == Calculation::Percent;
    let order = StackOrder::from_sorting(fields.segment.and_then(|f| f.sorting.as_ref()));
    let segment_values: &[String] = segments.as_ref().map_or(&[], |s| &s.segments);
    let enc = Encodings {
        band: &band,
        value: &value,
        segment: segment.as_ref(),
        error: error.as_ref(),
    };

    let limits = active_limits(value_component, fields.value);
    let limit_vals = limit_values(&limits);
    let options = domain_options(fields.value, &limit_vals, true);
    let scale_layout = enc.layout(
        &views.scales,
        mode,
        &keys_of(&views.scales, &band),
        segment_values,
        percent,
        order,
    );
    let domain = numeric_domain(layout_extent(&scale_layout), &options);
    let padding_keys = keys_of(&views.filtered, &band);
    let padding_layout = enc.layout(&views.filtered, mode, &padding_keys, segment_values, false, order);
    let padding_domain = numeric_domain(layout_extent(&padding_layout), &options);

    let dims = inputs.dimensions;
    let ticks = match orientation {
        Orientation::Vertical => tick_count(dims.width * dims.aspect_ratio, Y_TICK_SPACING),
        Orientation::Horizontal => tick_count(dims.width, X_TICK_SPACING),
    };
    let value_labels = padding_labels(padding_domain, ticks, mode != Mode::Simple && fields.interactive.calculation);
    let padding_band_labels: Vec<String> = padding_keys.iter().map(|k| labels.label(k).into()).collect();
    let time_brush = fields.interactive.time_range && time.is_some();
    let padding = match orientation {
        Orientation::Vertical => ChartPadding {
            left_labels: &value_labels,
            bottom_labels: &padding_band_labels,
            rotate_bottom_labels: true,
            left_title: Some(value_component.label.as_str()),
            time_brush,
            ..ChartPadding::default()
        },
        Orientation::Horizontal => ChartPadding {
            left_labels: &padding_band_labels,
            bottom_labels: &value_labels,
            bottom_title: Some(value_component.label.as_str()),
            time_brush,
            ..ChartPadding::default()
        },
    };
    let margins = padding.margins(inputs.measurer);

    let (band_padding, bounds) = match orientation {
        Orientation::Vertical => (COLUMN_PADDING, Bounds::arrange(&dims, margins)),
        Orientation::Horizontal => {
            let per_band = match mode {
                Mode::Grouped => BAR_HEIGHT * segment_values.len().max(1) as f64 + BAR_SPACE,
                _ => BAR_HEIGHT + BAR_SPACE,
            };
            let height = per_band * keys.len().max(1) as f64;
            (BAR_PADDING, Bounds::with_chart_height(&dims, margins, height))
        }
    };
    let (band_range, value_range) = match orientation {
        Orientation::Vertical => ((0.0, bounds.chart_width), (bounds.chart_height, 0.0)),
        Orientation::Horizontal => ((0.0, bounds.chart_height), (0.0, bounds.chart_width)),
    };
    let band_spec = ScaleBandSpec::new(keys.clone());
    let band_scale = band_spec
        .clone()
        .with_padding(band_padding.0, band_padding.1)
        .instantiate(band_range);
    let interaction_scale = band_spec.instantiate(band_range);
    let value_scale = ScaleLinearSpec::new(domain)
        .with_nice(true)
        .instantiate(value_range, ticks);
    let group_scale = (mode == Mode::Grouped).then(|| {
        ScaleBandSpec::new(segment_values.to_vec())
            .with_padding(GROUP_PADDING, 0.0)
            .instantiate((0.0, band_scale.bandwidth()))
    });
    let value_axis = Axis::linear(value_component.label.clone(), &value_scale, ticks, percent);

    let layout = enc.layout(&views.chart, mode, &keys, segment_values, percent, order);
    let colors = segment_colors(fields.color, segments.as_ref(), segment_enc.as_ref().map(|(c, _)| *c));
    tracing::debug!(
        bands = keys.len(),
        segments = segment_values.len(),
        ?mode,
        ?domain,
        percent,
        "derived band chart"
    );

    Ok(BandChartState {
        orientation,
        bounds,
        band_scale,
        interaction_scale,
        group_scale,
        value_scale,
        band_labels,
        value_axis,
        colors,
        layout,
        percent,
        limits,
        formatter: value_formatter(value_component, percent),
        segments,
        dimensions: dims,
        band,
        labels,
        value,
        segment,
        error,
    })
}

impl BandChartState {
    fn rect(&self, pos: f64, size: f64, v0: f64, v1: f64) -> Rect {
        let (a, b) = (self.value_scale.map(v0), self.value_scale.map(v1));
        match self.orientation {
            Orientation::Vertical => Rect::from_points((pos, a), (pos + size, b)),
            Orientation::Horizontal => Rect::from_points((a, pos), (b, pos + size)),
        }
    }

    fn fill(&self, key: &str, segment: Option<&str>) -> Color {
        self.colors.for_key(segment.unwrap_or(key))
    }

    /// Rectangles to draw, in plot coordinates.
    pub fn marks(&self) -> Vec<BandMark> {
        let bw = self.band_scale.bandwidth();
        let mut marks = Vec::new();
        match &self.layout {
            BandLayout::Simple(data) => {
                for d in data.iter().filter(|d| d.value.is_finite()) {
                    let Some(pos) = self.band_scale.position(&d.key) else {
                        continue;
                    };
                    marks.push(BandMark {
                        key: d.key.clone(),
                        segment: None,
                        rect: self.rect(pos, bw, 0.0, d.value),
                        color: self.fill(&d.key, None),
                    });
                }
            }
            BandLayout::Stacked { frame, series } => {
                for s in series {
                    for (row, p) in s.points.iter().enumerate() {
                        let key = &frame.keys[row];
                        let Some(pos) = self.band_scale.position(key) else {
                            continue;
                        };
                        marks.push(BandMark {
                            key: key.clone(),
                            segment: Some(s.segment.clone()),
                            rect: self.rect(pos, bw, p.y0, p.y1),
                            color: self.fill(key, Some(&s.segment)),
                        });
                    }
                }
            }
            BandLayout::Grouped(groups) => {
                let Some(inner) = &self.group_scale else {
                    return marks;
                };
                for g in groups {
                    let Some(pos) = self.band_scale.position(&g.key) else {
                        continue;
                    };
                    for d in g.members.iter().filter(|d| d.value.is_finite()) {
                        let Some(offset) = d.segment.as_deref().and_then(|s| inner.position(s)) else {
                            continue;
                        };
                        marks.push(BandMark {
                            key: d.key.clone(),
                            segment: d.segment.clone(),
                            rect: self.rect(pos + offset, inner.bandwidth(), 0.0, d.value),
                            color: self.fill(&d.key, d.segment.as_deref()),
                        });
                    }
                }
            }
        }
        marks
    }

    /// The band key under a pointer coordinate along the band axis.
    pub fn band_at(&self, px: f64) -> Option<&str> {
        self.interaction_scale.invert(px)
    }

    /// Band center and value-axis position of the hovered mark.
    fn anchor(&self, key: &str, segment: Option<&str>, value: f64) -> Option<(f64, f64)> {
        let mut band_pos = self.band_scale.center(key)?;
        if let (Some(inner), Some(s)) = (&self.group_scale, segment)
            && let (Some(start), Some(sub)) = (self.band_scale.position(key), inner.center(s))
        {
            band_pos = start + sub;
        }
        let value_pos = self
            .value_scale
            .map(if value.is_finite() { value } else { 0.0 });
        Some(match self.orientation {
            Orientation::Vertical => (band_pos, value_pos),
            Orientation::Horizontal => (value_pos, band_pos),
        })
    }

    /// Displayed value of the hovered observation (a fraction in percent mode).
    fn displayed(&self, key: &str, segment: Option<&str>, raw: f64) -> f64 {
        match (&self.layout, segment) {
            (BandLayout::Stacked { frame, .. }, Some(s)) => frame.value(key, s).unwrap_or(f64::NAN),
            (BandLayout::Grouped(groups), Some(s)) if self.percent => groups
                .iter()
                .find(|g| g.key == key)
                .and_then(|g| g.members.iter().find(|d| d.segment.as_deref() == Some(s)))
                .map_or(f64::NAN, |d| d.value),
            _ => raw,
        }
    }

    /// Top edge of the stack or group at `key`.
    fn band_top(&self, key: &str) -> Option<f64> {
        match &self.layout {
            BandLayout::Simple(_) => None,
            BandLayout::Stacked { frame, series } => {
                let row = frame.row_index(key)?;
                series
                    .iter()
                    .filter_map(|s| s.points.get(row))
                    .map(|p| p.max())
                    .reduce(f64::max)
            }
            BandLayout::Grouped(groups) => groups
                .iter()
                .find(|g| g.key == key)?
                .members
                .iter()
                .map(|d| d.value)
                .filter(|v| v.is_finite())
                .reduce(f64::max),
        }
    }

    fn segment_values(&self, key: &str) -> Vec<TooltipValue> {
        let Some(segments) = &self.segments else {
            return Vec::new();
        };
        let entry = |segment: &str, value: f64, error: Option<(f64, f64)>| {
            (
                segments.index_of(segment).unwrap_or(usize::MAX),
                TooltipValue {
                    label: segments.label(segment).into(),
                    value: self.formatter.format_with_unit(value),
                    error: error.map(|e| self.formatter.format_error(value, e)),
                    color: Some(self.colors.for_key(segment)),
                },
            )
        };
        let values = match &self.layout {
            BandLayout::Simple(_) => Vec::new(),
            BandLayout::Stacked { frame, .. } => match frame.row_index(key) {
                Some(row) => frame
                    .segments
                    .iter()
                    .enumerate()
                    .filter_map(|(i, s)| Some(entry(s, frame.get(row, i)?, None)))
                    .collect(),
                None => Vec::new(),
            },
            BandLayout::Grouped(groups) => groups
                .iter()
                .filter(|g| g.key == key)
                .flat_map(|g| g.members.iter())
                .filter_map(|d| Some(entry(d.segment.as_deref()?, d.value, d.error)))
                .collect(),
        };
        in_segment_order(values)
    }

    /// Tooltip for the hovered observation; `None` when it is not on the chart.
    pub fn tooltip_info(&self, o: &Observation) -> Option<TooltipInfo> {
        let key = self.band.get(o)?;
        let segment = self.segment.as_ref().and_then(|s| s.get(o));
        let raw = self.value.get(o);
        let shown = self.displayed(&key, segment.as_deref(), raw);
        let anchor_value = if self.group_scale.is_some() {
            shown
        } else {
            self.band_top(&key).unwrap_or(shown)
        };
        let (x_anchor, y_anchor) = self.anchor(&key, segment.as_deref(), anchor_value)?;
        let error = if self.percent {
            None
        } else {
            self.error
                .as_ref()
                .and_then(|e| e.get(o, raw))
                .map(|e| self.formatter.format_error(raw, e))
        };
        let datum = TooltipValue {
            label: match (&segment, &self.segments) {
                (Some(s), Some(segments)) => segments.label(s).into(),
                _ => self.labels.label(&key).into(),
            },
            // Imputed cells only position the stack; a missing value is shown as missing.
            value: self
                .formatter
                .format_with_unit(if raw.is_finite() { shown } else { f64::NAN }),
            error,
            color: Some(self.fill(&key, segment.as_deref())),
        };
        let top_anchor = self.orientation == Orientation::Vertical;
        Some(TooltipInfo {
            x_anchor,
            y_anchor,
            placement: tooltip::placement(&self.dimensions, self.bounds.chart_width, x_anchor, top_anchor),
            datum,
            values: self.segment_values(&key),
        })
    }

    /// Highlight for the hovered observation.
    pub fn annotation_info(&self, o: &Observation) -> Option<AnnotationInfo> {
        let key = self.band.get(o)?;
        let segment = self.segment.as_ref().and_then(|s| s.get(o));
        let shown = self.displayed(&key, segment.as_deref(), self.value.get(o));
        let (x, y) = self.anchor(&key, segment.as_deref(), shown)?;
        Some(AnnotationInfo {
            x,
            y,
            color: self.fill(&key, segment.as_deref()),
        })
    }
}
