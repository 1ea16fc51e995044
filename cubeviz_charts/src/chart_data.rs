// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derivation inputs and the helpers every chart type shares: filtered observation
//! views, segment resolution, color resolution and measure axes.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use cubeviz_core::{
    ColorField, Component, Components, InteractiveFiltersConfig, InteractiveFiltersState, Limit,
    MeasureField, Observation, SegmentField,
};
use cubeviz_text::TextMeasurer;
use cubeviz_transforms::{CategorySorter, SortContext, present_in_order, sums_by_key, unique_in_order};
use hashbrown::HashMap;

use crate::accessors::{LabelGetter, NumericGetter, StringGetter, TemporalGetter};
use crate::color::{ColorScale, DEFAULT_COLOR, categorical_colors, parse_css_color};
use crate::format::{ValueFormatter, format_number};
use crate::layout::ChartDimensions;
use crate::map_state::MapFeature;
use crate::scale::{DomainOptions, ScaleLinear, ScaleLinearSpec};

/// Pixels between value ticks on a vertical axis.
pub(crate) const Y_TICK_SPACING: f64 = 50.0;
/// Pixels between ticks on a horizontal axis.
pub(crate) const X_TICK_SPACING: f64 = 100.0;

/// Everything a derivation pass reads.
#[derive(Clone, Copy)]
pub struct ChartInputs<'a> {
    /// Raw observations.
    pub observations: &'a [Observation],
    /// Component metadata.
    pub components: &'a Components,
    /// Current interactive filter values.
    pub filters: &'a InteractiveFiltersState,
    /// Container dimensions.
    pub dimensions: ChartDimensions,
    /// Text measurement for margins.
    pub measurer: &'a dyn TextMeasurer,
    /// Projected map features (maps only).
    pub features: &'a [MapFeature],
}

impl<'a> ChartInputs<'a> {
    /// Inputs without map features.
    pub fn new(
        observations: &'a [Observation],
        components: &'a Components,
        filters: &'a InteractiveFiltersState,
        dimensions: ChartDimensions,
        measurer: &'a dyn TextMeasurer,
    ) -> Self {
        Self {
            observations,
            components,
            filters,
            dimensions,
            measurer,
            features: &[],
        }
    }

    /// Adds projected map features.
    #[must_use]
    pub fn with_features(mut self, features: &'a [MapFeature]) -> Self {
        self.features = features;
        self
    }

    /// Looks up a required component and checks that it is numeric.
    pub(crate) fn measure(&self, id: &str, role: &'static str) -> Result<&'a Component, cubeviz_core::ChartError> {
        let c = self.components.require(id)?;
        if c.kind.is_numeric() {
            Ok(c)
        } else {
            Err(cubeviz_core::ChartError::InvalidComponent {
                id: id.into(),
                role,
                expected: "a numeric measure",
            })
        }
    }
}

impl fmt::Debug for ChartInputs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartInputs")
            .field("observations", &self.observations.len())
            .field("components", &self.components.len())
            .field("filters", &self.filters)
            .field("dimensions", &self.dimensions)
            .field("features", &self.features.len())
            .finish_non_exhaustive()
    }
}

/// Observation subsets for the different consumers of one derivation.
#[derive(Clone, Debug, Default)]
pub(crate) struct DataViews<'a> {
    /// Every observation. Category lists that must not move with filters come from here.
    pub all: Vec<&'a Observation>,
    /// Data filters only. Margins and the time range brush use this.
    pub filtered: Vec<&'a Observation>,
    /// Data filters and time range. Decides which segments are present.
    pub segment: Vec<&'a Observation>,
    /// Every enabled filter. This is what gets drawn.
    pub chart: Vec<&'a Observation>,
    /// Data filters and legend, plus the time range when the scale is dynamic.
    pub scales: Vec<&'a Observation>,
}

impl<'a> DataViews<'a> {
    pub(crate) fn new(
        inputs: &ChartInputs<'a>,
        config: &InteractiveFiltersConfig,
        time: Option<&TemporalGetter>,
        segment: Option<&StringGetter>,
        dynamic_scale: bool,
    ) -> Self {
        let filters = inputs.filters;
        let data_filters: Vec<(&str, &str)> = config
            .data_filters
            .iter()
            .filter_map(|id| {
                filters
                    .data_filters
                    .get(id)
                    .map(|v| (id.as_str(), v.as_str()))
            })
            .collect();
        let range = filters.time_range.filter(|_| config.time_range);
        let in_range = |o: &Observation| match (range, time) {
            (Some(r), Some(t)) => t.get(o).is_some_and(|t| r.contains(t)),
            _ => true,
        };
        let visible = |o: &Observation| match segment {
            Some(s) if config.legend => s.get(o).is_none_or(|k| filters.is_visible(&k)),
            _ => true,
        };

        let all: Vec<&Observation> = inputs.observations.iter().collect();
        let filtered: Vec<&Observation> = all
            .iter()
            .copied()
            .filter(|o| {
                data_filters
                    .iter()
                    .all(|(id, v)| o.key(id).as_deref() == Some(*v))
            })
            .collect();
        let segment: Vec<&Observation> = filtered.iter().copied().filter(|o| in_range(o)).collect();
        let chart = segment.iter().copied().filter(|o| visible(o)).collect();
        let scales = filtered
            .iter()
            .copied()
            .filter(|o| visible(o) && (!dynamic_scale || in_range(o)))
            .collect();
        Self {
            all,
            filtered,
            segment,
            chart,
            scales,
        }
    }
}

/// Ordered segments of a chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Segments {
    /// Segment dimension id.
    pub component_id: String,
    /// Every value in the unfiltered data, sorted. Legends and colors use this.
    pub all_segments: Vec<String>,
    /// Values present after data filters and time range, in `all_segments` order.
    pub segments: Vec<String>,
    labels: LabelGetter,
    index: HashMap<String, usize>,
}

impl Segments {
    /// Position in [`Segments::segments`].
    pub fn index_of(&self, segment: &str) -> Option<usize> {
        self.index.get(segment).copied()
    }

    /// Display label of a segment value.
    pub fn label<'a>(&'a self, segment: &'a str) -> &'a str {
        self.labels.label(segment)
    }

    /// Number of present segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no segment is present.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Sorts segment values and selects the present ones.
pub(crate) fn resolve_segments(
    field: &SegmentField,
    component: &Component,
    getter: &StringGetter,
    views: &DataViews<'_>,
    measure: Option<&NumericGetter>,
) -> Segments {
    let mut all_segments = unique_in_order(views.all.iter().filter_map(|o| getter.get(o)));
    let mut ctx = SortContext::from_component(component);
    if let Some(m) = measure {
        ctx = ctx.with_totals(sums_by_key(views.all.iter(), |o| getter.get(o), |o| m.get(o)));
    }
    CategorySorter::new(&ctx, field.sorting.as_ref()).sort(&mut all_segments);
    let present: Vec<String> = views.segment.iter().filter_map(|o| getter.get(o)).collect();
    let segments = present_in_order(&all_segments, present.iter().map(String::as_str));
    let index = segments
        .iter()
        .enumerate()
        .map(|(i, s)| (s.clone(), i))
        .collect();
    tracing::debug!(
        component = %component.id,
        all = all_segments.len(),
        present = segments.len(),
        "resolved segments"
    );
    Segments {
        component_id: component.id.clone(),
        all_segments,
        segments,
        labels: LabelGetter::new(component, field.use_abbreviations),
        index,
    }
}

/// Segment getter and metadata for an optional segment field.
///
/// A segment whose component is unknown is treated as unmapped.
pub(crate) fn segment_encoding<'c>(
    components: &'c Components,
    field: Option<&SegmentField>,
) -> Option<(&'c Component, StringGetter)> {
    let field = field?;
    match components.get(&field.component_id) {
        Some(c) => Some((c, StringGetter::new(c.id.clone()))),
        None => {
            tracing::warn!(id = %field.component_id, "segment component missing; ignoring segment");
            None
        }
    }
}

/// Colors for a chart: categorical over all segments, otherwise a fixed color.
pub(crate) fn segment_colors(
    color: &ColorField,
    segments: Option<&Segments>,
    component: Option<&Component>,
) -> ColorScale {
    let no_mapping = BTreeMap::new();
    match (color, segments) {
        (
            ColorField::Segment {
                palette_id,
                color_mapping,
                ..
            },
            Some(s),
        ) => ColorScale::Categorical(categorical_colors(
            &s.all_segments,
            palette_id.as_deref(),
            color_mapping,
            component,
        )),
        (_, Some(s)) => ColorScale::Categorical(categorical_colors(
            &s.all_segments,
            None,
            &no_mapping,
            component,
        )),
        (ColorField::Single { color }, None) => {
            ColorScale::Fixed(parse_css_color(color).unwrap_or(DEFAULT_COLOR))
        }
        (_, None) => ColorScale::Fixed(DEFAULT_COLOR),
    }
}

/// Values of the limits enabled on `field`.
pub(crate) fn active_limits(component: &Component, field: &MeasureField) -> Vec<Limit> {
    component
        .limits
        .iter()
        .filter(|l| field.active_limits.contains(&l.label))
        .cloned()
        .collect()
}

/// Domain options for a measure axis.
pub(crate) fn domain_options<'l>(field: &MeasureField, limit_values: &'l [f64], floor_zero: bool) -> DomainOptions<'l> {
    DomainOptions {
        floor_zero,
        custom: field.custom_domain,
        include: limit_values,
    }
}

/// Flat list of limit values.
pub(crate) fn limit_values(limits: &[Limit]) -> Vec<f64> {
    limits.iter().flat_map(Limit::values).collect()
}

/// Tick count for an axis `length` pixels long.
pub(crate) fn tick_count(length: f64, spacing: f64) -> usize {
    let n = (length / spacing).clamp(2.0, 10.0);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "clamped to [2, 10]"
    )]
    let n = n as usize;
    n
}

/// A measure axis with formatted ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    /// Axis title.
    pub title: String,
    /// Tick values.
    pub ticks: Vec<f64>,
    /// Tick labels aligned with `ticks`.
    pub labels: Vec<String>,
}

impl Axis {
    /// Ticks of `scale` labelled with decimals from the tick step.
    pub(crate) fn linear(title: impl Into<String>, scale: &ScaleLinear, count: usize, percent: bool) -> Self {
        let ticks = scale.ticks(count);
        let labels = tick_labels(&ticks, scale.tick_step(count), percent);
        Self {
            title: title.into(),
            ticks,
            labels,
        }
    }
}

/// Labels for ticks `step` apart; percent ticks are fractions.
pub(crate) fn tick_labels(ticks: &[f64], step: f64, percent: bool) -> Vec<String> {
    if percent {
        let decimals = crate::format::decimals_for_step(step * 100.0);
        ticks
            .iter()
            .map(|t| {
                let mut s = format_number(t * 100.0, decimals);
                s.push('%');
                s
            })
            .collect()
    } else {
        let decimals = crate::format::decimals_for_step(step);
        ticks.iter().map(|t| format_number(*t, decimals)).collect()
    }
}

/// Tick labels a measure axis can show, used for margins.
///
/// The labels come from the padding domain so margins stay put while legend or time
/// range filters change. When the percent toggle is available both label sets count.
pub(crate) fn padding_labels(domain: (f64, f64), count: usize, with_percent: bool) -> Vec<String> {
    let label_set = |domain, percent| {
        let scale = ScaleLinearSpec::new(domain).with_nice(true).instantiate((0.0, 1.0), count);
        Axis::linear("", &scale, count, percent).labels
    };
    let mut labels = label_set(domain, false);
    if with_percent {
        labels.extend(label_set((0.0, 1.0), true));
    }
    labels
}

/// Formatter for measure values in the current calculation mode.
pub(crate) fn value_formatter(component: &Component, percent: bool) -> ValueFormatter {
    if percent {
        ValueFormatter::percent()
    } else {
        ValueFormatter::for_component(component)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;
    use alloc::vec;

    use cubeviz_core::{ComponentKind, TimeRange};
    use cubeviz_text::HeuristicTextMeasurer;

    use super::*;

    fn observations() -> Vec<Observation> {
        [("2020", "a", "x"), ("2021", "b", "x"), ("2022", "a", "y")]
            .into_iter()
            .map(|(t, s, f)| {
                Observation::new()
                    .with("time", t)
                    .with("seg", s)
                    .with("filter", f)
                    .with("value", 1.0)
            })
            .collect()
    }

    #[test]
    fn views_apply_filters_in_layers() {
        let obs = observations();
        let components = Components::new(vec![
            Component::new("time", "Year", ComponentKind::TemporalDimension)
                .with_time(cubeviz_core::TimeUnit::Year, "%Y"),
        ]);
        let mut filters = InteractiveFiltersState::default();
        filters.data_filters.insert("filter".into(), "x".into());
        filters.legend.insert("b".into(), false);
        filters.time_range = Some(TimeRange {
            from: 1_577_836_800.0,
            to: 1_577_836_800.0,
        });
        let config = InteractiveFiltersConfig {
            legend: true,
            time_range: true,
            calculation: false,
            data_filters: vec!["filter".into()],
        };
        let m = HeuristicTextMeasurer;
        let inputs = ChartInputs::new(&obs, &components, &filters, ChartDimensions::default(), &m);
        let time = TemporalGetter::new(components.get("time").unwrap());
        let seg = StringGetter::new("seg");
        let views = DataViews::new(&inputs, &config, Some(&time), Some(&seg), false);
        assert_eq!(views.all.len(), 3);
        assert_eq!(views.filtered.len(), 2);
        assert_eq!(views.segment.len(), 1);
        assert_eq!(views.chart.len(), 1);
        // Legend hides "b"; the time range does not apply to a non-dynamic scale.
        assert_eq!(views.scales.len(), 1);
        assert_eq!(views.scales[0].key("time").as_deref(), Some("2020"));
    }

    #[test]
    fn segments_keep_unfiltered_order() {
        let obs = observations();
        let components = Components::new(vec![]);
        let filters = InteractiveFiltersState::default();
        let m = HeuristicTextMeasurer;
        let inputs = ChartInputs::new(&obs, &components, &filters, ChartDimensions::default(), &m);
        let component = Component::new("seg", "Segment", ComponentKind::NominalDimension);
        let getter = StringGetter::new("seg");
        let mut views = DataViews::new(&inputs, &InteractiveFiltersConfig::default(), None, Some(&getter), false);
        views.segment.retain(|o| o.key("seg").as_deref() == Some("b"));
        let field = SegmentField::new("seg");
        let s = resolve_segments(&field, &component, &getter, &views, None);
        assert_eq!(s.all_segments, ["a".to_string(), "b".to_string()]);
        assert_eq!(s.segments, ["b".to_string()]);
        assert_eq!(s.index_of("b"), Some(0));
        assert_eq!(s.index_of("a"), None);
    }

    #[test]
    fn padding_labels_include_percent_ticks() {
        let plain = padding_labels((0.0, 80.0), 5, false);
        let both = padding_labels((0.0, 80.0), 5, true);
        assert!(plain.iter().all(|l| !l.ends_with('%')));
        assert!(both.iter().any(|l| l == "100%"));
    }

    #[test]
    fn tick_count_is_clamped() {
        assert_eq!(tick_count(10.0, 50.0), 2);
        assert_eq!(tick_count(260.0, 50.0), 5);
        assert_eq!(tick_count(5000.0, 50.0), 10);
    }
}
