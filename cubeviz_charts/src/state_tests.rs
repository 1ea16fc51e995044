// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derivations across chart types, driven by JSON configurations.

extern crate std;

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use cubeviz_core::{
    Calculation, ChartConfig, ChartError, Component, ComponentKind, Components,
    InteractiveFiltersState, Observation, TimeUnit,
};
use cubeviz_text::{CachedTextMeasurer, HeuristicTextMeasurer};

use crate::band_chart::BandLayout;
use crate::chart_data::ChartInputs;
use crate::chart_state::{ChartState, ChartStateCache};
use crate::format::MISSING_VALUE;
use crate::layout::ChartDimensions;
use crate::map_state::{MAX_SYMBOL_RADIUS, MapFeature};
use crate::padding::{BAR_HEIGHT, BAR_SPACE};

fn components() -> Components {
    Components::new(vec![
        Component::new("year", "Year", ComponentKind::OrdinalDimension),
        Component::new("date", "Date", ComponentKind::TemporalDimension).with_time(TimeUnit::Year, "%Y"),
        Component::new("cat", "Category", ComponentKind::NominalDimension),
        Component::new("canton", "Canton", ComponentKind::GeoShapesDimension),
        Component::new("value", "Value", ComponentKind::NumericalMeasure),
        Component::new("other", "Other", ComponentKind::NumericalMeasure).with_unit("t"),
    ])
}

fn row(year: &str, cat: &str, value: f64) -> Observation {
    Observation::new()
        .with("year", year)
        .with("date", year)
        .with("cat", cat)
        .with("value", value)
        .with("other", value * 10.0)
}

fn observations() -> Vec<Observation> {
    vec![
        row("2021", "a", 6.0),
        row("2020", "a", 4.0),
        row("2022", "a", 5.0),
        row("2020", "b", 1.0),
        row("2021", "b", 2.0),
        row("2022", "b", 3.0),
    ]
}

fn config(json: &str) -> ChartConfig {
    serde_json::from_str(json).unwrap()
}

fn derive_with(
    json: &str,
    observations: &[Observation],
    filters: &InteractiveFiltersState,
) -> Result<ChartState, ChartError> {
    let components = components();
    let inputs = ChartInputs::new(
        observations,
        &components,
        filters,
        ChartDimensions::new(640.0),
        &HeuristicTextMeasurer,
    );
    ChartState::derive(&config(json), &inputs)
}

fn derive(json: &str) -> ChartState {
    derive_with(json, &observations(), &InteractiveFiltersState::default()).unwrap()
}

const STACKED_COLUMNS: &str = r#"{
    "chartType": "column",
    "fields": {
        "x": {"componentId": "year"},
        "y": {"componentId": "value"},
        "segment": {"componentId": "cat"},
        "color": {"type": "segment", "componentId": "cat"}
    },
    "interactiveFiltersConfig": {"legend": true, "calculation": true}
}"#;

#[test]
fn simple_columns_are_sorted_by_label() {
    let ChartState::Column(state) = derive(
        r#"{"chartType": "column", "fields": {"x": {"componentId": "year"}, "y": {"componentId": "value"}}}"#,
    ) else {
        panic!("expected a column state");
    };
    assert_eq!(state.band_scale.domain(), ["2020", "2021", "2022"]);
    assert!(state.segments.is_none());
    let marks = state.marks();
    assert_eq!(marks.len(), 6, "one mark per observation without segments");
    assert!(marks.iter().all(|m| m.rect.width() > 0.0));
    assert!(state.bounds.margins.x0 > 0.0);
}

#[test]
fn stacked_columns_in_percent_mode_fill_every_band() {
    let filters = InteractiveFiltersState {
        calculation: Calculation::Percent,
        ..InteractiveFiltersState::default()
    };
    let ChartState::Column(state) = derive_with(STACKED_COLUMNS, &observations(), &filters).unwrap() else {
        panic!("expected a column state");
    };
    assert!(state.percent);
    let BandLayout::Stacked { frame, series } = &state.layout else {
        panic!("expected a stacked layout");
    };
    assert_eq!(series.len(), 2);
    for row in 0..frame.row_count() {
        let top = series
            .iter()
            .map(|s| s.points[row].max())
            .fold(0.0_f64, f64::max);
        assert!((top - 1.0).abs() < 1e-9, "row {row} tops out at {top}");
    }
    assert!((state.value_scale.domain().1 - 1.0).abs() < 1e-9);
}

#[test]
fn hidden_segments_keep_their_colors() {
    let visible = derive(STACKED_COLUMNS);
    let mut filters = InteractiveFiltersState::default();
    filters.toggle_legend("a");
    let hidden = derive_with(STACKED_COLUMNS, &observations(), &filters).unwrap();
    let (ChartState::Column(visible), ChartState::Column(hidden)) = (visible, hidden) else {
        panic!("expected column states");
    };
    assert_eq!(visible.colors.for_key("b"), hidden.colors.for_key("b"));
    assert_eq!(
        hidden.segments.as_ref().map(|s| s.all_segments.clone()),
        Some(vec!["a".to_string(), "b".to_string()])
    );
    let marks = hidden.marks();
    assert!(
        marks
            .iter()
            .filter(|m| m.segment.as_deref() == Some("a"))
            .all(|m| m.rect.height() == 0.0),
        "hidden segment has no height"
    );
}

#[test]
fn stacked_tooltip_lists_segments_in_order() {
    let state = derive(STACKED_COLUMNS);
    let hovered = row("2021", "b", 2.0);
    let info = state.tooltip_info(&hovered).unwrap();
    assert_eq!(info.datum.label, "b");
    let labels: Vec<&str> = info.values.iter().map(|v| v.label.as_str()).collect();
    assert_eq!(labels, ["a", "b"]);
    assert!(state.annotation_info(&hovered).is_some());
}

#[test]
fn grouped_columns_sit_side_by_side() {
    let ChartState::Column(state) = derive(
        r#"{
            "chartType": "column",
            "fields": {
                "x": {"componentId": "year"},
                "y": {"componentId": "value"},
                "segment": {"componentId": "cat", "type": "grouped"}
            }
        }"#,
    ) else {
        panic!("expected a column state");
    };
    assert!(matches!(state.layout, BandLayout::Grouped(_)));
    let inner = state.group_scale.as_ref().unwrap();
    let marks: Vec<_> = state.marks().into_iter().filter(|m| m.key == "2020").collect();
    assert_eq!(marks.len(), 2);
    assert!(marks[0].rect.x0 < marks[1].rect.x0);
    assert!((marks[0].rect.width() - inner.bandwidth()).abs() < 1e-9);
}

#[test]
fn bar_height_grows_with_band_count() {
    let ChartState::Bar(state) = derive(
        r#"{"chartType": "bar", "fields": {"x": {"componentId": "value"}, "y": {"componentId": "year"}}}"#,
    ) else {
        panic!("expected a bar state");
    };
    assert!((state.bounds.chart_height - 3.0 * (BAR_HEIGHT + BAR_SPACE)).abs() < 1e-9);
    let mark = &state.marks()[0];
    assert!(mark.rect.width() > 0.0);
}

#[test]
fn unknown_components_are_reported() {
    let err = derive_with(
        r#"{"chartType": "column", "fields": {"x": {"componentId": "nope"}, "y": {"componentId": "value"}}}"#,
        &observations(),
        &InteractiveFiltersState::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ChartError::MissingComponent {
            id: "nope".to_string()
        }
    );
    assert_eq!(err.to_string(), "component `nope` is not present in the cube metadata");
}

#[test]
fn measures_must_be_numeric() {
    let err = derive_with(
        r#"{"chartType": "column", "fields": {"x": {"componentId": "year"}, "y": {"componentId": "cat"}}}"#,
        &observations(),
        &InteractiveFiltersState::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ChartError::InvalidComponent { ref id, .. } if id == "cat"));
}

#[test]
fn empty_data_still_derives() {
    let state = derive_with(STACKED_COLUMNS, &[], &InteractiveFiltersState::default()).unwrap();
    assert!(state.bounds().chart_width > 0.0);
    assert!(state.tooltip_info(&row("2020", "a", 1.0)).is_none());
}

#[test]
fn stacked_tooltip_shows_missing_values_as_missing() {
    let mut data = observations();
    data[4] = row("2021", "b", f64::NAN);
    let state = derive_with(STACKED_COLUMNS, &data, &InteractiveFiltersState::default()).unwrap();
    let info = state.tooltip_info(&data[4]).unwrap();
    assert_eq!(info.datum.label, "b");
    assert_eq!(info.datum.value, MISSING_VALUE, "zero fill is not a measured value");
    let present = state.tooltip_info(&data[0]).unwrap();
    assert_eq!(present.datum.value, "6");
}

fn area(imputation: &str) -> String {
    alloc::format!(
        r#"{{
            "chartType": "area",
            "fields": {{
                "x": {{"componentId": "date"}},
                "y": {{"componentId": "value"}},
                "segment": {{"componentId": "cat", "imputationType": "{imputation}"}}
            }}
        }}"#
    )
}

#[test]
fn area_gaps_follow_imputation() {
    let mut data = observations();
    data.retain(|o| !(o.key("year").as_deref() == Some("2021") && o.key("cat").as_deref() == Some("b")));
    let filters = InteractiveFiltersState::default();

    let ChartState::Area(none) = derive_with(&area("none"), &data, &filters).unwrap() else {
        panic!("expected an area state");
    };
    assert_eq!(none.frame.keys, ["2020", "2021", "2022"]);
    assert_eq!(none.frame.value("2021", "b"), None);
    let gap = none.tooltip_info(&row("2021", "a", 6.0)).unwrap();
    assert_eq!(gap.values.len(), 1, "absent cells have no tooltip line");

    let ChartState::Area(zeros) = derive_with(&area("zeros"), &data, &filters).unwrap() else {
        panic!("expected an area state");
    };
    assert_eq!(zeros.frame.value("2021", "b"), Some(0.0));

    let ChartState::Area(linear) = derive_with(&area("linear"), &data, &filters).unwrap() else {
        panic!("expected an area state");
    };
    let filled = linear.frame.value("2021", "b").unwrap();
    assert!((filled - 2.0).abs() < 0.01, "interpolated to {filled}");
    assert_eq!(linear.areas().len(), 2);
}

#[test]
fn area_tooltip_ignores_imputed_values() {
    let mut data = observations();
    data[4] = row("2021", "b", f64::NAN);
    let filters = InteractiveFiltersState::default();
    for imputation in ["none", "zeros", "linear"] {
        let state = derive_with(&area(imputation), &data, &filters).unwrap();
        let info = state.tooltip_info(&data[4]).unwrap();
        assert_eq!(info.datum.value, MISSING_VALUE, "{imputation}");
        let present = state.tooltip_info(&data[0]).unwrap();
        assert_eq!(present.datum.value, "6", "{imputation}");
    }
}

#[test]
fn area_requires_a_temporal_axis() {
    let err = derive_with(
        r#"{"chartType": "area", "fields": {"x": {"componentId": "year"}, "y": {"componentId": "value"}}}"#,
        &observations(),
        &InteractiveFiltersState::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ChartError::InvalidComponent { role: "x", .. }));
}

#[test]
fn lines_split_by_segment() {
    let ChartState::Line(state) = derive(
        r#"{
            "chartType": "line",
            "fields": {
                "x": {"componentId": "date"},
                "y": {"componentId": "value"},
                "segment": {"componentId": "cat"}
            }
        }"#,
    ) else {
        panic!("expected a line state");
    };
    let keys: Vec<&str> = state.series.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, ["a", "b"]);
    assert!(state.series.iter().all(|s| s.points.len() == 3));
    let times: Vec<f64> = state.series[0].points.iter().map(|p| p.t).collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]), "points are time ordered");
    assert_eq!(state.paths().len(), 2);
}

#[test]
fn time_range_narrows_the_drawn_domain_only() {
    let json = r#"{
        "chartType": "line",
        "fields": {"x": {"componentId": "date"}, "y": {"componentId": "value"}},
        "interactiveFiltersConfig": {"timeRange": true}
    }"#;
    let from = crate::time::parse_temporal("2021", None).unwrap();
    let to = crate::time::parse_temporal("2022", None).unwrap();
    let filters = InteractiveFiltersState {
        time_range: Some(cubeviz_core::TimeRange { from, to }),
        ..InteractiveFiltersState::default()
    };
    let ChartState::Line(state) = derive_with(json, &observations(), &filters).unwrap() else {
        panic!("expected a line state");
    };
    assert_eq!(state.x_scale.domain(), (from, to));
    assert!(state.x_scale_time_range.domain().0 < from);
}

#[test]
fn scatterplot_domains_start_at_zero() {
    let ChartState::Scatterplot(state) = derive(
        r#"{"chartType": "scatterplot", "fields": {"x": {"componentId": "value"}, "y": {"componentId": "other"}}}"#,
    ) else {
        panic!("expected a scatterplot state");
    };
    assert_eq!(state.x_scale.domain().0, 0.0);
    assert_eq!(state.y_scale.domain().0, 0.0);
    assert_eq!(state.points.len(), 6);
    assert_eq!(state.dots().len(), 6);
    let info = state.tooltip_info(&row("2020", "a", 4.0)).unwrap();
    assert_eq!(info.values.len(), 2);
    assert!(info.values[1].value.ends_with(" t"), "y carries its unit");
}

const MAP: &str = r##"{
    "chartType": "map",
    "fields": {
        "areaLayer": {
            "componentId": "canton",
            "color": {"type": "measure", "componentId": "value", "scaleType": "discrete", "interpolationType": "jenks", "nbClass": 3}
        },
        "symbolLayer": {
            "componentId": "canton",
            "measureId": "value",
            "color": {"type": "single", "color": "#ff0000"}
        }
    }
}"##;

fn map_observations() -> Vec<Observation> {
    [("ZH", 10.0), ("BE", 40.0), ("GE", 5.0), ("XX", 50.0)]
        .into_iter()
        .map(|(c, v)| Observation::new().with("canton", c).with("value", v))
        .collect()
}

#[test]
fn map_symbols_scale_by_area() {
    let components = components();
    let features = [
        MapFeature::new("ZH", (100.0, 50.0)),
        MapFeature::new("BE", (60.0, 80.0)),
        MapFeature::new("GE", (10.0, 120.0)),
        MapFeature::new("LU", (80.0, 70.0)),
    ];
    let data = map_observations();
    let filters = InteractiveFiltersState::default();
    let inputs = ChartInputs::new(
        &data,
        &components,
        &filters,
        ChartDimensions::new(640.0),
        &HeuristicTextMeasurer,
    )
    .with_features(&features);
    let ChartState::Map(state) = ChartState::derive(&config(MAP), &inputs).unwrap() else {
        panic!("expected a map state");
    };

    let symbols = &state.symbol_layer.as_ref().unwrap().symbols;
    let ids: Vec<&str> = symbols.iter().map(|s| s.feature_id.as_str()).collect();
    assert_eq!(ids, ["BE", "ZH", "GE"], "largest first, features without geometry dropped");
    // The unmatched observation still sets the radius domain.
    assert!(symbols[0].radius < MAX_SYMBOL_RADIUS);
    assert!((symbols[1].radius / symbols[0].radius - 0.5).abs() < 1e-9);

    let areas = &state.area_layer.as_ref().unwrap().areas;
    assert_eq!(areas.len(), 4);
    assert!(areas.iter().find(|a| a.feature_id == "LU").unwrap().color.is_none());
    assert!(areas.iter().filter(|a| a.feature_id != "LU").all(|a| a.color.is_some()));

    let info = state.tooltip_info(&data[0]).unwrap();
    assert_eq!(info.datum.label, "ZH");
}

#[test]
fn map_without_layers_is_rejected() {
    let err = derive_with(
        r#"{"chartType": "map", "fields": {}}"#,
        &map_observations(),
        &InteractiveFiltersState::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ChartError::MissingField { chart: "map", .. }));
    let err = derive_with(
        r#"{"chartType": "map", "fields": {"areaLayer": {"componentId": "cat", "color": {"type": "single", "color": "red"}}}}"#,
        &map_observations(),
        &InteractiveFiltersState::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ChartError::InvalidComponent { ref id, .. } if id == "cat"));
}

#[test]
fn table_hides_and_styles_columns() {
    let ChartState::Table(state) = derive(
        r#"{
            "chartType": "table",
            "fields": {
                "year": {"index": 0},
                "cat": {"index": 1, "isHidden": true},
                "value": {"index": 2, "columnStyle": {"type": "bar", "color": "steelblue"}}
            },
            "sorting": [{"componentId": "value", "sortingOrder": "desc"}]
        }"#,
    ) else {
        panic!("expected a table state");
    };
    let ids: Vec<&str> = state.columns.iter().map(|c| c.component_id.as_str()).collect();
    assert_eq!(ids, ["year", "value"]);
    assert_eq!(state.rows.len(), 6);
    assert_eq!(state.rows[0].cells[0].text, "2021");
    assert!(state.rows[0].cells[1].bar.is_some());
    assert!(
        ChartState::Table(state).tooltip_info(&row("2020", "a", 4.0)).is_none(),
        "tables have no tooltip"
    );
}

#[test]
fn combo_dual_splits_measures_over_two_axes() {
    let ChartState::ComboLineDual(state) = derive(
        r#"{
            "chartType": "comboLineDual",
            "fields": {
                "x": {"componentId": "date"},
                "leftAxisComponentId": "value",
                "rightAxisComponentId": "other"
            }
        }"#,
    ) else {
        panic!("expected a combo state");
    };
    let right = state.right.as_ref().unwrap();
    assert_eq!(state.left.axis.title, "Value");
    assert_eq!(right.axis.title, "Other");
    assert!(right.scale.domain().1 > state.left.scale.domain().1);
    assert_eq!(state.series.len(), 2);
    assert_ne!(state.colors.for_key("value"), state.colors.for_key("other"));
}

#[test]
fn combo_single_requires_measures() {
    let err = derive_with(
        r#"{"chartType": "comboLineSingle", "fields": {"x": {"componentId": "date"}, "y": []}}"#,
        &observations(),
        &InteractiveFiltersState::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ChartError::MissingField {
            chart: "comboLineSingle",
            role: "y"
        }
    );
}

#[test]
fn combo_line_column_pairs_columns_with_the_line() {
    let ChartState::ComboLineColumn(state) = derive(
        r#"{
            "chartType": "comboLineColumn",
            "fields": {
                "x": {"componentId": "date"},
                "columnComponentId": "value",
                "lineComponentId": "other",
                "lineAxisOrientation": "left"
            }
        }"#,
    ) else {
        panic!("expected a combo state");
    };
    let keys: Vec<&str> = state.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, ["2020", "2021", "2022"]);
    assert_eq!(state.x_labels, ["2020", "2021", "2022"]);
    assert_eq!(state.column_rects().len(), 3);
    assert_eq!(state.line_path().elements().len(), 3);
}

#[test]
fn cache_reuses_states_until_inputs_change() {
    let components = components();
    let data = observations();
    let chart = config(STACKED_COLUMNS);
    let mut cache = ChartStateCache::new();
    let mut filters = InteractiveFiltersState::default();
    let measurer = HeuristicTextMeasurer;

    let derive = |cache: &mut ChartStateCache, filters: &InteractiveFiltersState| {
        let inputs = ChartInputs::new(
            &data,
            &components,
            filters,
            ChartDimensions::new(640.0),
            &measurer,
        );
        cache.get(&chart, &inputs).unwrap()
    };
    let first = derive(&mut cache, &filters);
    let second = derive(&mut cache, &filters);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.derivations(), 1);

    filters.toggle_legend("b");
    let third = derive(&mut cache, &filters);
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(cache.derivations(), 2);
}

#[test]
fn cache_derives_again_when_fonts_change() {
    let components = components();
    let data = observations();
    let chart = config(STACKED_COLUMNS);
    let filters = InteractiveFiltersState::default();
    let measurer = CachedTextMeasurer::new(HeuristicTextMeasurer);
    let mut cache = ChartStateCache::new();

    let mut derive = || {
        let inputs = ChartInputs::new(
            &data,
            &components,
            &filters,
            ChartDimensions::new(640.0),
            &measurer,
        );
        cache.get(&chart, &inputs).unwrap()
    };
    let first = derive();
    let second = derive();
    assert!(Arc::ptr_eq(&first, &second), "same measurer, same state");

    measurer.clear();
    let third = derive();
    assert!(!Arc::ptr_eq(&first, &third), "margins are measured again");
    assert_eq!(cache.derivations(), 2);
}
