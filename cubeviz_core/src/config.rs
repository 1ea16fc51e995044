// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chart configuration: encodings chosen by the user, per chart type.
//!
//! The JSON shape mirrors what the configurator stores: camelCase keys and a `chartType`
//! discriminator on the top-level [`ChartConfig`].

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// How categorical values are ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortingType {
    /// Explicit positions first, then natural value order.
    #[default]
    ByAuto,
    /// Natural order of labels.
    ByDimensionLabel,
    /// Total of the plotted measure per category.
    ByMeasure,
    /// Total stack size per category (drives stack order too).
    ByTotalSize,
    /// A user-specified value sequence.
    ByCustomOrder,
    /// Numeric-aware order used by table columns.
    ByTableSortingType,
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortingOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Sorting options of a categorical field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sorting {
    /// Which comparators to use.
    pub sorting_type: SortingType,
    /// Direction.
    #[serde(default)]
    pub sorting_order: SortingOrder,
    /// Value sequence for [`SortingType::ByCustomOrder`].
    #[serde(default)]
    pub custom_order: Vec<String>,
}

impl Sorting {
    /// Sorting with the given type and order.
    pub fn new(sorting_type: SortingType, sorting_order: SortingOrder) -> Self {
        Self {
            sorting_type,
            sorting_order,
            custom_order: Vec::new(),
        }
    }
}

/// A dimension mapped to a positional or categorical role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericField {
    /// Component id.
    pub component_id: String,
    /// Show abbreviations instead of labels.
    #[serde(default)]
    pub use_abbreviations: bool,
    /// Sorting (band axes only).
    #[serde(default)]
    pub sorting: Option<Sorting>,
}

impl GenericField {
    /// A field for `component_id` with default options.
    pub fn new(component_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            use_abbreviations: false,
            sorting: None,
        }
    }
}

/// A measure mapped to a value axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureField {
    /// Component id.
    pub component_id: String,
    /// User-fixed axis domain.
    #[serde(default)]
    pub custom_domain: Option<[f64; 2]>,
    /// Draw standard error whiskers.
    #[serde(default)]
    pub show_standard_error: bool,
    /// Draw confidence interval whiskers.
    #[serde(default)]
    pub show_confidence_interval: bool,
    /// Print values next to marks.
    #[serde(default)]
    pub show_values: bool,
    /// Fit the axis to the data instead of anchoring it at zero.
    #[serde(default)]
    pub dynamic_scale: bool,
    /// Labels of the component limits to display.
    #[serde(default)]
    pub active_limits: Vec<String>,
}

impl MeasureField {
    /// A field for `component_id` with default options.
    pub fn new(component_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            custom_domain: None,
            show_standard_error: false,
            show_confidence_interval: false,
            show_values: false,
            dynamic_scale: false,
            active_limits: Vec::new(),
        }
    }

    /// Whether any error whiskers are requested.
    pub fn shows_errors(&self) -> bool {
        self.show_standard_error || self.show_confidence_interval
    }
}

/// Stacked or side-by-side segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentKind {
    /// Segments share a stack.
    #[default]
    Stacked,
    /// Segments are placed next to each other.
    Grouped,
}

/// How absent axis/segment combinations are filled before stacking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImputationType {
    /// Leave gaps absent.
    #[default]
    None,
    /// Fill gaps with zero.
    Zeros,
    /// Interpolate between neighbours; zero outside the observed range.
    Linear,
}

/// A dimension splitting marks into segments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentField {
    /// Component id.
    pub component_id: String,
    /// Show abbreviations instead of labels.
    #[serde(default)]
    pub use_abbreviations: bool,
    /// Segment sorting.
    #[serde(default)]
    pub sorting: Option<Sorting>,
    /// Stacked or grouped.
    #[serde(default, rename = "type")]
    pub kind: SegmentKind,
    /// Gap filling for stacked areas.
    #[serde(default)]
    pub imputation_type: ImputationType,
}

impl SegmentField {
    /// A stacked segment field for `component_id`.
    pub fn new(component_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            use_abbreviations: false,
            sorting: None,
            kind: SegmentKind::Stacked,
            imputation_type: ImputationType::None,
        }
    }
}

/// Continuous or classed numeric color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorScaleType {
    /// Interpolate over the whole domain.
    #[default]
    Continuous,
    /// Assign one of `nbClass` colors.
    Discrete,
}

/// Interpolation/classification for numeric color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorInterpolation {
    /// Linear interpolation (continuous only).
    #[default]
    Linear,
    /// Equal-width classes.
    Quantize,
    /// Equal-count classes.
    Quantile,
    /// Natural breaks classes.
    Jenks,
}

/// Color encoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ColorField {
    /// One constant color.
    Single {
        /// CSS color string.
        color: String,
    },
    /// Categorical color per segment value.
    Segment {
        /// Dimension id.
        component_id: String,
        /// Palette name.
        #[serde(default)]
        palette_id: Option<String>,
        /// Explicit value → color assignments.
        #[serde(default)]
        color_mapping: BTreeMap<String, String>,
    },
    /// Numeric color driven by a measure.
    Measure {
        /// Measure id.
        component_id: String,
        /// Palette name (sequential or diverging).
        #[serde(default)]
        palette_id: Option<String>,
        /// Continuous or discrete.
        #[serde(default)]
        scale_type: ColorScaleType,
        /// Interpolation or classification method.
        #[serde(default)]
        interpolation_type: ColorInterpolation,
        /// Number of classes for discrete scales.
        #[serde(default = "default_nb_class")]
        nb_class: usize,
    },
    /// One color per measure (combo charts).
    Measures {
        /// Palette name.
        #[serde(default)]
        palette_id: Option<String>,
        /// Explicit measure id → color assignments.
        #[serde(default)]
        color_mapping: BTreeMap<String, String>,
    },
}

fn default_nb_class() -> usize {
    5
}

impl Default for ColorField {
    fn default() -> Self {
        Self::Single {
            color: "#1f77b4".into(),
        }
    }
}

/// Which interactive filters a chart exposes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractiveFiltersConfig {
    /// Clickable legend toggling segments.
    pub legend: bool,
    /// Time brush below the chart.
    pub time_range: bool,
    /// Absolute/percent switch.
    pub calculation: bool,
    /// Dimensions filterable above the chart.
    pub data_filters: Vec<String>,
}

/// Area chart encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaFields {
    /// Temporal x axis.
    pub x: GenericField,
    /// Stacked measure.
    pub y: MeasureField,
    /// Optional segmentation.
    #[serde(default)]
    pub segment: Option<SegmentField>,
    /// Color.
    #[serde(default)]
    pub color: ColorField,
}

/// Bar (horizontal) chart encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarFields {
    /// Horizontal measure.
    pub x: MeasureField,
    /// Vertical band axis.
    pub y: GenericField,
    /// Optional segmentation.
    #[serde(default)]
    pub segment: Option<SegmentField>,
    /// Color.
    #[serde(default)]
    pub color: ColorField,
}

/// Column chart encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFields {
    /// Horizontal band axis.
    pub x: GenericField,
    /// Vertical measure.
    pub y: MeasureField,
    /// Optional segmentation.
    #[serde(default)]
    pub segment: Option<SegmentField>,
    /// Color.
    #[serde(default)]
    pub color: ColorField,
}

/// Line chart encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineFields {
    /// Temporal x axis.
    pub x: GenericField,
    /// Measure.
    pub y: MeasureField,
    /// Optional segmentation (one line per segment).
    #[serde(default)]
    pub segment: Option<SegmentField>,
    /// Color.
    #[serde(default)]
    pub color: ColorField,
}

/// Scatterplot encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterplotFields {
    /// Horizontal measure.
    pub x: MeasureField,
    /// Vertical measure.
    pub y: MeasureField,
    /// Optional segmentation.
    #[serde(default)]
    pub segment: Option<SegmentField>,
    /// Color.
    #[serde(default)]
    pub color: ColorField,
}

/// Pie chart encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieFields {
    /// Arc size.
    pub y: MeasureField,
    /// One arc per segment.
    pub segment: SegmentField,
    /// Color.
    #[serde(default)]
    pub color: ColorField,
}

/// Area layer of a map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaLayerField {
    /// Geo shapes dimension.
    pub component_id: String,
    /// Fill color.
    pub color: ColorField,
}

/// Symbol layer of a map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolLayerField {
    /// Geo dimension the symbols are anchored to.
    pub component_id: String,
    /// Measure driving the symbol radius.
    #[serde(default)]
    pub measure_id: Option<String>,
    /// Symbol color.
    #[serde(default)]
    pub color: ColorField,
}

/// Map layers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFields {
    /// Colored areas.
    #[serde(default)]
    pub area_layer: Option<AreaLayerField>,
    /// Proportional symbols.
    #[serde(default)]
    pub symbol_layer: Option<SymbolLayerField>,
}

/// Cell rendering of a table column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ColumnStyle {
    /// Plain text.
    #[default]
    Text,
    /// Colored category chips.
    Category {
        /// Palette name.
        #[serde(default)]
        palette_id: Option<String>,
        /// Explicit value → color assignments.
        #[serde(default)]
        color_mapping: BTreeMap<String, String>,
    },
    /// Background colored by value.
    Heatmap {
        /// Sequential or diverging palette.
        #[serde(default)]
        palette_id: Option<String>,
    },
    /// Inline bar proportional to the value.
    Bar {
        /// CSS color string.
        color: String,
    },
}

/// Per-column table options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    /// Display position.
    pub index: usize,
    /// Hidden columns are not rendered.
    #[serde(default)]
    pub is_hidden: bool,
    /// Grouped columns become row group headers.
    #[serde(default)]
    pub is_grouped: bool,
    /// Cell rendering.
    #[serde(default)]
    pub column_style: ColumnStyle,
}

/// One key of the table row sort.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSortingOption {
    /// Column to sort by.
    pub component_id: String,
    /// Direction.
    #[serde(default)]
    pub sorting_order: SortingOrder,
}

/// Orientation of the line axis in a line-column combo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineAxisOrientation {
    /// Line on the left axis, columns on the right.
    Left,
    /// Line on the right axis, columns on the left.
    #[default]
    Right,
}

/// Combo chart with several measures sharing one axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboLineSingleFields {
    /// Temporal x axis.
    pub x: GenericField,
    /// Measures plotted as lines.
    pub y: Vec<String>,
    /// Per-measure colors.
    #[serde(default)]
    pub color: Option<ColorField>,
}

/// Combo chart with a left and a right measure axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboLineDualFields {
    /// Temporal x axis.
    pub x: GenericField,
    /// Measure on the left axis.
    pub left_axis_component_id: String,
    /// Measure on the right axis.
    pub right_axis_component_id: String,
    /// Per-measure colors.
    #[serde(default)]
    pub color: Option<ColorField>,
}

/// Combo chart with columns and a line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboLineColumnFields {
    /// Temporal x axis, drawn as bands.
    pub x: GenericField,
    /// Measure drawn as columns.
    pub column_component_id: String,
    /// Measure drawn as a line.
    pub line_component_id: String,
    /// Which side the line axis goes to.
    #[serde(default)]
    pub line_axis_orientation: LineAxisOrientation,
    /// Per-measure colors.
    #[serde(default)]
    pub color: Option<ColorField>,
}

macro_rules! chart_config {
    ($(#[$doc:meta] $name:ident { $fields_ty:ty })*) => {
        $(
            #[$doc]
            #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct $name {
                /// Encodings.
                pub fields: $fields_ty,
                /// Enabled interactive filters.
                #[serde(default)]
                pub interactive_filters_config: InteractiveFiltersConfig,
            }

            impl $name {
                /// A configuration without interactive filters.
                pub fn new(fields: $fields_ty) -> Self {
                    Self {
                        fields,
                        interactive_filters_config: InteractiveFiltersConfig::default(),
                    }
                }
            }
        )*
    };
}

chart_config! {
    /// Area chart configuration.
    AreaConfig { AreaFields }
    /// Bar chart configuration.
    BarConfig { BarFields }
    /// Column chart configuration.
    ColumnConfig { ColumnFields }
    /// Line chart configuration.
    LineConfig { LineFields }
    /// Scatterplot configuration.
    ScatterplotConfig { ScatterplotFields }
    /// Pie chart configuration.
    PieConfig { PieFields }
    /// Map configuration.
    MapConfig { MapFields }
    /// Line combo configuration.
    ComboLineSingleConfig { ComboLineSingleFields }
    /// Dual-axis line combo configuration.
    ComboLineDualConfig { ComboLineDualFields }
    /// Line/column combo configuration.
    ComboLineColumnConfig { ComboLineColumnFields }
}

/// Table configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// Per-component column options.
    pub fields: BTreeMap<String, TableColumn>,
    /// Row sort keys, applied in order.
    #[serde(default)]
    pub sorting: Vec<TableSortingOption>,
    /// Enabled interactive filters.
    #[serde(default)]
    pub interactive_filters_config: InteractiveFiltersConfig,
}

/// A complete chart configuration, discriminated by `chartType`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "chartType", rename_all = "camelCase")]
pub enum ChartConfig {
    /// Stacked area chart over time.
    Area(AreaConfig),
    /// Horizontal bars.
    Bar(BarConfig),
    /// Vertical columns.
    Column(ColumnConfig),
    /// Lines over time.
    Line(LineConfig),
    /// Two measures against each other.
    Scatterplot(ScatterplotConfig),
    /// Shares of a whole.
    Pie(PieConfig),
    /// Choropleth and symbol map.
    Map(MapConfig),
    /// Sortable, groupable table.
    Table(TableConfig),
    /// Several lines on one axis.
    ComboLineSingle(ComboLineSingleConfig),
    /// Two lines on two axes.
    ComboLineDual(ComboLineDualConfig),
    /// Columns and a line on two axes.
    ComboLineColumn(ComboLineColumnConfig),
}

impl ChartConfig {
    /// The `chartType` discriminator.
    pub fn chart_type(&self) -> &'static str {
        match self {
            Self::Area(_) => "area",
            Self::Bar(_) => "bar",
            Self::Column(_) => "column",
            Self::Line(_) => "line",
            Self::Scatterplot(_) => "scatterplot",
            Self::Pie(_) => "pie",
            Self::Map(_) => "map",
            Self::Table(_) => "table",
            Self::ComboLineSingle(_) => "comboLineSingle",
            Self::ComboLineDual(_) => "comboLineDual",
            Self::ComboLineColumn(_) => "comboLineColumn",
        }
    }

    /// Enabled interactive filters.
    pub fn interactive_filters_config(&self) -> &InteractiveFiltersConfig {
        match self {
            Self::Area(c) => &c.interactive_filters_config,
            Self::Bar(c) => &c.interactive_filters_config,
            Self::Column(c) => &c.interactive_filters_config,
            Self::Line(c) => &c.interactive_filters_config,
            Self::Scatterplot(c) => &c.interactive_filters_config,
            Self::Pie(c) => &c.interactive_filters_config,
            Self::Map(c) => &c.interactive_filters_config,
            Self::Table(c) => &c.interactive_filters_config,
            Self::ComboLineSingle(c) => &c.interactive_filters_config,
            Self::ComboLineDual(c) => &c.interactive_filters_config,
            Self::ComboLineColumn(c) => &c.interactive_filters_config,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn column_config_round_trips_through_chart_type_tag() {
        let json = r##"{
            "chartType": "column",
            "fields": {
                "x": {"componentId": "year", "sorting": {"sortingType": "byTotalSize", "sortingOrder": "desc"}},
                "y": {"componentId": "val", "customDomain": [0, 50]},
                "segment": {"componentId": "cat", "type": "grouped"},
                "color": {"type": "segment", "componentId": "cat", "colorMapping": {"A": "#ff0000"}}
            },
            "interactiveFiltersConfig": {"legend": true, "calculation": true}
        }"##;
        let config: ChartConfig = serde_json::from_str(json).unwrap();
        let ChartConfig::Column(column) = &config else {
            panic!("expected a column config");
        };
        assert_eq!(config.chart_type(), "column");
        let sorting = column.fields.x.sorting.as_ref().unwrap();
        assert_eq!(sorting.sorting_type, SortingType::ByTotalSize);
        assert_eq!(sorting.sorting_order, SortingOrder::Desc);
        assert_eq!(column.fields.y.custom_domain, Some([0.0, 50.0]));
        assert_eq!(
            column.fields.segment.as_ref().unwrap().kind,
            SegmentKind::Grouped
        );
        assert!(config.interactive_filters_config().calculation);
        match &column.fields.color {
            ColorField::Segment { color_mapping, .. } => {
                assert_eq!(color_mapping.get("A").map(String::as_str), Some("#ff0000"));
            }
            other => panic!("unexpected color field {other:?}"),
        }
    }

    #[test]
    fn measure_color_defaults_to_five_classes() {
        let color: ColorField = serde_json::from_str(
            r#"{"type": "measure", "componentId": "val", "scaleType": "discrete", "interpolationType": "jenks"}"#,
        )
        .unwrap();
        assert_eq!(
            color,
            ColorField::Measure {
                component_id: "val".into(),
                palette_id: None,
                scale_type: ColorScaleType::Discrete,
                interpolation_type: ColorInterpolation::Jenks,
                nb_class: 5,
            }
        );
    }
}
