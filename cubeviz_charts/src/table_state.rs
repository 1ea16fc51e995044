// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tables: column order, row grouping and sorting, and per-column cell styles.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use cubeviz_core::{
    ChartError, ColorInterpolation, ColorScaleType, ColumnStyle, Component, Observation,
    Sorting, SortingOrder, SortingType, TableConfig,
};
use cubeviz_transforms::{CategorySorter, SortContext, unique_in_order};
use kurbo::Insets;
use peniko::Color;

use crate::accessors::{LabelGetter, NumericGetter, StringGetter, TemporalGetter};
use crate::chart_data::{ChartInputs, DataViews};
use crate::color::{
    ColorScale, DEFAULT_COLOR, NumericColorScale, categorical_colors, parse_css_color,
};
use crate::format::{MISSING_VALUE, ValueFormatter};
use crate::layout::Bounds;
use crate::scale::{DomainOptions, ScaleLinear, numeric_domain};
use crate::time::format_time;

/// Height of one table row.
pub const ROW_HEIGHT: f64 = 32.0;

/// How a column's cells are styled.
#[derive(Clone, Debug, PartialEq)]
pub enum CellStyle {
    /// Plain text.
    Text,
    /// Category chip colors.
    Category(ColorScale),
    /// Background colors by value.
    Heatmap(NumericColorScale),
    /// Bars over `[0, 1]` of the cell width.
    Bar {
        /// Value to cell fraction.
        scale: ScaleLinear,
        /// Bar fill.
        color: Color,
    },
}

/// A visible or grouped column.
#[derive(Clone, Debug)]
pub struct TableColumnState {
    /// Component id.
    pub component_id: String,
    /// Header text.
    pub label: String,
    /// Rows are grouped by this column.
    pub is_grouped: bool,
    /// Cell styling.
    pub style: CellStyle,
    reader: CellReader,
}

#[derive(Clone, Debug)]
enum CellReader {
    Number(NumericGetter, ValueFormatter),
    Time(TemporalGetter, Option<cubeviz_core::TimeUnit>),
    Category(StringGetter, LabelGetter),
}

/// One rendered cell.
#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    /// Formatted text.
    pub text: String,
    /// Chip or background color.
    pub color: Option<Color>,
    /// Bar extent as fractions of the cell width.
    pub bar: Option<(f64, f64)>,
}

/// One row, with its group path.
#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    /// Text of the grouped columns, outermost first.
    pub groups: Vec<String>,
    /// Cells of the display columns.
    pub cells: Vec<TableCell>,
}

/// Resolved state of a table.
#[derive(Clone, Debug)]
pub struct TableState {
    /// Arranged geometry.
    pub bounds: Bounds,
    /// Grouped columns by index.
    pub group_columns: Vec<TableColumnState>,
    /// Visible, non-grouped columns by index.
    pub columns: Vec<TableColumnState>,
    /// Sorted rows.
    pub rows: Vec<TableRow>,
}

impl TableColumnState {
    fn new(component: &Component, is_grouped: bool, style: &ColumnStyle, views: &DataViews<'_>) -> Self {
        let reader = if component.kind.is_numeric() {
            CellReader::Number(
                NumericGetter::new(component.id.clone()),
                ValueFormatter::for_component(component),
            )
        } else if component.kind.is_temporal() {
            CellReader::Time(TemporalGetter::new(component), component.time_unit)
        } else {
            CellReader::Category(
                StringGetter::new(component.id.clone()),
                LabelGetter::new(component, false),
            )
        };
        let numbers = |rows: &[&Observation]| -> Vec<f64> {
            let id = component.id.as_str();
            rows.iter().map(|o| o.number(id)).filter(|v| v.is_finite()).collect()
        };
        let style = match style {
            ColumnStyle::Text => CellStyle::Text,
            ColumnStyle::Category {
                palette_id,
                color_mapping,
            } => {
                let mut domain = unique_in_order(views.all.iter().filter_map(|o| o.key(&component.id)));
                let ctx = SortContext::from_component(component);
                CategorySorter::new(&ctx, None).sort(&mut domain);
                CellStyle::Category(ColorScale::Categorical(categorical_colors(
                    &domain,
                    palette_id.as_deref(),
                    color_mapping,
                    Some(component),
                )))
            }
            ColumnStyle::Heatmap { palette_id } => CellStyle::Heatmap(NumericColorScale::new(
                &numbers(&views.filtered),
                palette_id.as_deref(),
                ColorScaleType::Continuous,
                ColorInterpolation::Linear,
                0,
            )),
            ColumnStyle::Bar { color } => {
                let options = DomainOptions {
                    floor_zero: true,
                    ..DomainOptions::default()
                };
                CellStyle::Bar {
                    scale: ScaleLinear::new(numeric_domain(numbers(&views.filtered), &options), (0.0, 1.0)),
                    color: parse_css_color(color).unwrap_or(DEFAULT_COLOR),
                }
            }
        };
        Self {
            component_id: component.id.clone(),
            label: component.label.clone(),
            is_grouped,
            style,
            reader,
        }
    }

    fn text(&self, o: &Observation) -> String {
        match &self.reader {
            CellReader::Number(g, f) => f.format_with_unit(g.get(o)),
            CellReader::Time(g, unit) => g.get(o).map_or_else(|| MISSING_VALUE.into(), |t| format_time(t, *unit)),
            CellReader::Category(g, labels) => g
                .get(o)
                .map_or_else(|| MISSING_VALUE.into(), |k| labels.label(&k).into()),
        }
    }

    fn cell(&self, o: &Observation) -> TableCell {
        let value = o.number(&self.component_id);
        let (color, bar) = match &self.style {
            CellStyle::Text => (None, None),
            CellStyle::Category(scale) => (o.key(&self.component_id).map(|k| scale.for_key(&k)), None),
            CellStyle::Heatmap(scale) => (value.is_finite().then(|| scale.color(value)), None),
            CellStyle::Bar { scale, color } => {
                let bar = value.is_finite().then(|| {
                    let (a, b) = (scale.map(0.0), scale.map(value));
                    (a.min(b), a.max(b))
                });
                (Some(*color), bar)
            }
        };
        TableCell {
            text: self.text(o),
            color,
            bar,
        }
    }
}

/// Compares two observations by one column.
///
/// Numbers compare numerically with missing values last. Everything else uses the table
/// sorting comparator, numeric-aware over labels.
fn compare_by(component: &Component, ctx: &SortContext, a: &Observation, b: &Observation) -> Ordering {
    if component.kind.is_numeric() {
        let (x, y) = (a.number(&component.id), b.number(&component.id));
        return match (x.is_nan(), y.is_nan()) {
            (false, false) => x.total_cmp(&y),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (true, true) => Ordering::Equal,
        };
    }
    let sorting = Sorting::new(SortingType::ByTableSortingType, SortingOrder::Asc);
    let sorter = CategorySorter::new(ctx, Some(&sorting));
    match (a.key(&component.id), b.key(&component.id)) {
        (Some(x), Some(y)) => sorter.compare(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Derives a table.
///
/// Rows are sorted by the grouped columns first, then by every sorting option in turn.
#[tracing::instrument(skip_all, fields(columns = config.fields.len()))]
pub fn derive_table_state(config: &TableConfig, inputs: &ChartInputs<'_>) -> Result<TableState, ChartError> {
    let views = DataViews::new(inputs, &config.interactive_filters_config, None, None, false);
    let mut group_columns = Vec::new();
    let mut columns = Vec::new();
    let mut ordered: Vec<(&String, &cubeviz_core::TableColumn)> = config.fields.iter().collect();
    ordered.sort_by_key(|(_, c)| c.index);
    for (id, column) in ordered {
        let component = inputs.components.require(id)?;
        if column.is_grouped {
            group_columns.push(TableColumnState::new(component, true, &column.column_style, &views));
        } else if !column.is_hidden {
            columns.push(TableColumnState::new(component, false, &column.column_style, &views));
        }
    }

    let mut keys: Vec<(&Component, SortContext, SortingOrder)> = Vec::new();
    for c in &group_columns {
        let component = inputs.components.require(&c.component_id)?;
        keys.push((component, SortContext::from_component(component), SortingOrder::Asc));
    }
    for option in &config.sorting {
        let component = inputs.components.require(&option.component_id)?;
        keys.push((component, SortContext::from_component(component), option.sorting_order));
    }
    let mut sorted = views.chart.clone();
    sorted.sort_by(|a, b| {
        for (component, ctx, order) in &keys {
            let mut ord = compare_by(component, ctx, a, b);
            if *order == SortingOrder::Desc {
                ord = ord.reverse();
            }
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    let rows: Vec<TableRow> = sorted
        .iter()
        .map(|o| TableRow {
            groups: group_columns.iter().map(|c| c.text(o)).collect(),
            cells: columns.iter().map(|c| c.cell(o)).collect(),
        })
        .collect();

    let dims = inputs.dimensions;
    #[allow(clippy::cast_precision_loss, reason = "row counts are far below 2^52")]
    let height = (rows.len() + 1) as f64 * ROW_HEIGHT;
    let bounds = Bounds::with_chart_height(&dims, Insets::ZERO, height);
    tracing::debug!(
        rows = rows.len(),
        columns = columns.len(),
        groups = group_columns.len(),
        "derived table"
    );

    Ok(TableState {
        bounds,
        group_columns,
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::collections::BTreeMap;
    use alloc::string::ToString;
    use alloc::vec;

    use cubeviz_core::{ComponentKind, Components, InteractiveFiltersState, TableColumn, TableSortingOption};
    use cubeviz_text::HeuristicTextMeasurer;

    use super::*;
    use crate::layout::ChartDimensions;

    fn column(index: usize) -> TableColumn {
        TableColumn {
            index,
            ..TableColumn::default()
        }
    }

    #[test]
    fn groups_then_sorting_options_order_rows() {
        let components = Components::new(vec![
            Component::new("region", "Region", ComponentKind::NominalDimension),
            Component::new("item", "Item", ComponentKind::OrdinalDimension),
            Component::new("val", "Value", ComponentKind::NumericalMeasure),
            Component::new("note", "Note", ComponentKind::NominalDimension),
        ]);
        let observations: Vec<Observation> = [
            ("south", "10", 1.0),
            ("north", "9", 5.0),
            ("south", "2", 3.0),
            ("north", "10", 2.0),
        ]
        .into_iter()
        .map(|(r, i, v)| {
            Observation::new()
                .with("region", r)
                .with("item", i)
                .with("val", v)
                .with("note", "x")
        })
        .collect();
        let mut fields = BTreeMap::new();
        fields.insert(
            "region".to_string(),
            TableColumn {
                is_grouped: true,
                ..column(3)
            },
        );
        fields.insert("val".to_string(), TableColumn {
            column_style: ColumnStyle::Bar { color: "#ff0000".into() },
            ..column(1)
        });
        fields.insert("item".to_string(), column(0));
        fields.insert(
            "note".to_string(),
            TableColumn {
                is_hidden: true,
                ..column(2)
            },
        );
        let config = TableConfig {
            fields,
            sorting: vec![TableSortingOption {
                component_id: "item".into(),
                sorting_order: SortingOrder::Asc,
            }],
            ..TableConfig::default()
        };
        let filters = InteractiveFiltersState::default();
        let inputs = ChartInputs::new(
            &observations,
            &components,
            &filters,
            ChartDimensions::default(),
            &HeuristicTextMeasurer,
        );
        let state = derive_table_state(&config, &inputs).unwrap();

        let headers: Vec<&str> = state.columns.iter().map(|c| c.component_id.as_str()).collect();
        assert_eq!(headers, ["item", "val"]);
        assert_eq!(state.group_columns.len(), 1);

        let order: Vec<(&str, &str)> = state
            .rows
            .iter()
            .map(|r| (r.groups[0].as_str(), r.cells[0].text.as_str()))
            .collect();
        assert_eq!(
            order,
            [("north", "9"), ("north", "10"), ("south", "2"), ("south", "10")]
        );
        let widest = state.rows.iter().filter_map(|r| r.cells[1].bar).map(|b| b.1).fold(0.0, f64::max);
        assert!((widest - 1.0).abs() < 1e-12);
    }
}
