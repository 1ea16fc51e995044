// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chart-state derivation for `CubeViz`.
//!
//! Given observations, component metadata, a chart configuration and the current
//! interactive filters, this crate derives an immutable, fully resolved chart state:
//! - **Scales** are built in two steps. A `*Spec` holds the domain, `instantiate` assigns
//!   the range once margins are known.
//! - **Margins** come from measured tick labels of the padding data (data filters only), so
//!   toggling legend entries or brushing time does not make the plot jump.
//! - **Segments** are sorted once over the unfiltered data, so colors stay stable while
//!   filters hide values.
//! - **Tooltips** and annotations are computed from the state for a hovered observation.
//!
//! Nothing here draws. Renderers read the states and emit their own primitives.
//!
//! ```
//! use cubeviz_charts::{ChartDimensions, ChartInputs, ChartState};
//! use cubeviz_core::{
//!     ChartConfig, Component, ComponentKind, Components, InteractiveFiltersState, Observation,
//! };
//! use cubeviz_text::HeuristicTextMeasurer;
//!
//! let components = Components::new(vec![
//!     Component::new("year", "Year", ComponentKind::OrdinalDimension),
//!     Component::new("value", "Value", ComponentKind::NumericalMeasure),
//! ]);
//! let observations = vec![
//!     Observation::new().with("year", "2020").with("value", 4.0),
//!     Observation::new().with("year", "2021").with("value", 6.0),
//! ];
//! let config: ChartConfig = serde_json::from_str(
//!     r#"{"chartType": "column", "fields": {"x": {"componentId": "year"}, "y": {"componentId": "value"}}}"#,
//! )
//! .unwrap();
//! let filters = InteractiveFiltersState::default();
//! let inputs = ChartInputs::new(
//!     &observations,
//!     &components,
//!     &filters,
//!     ChartDimensions::new(640.0),
//!     &HeuristicTextMeasurer,
//! );
//! let state = ChartState::derive(&config, &inputs).unwrap();
//! assert_eq!(state.chart_type(), "column");
//! assert!(state.bounds().chart_width > 0.0);
//! ```

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod accessors;
mod area_state;
mod band_chart;
mod bar_state;
mod breaks;
mod chart_data;
mod chart_state;
mod color;
mod column_state;
mod combo_state;
#[cfg(not(feature = "std"))]
mod float;
mod format;
mod layout;
mod line_state;
mod map_state;
mod padding;
mod pie_state;
mod scale;
mod scatterplot_state;
#[cfg(test)]
mod state_tests;
mod table_state;
mod time;
mod tooltip;

pub use accessors::{ErrorGetter, LabelGetter, NumericGetter, StringGetter, TemporalGetter};
pub use area_state::{AreaState, derive_area_state};
pub use band_chart::{BandChartState, BandDatum, BandLayout, BandMark, Orientation};
pub use bar_state::{BarState, derive_bar_state};
pub use breaks::{
    ThresholdSide, classify, jenks_breaks, quantile_sorted, quantile_thresholds,
    quantize_thresholds,
};
pub use chart_data::{Axis, ChartInputs, Segments};
pub use chart_state::{ChartState, ChartStateCache};
pub use color::{
    ColorScale, DEFAULT_COLOR, Interpolator, NumericColorScale, UNKNOWN_COLOR,
    categorical_colors, categorical_palette, interpolator, parse_css_color, to_hex,
};
pub use column_state::{ColumnState, derive_column_state};
pub use combo_state::{
    ComboAxis, ComboColumn, ComboLineColumnState, ComboLineState, ComboMeasure,
    derive_combo_line_column_state, derive_combo_line_dual_state, derive_combo_line_single_state,
};
pub use format::{MISSING_VALUE, ValueFormatter, decimals_for_step, format_number, format_tick};
pub use layout::{Bounds, ChartDimensions, DEFAULT_ASPECT_RATIO, MOBILE_BREAKPOINT};
pub use line_state::{LinePoint, LineSeries, LineState, derive_line_state};
pub use map_state::{
    AreaLayerState, DEFAULT_SYMBOL_RADIUS, LayerColors, MAX_SYMBOL_RADIUS, MapArea, MapFeature,
    MapState, MapSymbol, SymbolLayerState, derive_map_state,
};
pub use padding::{
    AXIS_TITLE_FONT_SIZE, AXIS_TITLE_PADDING, BAR_HEIGHT, BAR_SPACE, BRUSH_BOTTOM_SPACE,
    ChartPadding, MIN_MARGIN, RIGHT_MARGIN, TICK_FONT_SIZE, TICK_PADDING, tick_style,
    title_style,
};
pub use pie_state::{PieArc, PieState, derive_pie_state};
pub use scale::{
    DEFAULT_DOMAIN, DomainOptions, ScaleBand, ScaleBandSpec, ScaleLinear, ScaleLinearSpec,
    ScaleOrdinal, ScaleSqrt, ScaleTime, ScaleTimeSpec, numeric_domain,
};
pub use scatterplot_state::{DOT_RADIUS, ScatterPoint, ScatterplotState, derive_scatterplot_state};
pub use table_state::{
    CellStyle, ROW_HEIGHT, TableCell, TableColumnState, TableRow, TableState, derive_table_state,
};
pub use time::{format_time, format_time_tick, nice_time_ticks, parse_temporal};
pub use tooltip::{
    AnnotationInfo, MOBILE_PLACEMENT, TooltipInfo, TooltipPlacement, TooltipValue, TooltipX,
    TooltipY, centered_placement, in_segment_order, placement as tooltip_placement,
};
