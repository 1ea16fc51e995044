// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The chart-type dispatcher and its memoizing cache.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ptr;

use cubeviz_core::{ChartConfig, ChartError, Memo, Observation};

use crate::area_state::{AreaState, derive_area_state};
use crate::band_chart::BandChartState;
use crate::bar_state::derive_bar_state;
use crate::chart_data::ChartInputs;
use crate::column_state::derive_column_state;
use crate::combo_state::{
    ComboLineColumnState, ComboLineState, derive_combo_line_column_state,
    derive_combo_line_dual_state, derive_combo_line_single_state,
};
use crate::layout::Bounds;
use crate::line_state::{LineState, derive_line_state};
use crate::map_state::{MapState, derive_map_state};
use crate::pie_state::{PieState, derive_pie_state};
use crate::scatterplot_state::{ScatterplotState, derive_scatterplot_state};
use crate::table_state::{TableState, derive_table_state};
use crate::tooltip::{AnnotationInfo, TooltipInfo};

/// A derived chart of any type.
#[derive(Clone, Debug)]
pub enum ChartState {
    /// Stacked areas.
    Area(AreaState),
    /// Horizontal bars.
    Bar(BandChartState),
    /// Vertical columns.
    Column(BandChartState),
    /// Lines.
    Line(LineState),
    /// Dots.
    Scatterplot(ScatterplotState),
    /// Arcs.
    Pie(PieState),
    /// Areas and symbols.
    Map(MapState),
    /// Rows and columns.
    Table(TableState),
    /// Several lines on one axis.
    ComboLineSingle(ComboLineState),
    /// Two lines on two axes.
    ComboLineDual(ComboLineState),
    /// Columns and a line on two axes.
    ComboLineColumn(ComboLineColumnState),
}

impl ChartState {
    /// Derives the state for `config`.
    pub fn derive(config: &ChartConfig, inputs: &ChartInputs<'_>) -> Result<Self, ChartError> {
        Ok(match config {
            ChartConfig::Area(c) => Self::Area(derive_area_state(c, inputs)?),
            ChartConfig::Bar(c) => Self::Bar(derive_bar_state(c, inputs)?),
            ChartConfig::Column(c) => Self::Column(derive_column_state(c, inputs)?),
            ChartConfig::Line(c) => Self::Line(derive_line_state(c, inputs)?),
            ChartConfig::Scatterplot(c) => Self::Scatterplot(derive_scatterplot_state(c, inputs)?),
            ChartConfig::Pie(c) => Self::Pie(derive_pie_state(c, inputs)?),
            ChartConfig::Map(c) => Self::Map(derive_map_state(c, inputs)?),
            ChartConfig::Table(c) => Self::Table(derive_table_state(c, inputs)?),
            ChartConfig::ComboLineSingle(c) => {
                Self::ComboLineSingle(derive_combo_line_single_state(c, inputs)?)
            }
            ChartConfig::ComboLineDual(c) => {
                Self::ComboLineDual(derive_combo_line_dual_state(c, inputs)?)
            }
            ChartConfig::ComboLineColumn(c) => {
                Self::ComboLineColumn(derive_combo_line_column_state(c, inputs)?)
            }
        })
    }

    /// The `chartType` this state was derived for.
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

    /// Arranged geometry.
    pub fn bounds(&self) -> &Bounds {
        match self {
            Self::Area(s) => &s.bounds,
            Self::Bar(s) | Self::Column(s) => &s.bounds,
            Self::Line(s) => &s.bounds,
            Self::Scatterplot(s) => &s.bounds,
            Self::Pie(s) => &s.bounds,
            Self::Map(s) => &s.bounds,
            Self::Table(s) => &s.bounds,
            Self::ComboLineSingle(s) | Self::ComboLineDual(s) => &s.bounds,
            Self::ComboLineColumn(s) => &s.bounds,
        }
    }

    /// Tooltip for a hovered observation. Tables have none.
    pub fn tooltip_info(&self, o: &Observation) -> Option<TooltipInfo> {
        match self {
            Self::Area(s) => s.tooltip_info(o),
            Self::Bar(s) | Self::Column(s) => s.tooltip_info(o),
            Self::Line(s) => s.tooltip_info(o),
            Self::Scatterplot(s) => s.tooltip_info(o),
            Self::Pie(s) => s.tooltip_info(o),
            Self::Map(s) => s.tooltip_info(o),
            Self::Table(_) => None,
            Self::ComboLineSingle(s) | Self::ComboLineDual(s) => s.tooltip_info(o),
            Self::ComboLineColumn(s) => s.tooltip_info(o),
        }
    }

    /// Highlight for a hovered observation. Tables have none.
    pub fn annotation_info(&self, o: &Observation) -> Option<AnnotationInfo> {
        match self {
            Self::Area(s) => s.annotation_info(o),
            Self::Bar(s) | Self::Column(s) => s.annotation_info(o),
            Self::Line(s) => s.annotation_info(o),
            Self::Scatterplot(s) => s.annotation_info(o),
            Self::Pie(s) => s.annotation_info(o),
            Self::Map(s) => s.annotation_info(o),
            Self::Table(_) => None,
            Self::ComboLineSingle(s) | Self::ComboLineDual(s) => s.annotation_info(o),
            Self::ComboLineColumn(s) => s.annotation_info(o),
        }
    }
}

/// Re-derives a chart only when one of its inputs changed.
///
/// Unchanged inputs return the same [`Arc`], so renderers can skip work with
/// [`Arc::ptr_eq`]. The text measurer counts as an input: another measurer, or a bump of
/// its [`revision`](cubeviz_text::TextMeasurer::revision), derives new margins.
#[derive(Debug, Default)]
pub struct ChartStateCache {
    memo: Memo<ChartState>,
}

impl ChartStateCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The state for these inputs, derived at most once per distinct input set.
    pub fn get(&mut self, config: &ChartConfig, inputs: &ChartInputs<'_>) -> Result<Arc<ChartState>, ChartError> {
        let mut fp = self.memo.fingerprint();
        fp.debug(config)
            .observations(inputs.observations)
            .debug(&inputs.components.iter().collect::<Vec<_>>())
            .debug(inputs.filters)
            .debug(&inputs.dimensions)
            .debug(&inputs.features)
            .usize(ptr::from_ref(inputs.measurer).cast::<()>().addr())
            .u64(inputs.measurer.revision());
        let key = fp.finish();
        self.memo
            .try_get_or_derive(key, || ChartState::derive(config, inputs))
    }

    /// How many times a state was actually derived.
    pub fn derivations(&self) -> u64 {
        self.memo.derivations()
    }
}
