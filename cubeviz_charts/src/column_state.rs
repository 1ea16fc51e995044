// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column charts.

use cubeviz_core::{ChartError, ColumnConfig};

use crate::band_chart::{BandChartState, BandFields, Orientation, derive_band_chart};
use crate::chart_data::ChartInputs;

/// Resolved state of a column chart.
pub type ColumnState = BandChartState;

/// Derives a column chart: sorted x bands, a y measure floored at zero.
#[tracing::instrument(skip_all, fields(x = %config.fields.x.component_id))]
pub fn derive_column_state(config: &ColumnConfig, inputs: &ChartInputs<'_>) -> Result<ColumnState, ChartError> {
    let fields = BandFields {
        band: &config.fields.x,
        value: &config.fields.y,
        segment: config.fields.segment.as_ref(),
        color: &config.fields.color,
        interactive: &config.interactive_filters_config,
    };
    derive_band_chart(&fields, inputs, Orientation::Vertical)
}
