// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bar charts: columns turned sideways, with one fixed-height row per band.

use cubeviz_core::{BarConfig, ChartError};

use crate::band_chart::{BandChartState, BandFields, Orientation, derive_band_chart};
use crate::chart_data::ChartInputs;

/// Resolved state of a bar chart.
pub type BarState = BandChartState;

/// Derives a bar chart: sorted y bands, an x measure floored at zero.
///
/// The plot height grows with the number of bands; the left margin fits the band labels.
#[tracing::instrument(skip_all, fields(y = %config.fields.y.component_id))]
pub fn derive_bar_state(config: &BarConfig, inputs: &ChartInputs<'_>) -> Result<BarState, ChartError> {
    let fields = BandFields {
        band: &config.fields.y,
        value: &config.fields.x,
        segment: config.fields.segment.as_ref(),
        color: &config.fields.color,
        interactive: &config.interactive_filters_config,
    };
    derive_band_chart(&fields, inputs, Orientation::Horizontal)
}
