// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data model for `CubeViz` chart derivation.
//!
//! This crate holds everything the chart-state derivation consumes but does not compute:
//! - **Observations**: long-format records keyed by component id.
//! - **Components**: dimension and measure metadata of a data cube.
//! - **Chart configuration**: the user-chosen encodings per chart type.
//! - **Interactive filters**: per-chart filter stores and a registry for dashboards.
//! - **Memoization**: a content-keyed cache that preserves result identity.
//!
//! Derivation itself (scales, stacks, margins, tooltips) lives in `cubeviz_charts`.

#![no_std]

extern crate alloc;

mod component;
mod config;
mod error;
mod filters;
mod memo;
mod observation;

pub use component::{
    Component, ComponentKind, Components, DimensionValue, Limit, LimitKind, RelatedComponent,
    RelatedKind, TimeUnit,
};
pub use config::{
    AreaConfig, AreaFields, AreaLayerField, BarConfig, BarFields, ChartConfig, ColorField,
    ColorInterpolation, ColorScaleType, ColumnConfig, ColumnFields, ColumnStyle,
    ComboLineColumnConfig, ComboLineColumnFields, ComboLineDualConfig, ComboLineDualFields,
    ComboLineSingleConfig, ComboLineSingleFields, GenericField, ImputationType,
    InteractiveFiltersConfig, LineAxisOrientation, LineConfig, LineFields, MapConfig, MapFields,
    MeasureField, PieConfig, PieFields, ScatterplotConfig, ScatterplotFields, SegmentField,
    SegmentKind, Sorting, SortingOrder, SortingType, SymbolLayerField, TableColumn, TableConfig,
    TableSortingOption,
};
pub use error::ChartError;
pub use filters::{
    Calculation, FilterStore, FilterStoreRegistry, InteractiveFiltersState, TimeRange,
};
pub use memo::{Fingerprint, Memo};
pub use observation::{Observation, ObservationValue};
