// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

/// Configuration-integrity failures raised while deriving a chart state.
///
/// Data problems (empty views, `NaN` values, degenerate domains) are never errors; they
/// resolve to renderable defaults instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    /// A configured component id is not part of the cube metadata.
    #[error("component `{id}` is not present in the cube metadata")]
    MissingComponent {
        /// The missing id.
        id: String,
    },
    /// A chart type needs an encoding that is not configured.
    #[error("{chart} chart has no `{role}` field configured")]
    MissingField {
        /// Chart type discriminator.
        chart: &'static str,
        /// Encoding role.
        role: &'static str,
    },
    /// A component cannot serve the role it is mapped to.
    #[error("component `{id}` cannot be used as {role}: expected {expected}")]
    InvalidComponent {
        /// Offending component id.
        id: String,
        /// Encoding role.
        role: &'static str,
        /// What the role accepts.
        expected: &'static str,
    },
    /// The configuration could not be parsed.
    #[error("invalid chart configuration: {0}")]
    InvalidConfig(String),
}
