// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dimension and measure metadata.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::ChartError;

/// Type tag of a cube component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Dates or date-times with a time unit.
    TemporalDimension,
    /// Ordered periods that are not plotted on a continuous time axis.
    TemporalOrdinalDimension,
    /// Ordered categories.
    OrdinalDimension,
    /// Unordered categories.
    NominalDimension,
    /// Areas on a map.
    GeoShapesDimension,
    /// Points on a map.
    GeoCoordinatesDimension,
    /// Standard error of a measure.
    StandardErrorDimension,
    /// Upper confidence bound of a measure.
    ConfidenceUpperBoundDimension,
    /// Lower confidence bound of a measure.
    ConfidenceLowerBoundDimension,
    /// Continuous numeric measure.
    NumericalMeasure,
    /// Ordinal measure (ranked values).
    OrdinalMeasure,
}

impl ComponentKind {
    /// Temporal dimensions plotted on a time scale.
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::TemporalDimension)
    }

    /// Any measure.
    pub fn is_measure(self) -> bool {
        matches!(self, Self::NumericalMeasure | Self::OrdinalMeasure)
    }

    /// Components whose values can be read as numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::NumericalMeasure
                | Self::OrdinalMeasure
                | Self::StandardErrorDimension
                | Self::ConfidenceUpperBoundDimension
                | Self::ConfidenceLowerBoundDimension
        )
    }

    /// Dimensions that can be used as a map layer.
    pub fn is_geo(self) -> bool {
        matches!(
            self,
            Self::GeoShapesDimension | Self::GeoCoordinatesDimension
        )
    }
}

/// Granularity of a temporal dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Years.
    Year,
    /// Months.
    Month,
    /// Weeks.
    Week,
    /// Days.
    Day,
    /// Hours.
    Hour,
    /// Minutes.
    Minute,
    /// Seconds.
    Second,
}

/// An enumerated value of a dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionValue {
    /// The raw value as it appears in observations.
    pub value: String,
    /// Human readable label.
    pub label: String,
    /// Abbreviation shown when a field enables `useAbbreviations`.
    #[serde(default)]
    pub alternate_name: Option<String>,
    /// Color defined by the cube publisher (CSS color string).
    #[serde(default)]
    pub color: Option<String>,
    /// Explicit ordering position.
    #[serde(default)]
    pub position: Option<f64>,
}

impl DimensionValue {
    /// Creates a value whose label equals its raw value.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            alternate_name: None,
            color: None,
            position: None,
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the abbreviation.
    #[must_use]
    pub fn with_alternate_name(mut self, name: impl Into<String>) -> Self {
        self.alternate_name = Some(name.into());
        self
    }

    /// Sets the ordering position.
    #[must_use]
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the publisher color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// How a related component qualifies a measure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelatedKind {
    /// Symmetric standard error.
    StandardError,
    /// Distance from the value to the upper confidence bound.
    ConfidenceUpperBound,
    /// Distance from the value to the lower confidence bound.
    ConfidenceLowerBound,
}

/// Link from a measure to an error component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedComponent {
    /// Relation type.
    #[serde(rename = "type")]
    pub kind: RelatedKind,
    /// Id of the related component.
    pub component_id: String,
}

/// Shape of a configured limit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LimitKind {
    /// A single target value.
    Single {
        /// The value.
        value: f64,
    },
    /// A target band.
    ValueRange {
        /// Lower end.
        min: f64,
        /// Upper end.
        max: f64,
    },
}

/// A reference value published alongside a measure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limit {
    /// Label shown in the legend.
    pub label: String,
    /// CSS color string.
    #[serde(default)]
    pub color: Option<String>,
    /// Value or range.
    #[serde(flatten)]
    pub kind: LimitKind,
}

impl Limit {
    /// Values that must be visible on the measure axis.
    pub fn values(&self) -> [f64; 2] {
        match self.kind {
            LimitKind::Single { value } => [value, value],
            LimitKind::ValueRange { min, max } => [min, max],
        }
    }
}

/// Dimension or measure metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Component identifier (usually an IRI).
    pub id: String,
    /// Human readable label, used for axis titles.
    pub label: String,
    /// Type tag.
    #[serde(rename = "__typename")]
    pub kind: ComponentKind,
    /// Unit symbol, e.g. `"%"` or `"CHF"`.
    #[serde(default)]
    pub unit: Option<String>,
    /// Time granularity for temporal dimensions.
    #[serde(default)]
    pub time_unit: Option<TimeUnit>,
    /// `strftime`-style pattern of the raw temporal values.
    #[serde(default)]
    pub time_format: Option<String>,
    /// Number of fraction digits values are published with.
    #[serde(default)]
    pub resolution: Option<usize>,
    /// Whether the measure is a currency amount.
    #[serde(default)]
    pub is_currency: bool,
    /// Enumerated values (dimensions only).
    #[serde(default)]
    pub values: Vec<DimensionValue>,
    /// Error components qualifying this measure.
    #[serde(default)]
    pub related: Vec<RelatedComponent>,
    /// Published limits.
    #[serde(default)]
    pub limits: Vec<Limit>,
}

impl Component {
    /// Creates a component with no values, unit or relations.
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            unit: None,
            time_unit: None,
            time_format: None,
            resolution: None,
            is_currency: false,
            values: Vec::new(),
            related: Vec::new(),
            limits: Vec::new(),
        }
    }

    /// Sets the unit.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the time unit and raw value format.
    #[must_use]
    pub fn with_time(mut self, unit: TimeUnit, format: impl Into<String>) -> Self {
        self.time_unit = Some(unit);
        self.time_format = Some(format.into());
        self
    }

    /// Sets the enumerated values.
    #[must_use]
    pub fn with_values(mut self, values: Vec<DimensionValue>) -> Self {
        self.values = values;
        self
    }

    /// Adds a related error component.
    #[must_use]
    pub fn with_related(mut self, kind: RelatedKind, component_id: impl Into<String>) -> Self {
        self.related.push(RelatedComponent {
            kind,
            component_id: component_id.into(),
        });
        self
    }

    /// Adds a limit.
    #[must_use]
    pub fn with_limit(mut self, limit: Limit) -> Self {
        self.limits.push(limit);
        self
    }

    /// Whether values are expressed in percent.
    pub fn is_percent(&self) -> bool {
        self.unit.as_deref().is_some_and(|u| u.trim() == "%")
    }

    /// Looks up an enumerated value.
    pub fn value(&self, raw: &str) -> Option<&DimensionValue> {
        self.values.iter().find(|v| v.value == raw)
    }

    /// The related component id for `kind`, if declared.
    pub fn related_id(&self, kind: RelatedKind) -> Option<&str> {
        self.related
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.component_id.as_str())
    }
}

/// Metadata lookup table for one cube.
#[derive(Clone, Debug, Default)]
pub struct Components {
    items: Vec<Component>,
    by_id: HashMap<String, usize>,
}

impl Components {
    /// Builds a lookup table; later duplicates win.
    pub fn new(items: Vec<Component>) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        for (i, c) in items.iter().enumerate() {
            by_id.insert(c.id.clone(), i);
        }
        Self { items, by_id }
    }

    /// Tolerant lookup.
    pub fn get(&self, id: &str) -> Option<&Component> {
        self.by_id.get(id).and_then(|&i| self.items.get(i))
    }

    /// Lookup that fails when a configured component no longer exists.
    pub fn require(&self, id: &str) -> Result<&Component, ChartError> {
        self.get(id).ok_or_else(|| ChartError::MissingComponent { id: id.into() })
    }

    /// All components in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.items.iter()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` when no components are known.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Component> for Components {
    fn from_iter<T: IntoIterator<Item = Component>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn require_reports_missing_component() {
        let components = Components::new(alloc::vec![Component::new(
            "cat",
            "Category",
            ComponentKind::NominalDimension,
        )]);
        assert!(components.require("cat").is_ok());
        assert_eq!(
            components.require("gone").unwrap_err(),
            ChartError::MissingComponent { id: "gone".into() }
        );
        assert!(components.get("gone").is_none());
    }

    #[test]
    fn deserializes_component_with_limits_and_relations() {
        let json = r#"{
            "id": "val",
            "label": "Value",
            "__typename": "NumericalMeasure",
            "unit": "%",
            "related": [{"type": "StandardError", "componentId": "se"}],
            "limits": [{"label": "Target", "type": "valueRange", "min": 5, "max": 8}]
        }"#;
        let c: Component = serde_json::from_str(json).unwrap();
        assert!(c.is_percent());
        assert_eq!(c.related_id(RelatedKind::StandardError), Some("se"));
        assert_eq!(c.limits[0].values(), [5.0, 8.0]);
    }
}
