// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed getters from observations.
//!
//! Getters are built from field configuration and component metadata. A getter whose
//! component is absent from the metadata is simply not built; callers treat that as an
//! unmapped encoding.

use alloc::string::String;

use cubeviz_core::{Component, Components, MeasureField, Observation, ObservationValue, RelatedKind};
use hashbrown::HashMap;

use crate::time;

/// Reads a measure as `f64`; missing and non-numeric values are `NaN`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumericGetter {
    id: String,
}

impl NumericGetter {
    /// Getter for the given component id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Getter for a component, or `None` if the id is unknown.
    pub fn for_component(components: &Components, id: &str) -> Option<Self> {
        components.get(id).map(|c| Self::new(c.id.clone()))
    }

    /// Component id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Value of the observation.
    pub fn get(&self, o: &Observation) -> f64 {
        o.number(&self.id)
    }
}

/// Reads a dimension value as its categorical key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringGetter {
    id: String,
}

impl StringGetter {
    /// Getter for the given component id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Getter for a component, or `None` if the id is unknown.
    pub fn for_component(components: &Components, id: &str) -> Option<Self> {
        components.get(id).map(|c| Self::new(c.id.clone()))
    }

    /// Component id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Key of the observation; `None` for null values.
    pub fn get(&self, o: &Observation) -> Option<String> {
        o.key(&self.id)
    }
}

/// Resolves display labels for dimension values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelGetter {
    labels: HashMap<String, String>,
}

impl LabelGetter {
    /// Labels from the component's value list; abbreviations win when enabled.
    pub fn new(component: &Component, use_abbreviations: bool) -> Self {
        let labels = component
            .values
            .iter()
            .map(|v| {
                let label = match &v.alternate_name {
                    Some(abbr) if use_abbreviations => abbr.clone(),
                    _ => v.label.clone(),
                };
                (v.value.clone(), label)
            })
            .collect();
        Self { labels }
    }

    /// Label for `key`, or the key itself for unlisted values.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map_or(key, String::as_str)
    }

    /// All known labels keyed by value.
    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }
}

/// Reads a temporal dimension as seconds since the epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemporalGetter {
    id: String,
    format: Option<String>,
}

impl TemporalGetter {
    /// Getter using the component's time format.
    pub fn new(component: &Component) -> Self {
        Self {
            id: component.id.clone(),
            format: component.time_format.clone(),
        }
    }

    /// Component id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Timestamp of the observation; unparseable values are `None`.
    pub fn get(&self, o: &Observation) -> Option<f64> {
        match o.get(&self.id) {
            ObservationValue::Date(t) => t.is_finite().then_some(*t),
            ObservationValue::Null => None,
            v => time::parse_temporal(&v.to_key()?, self.format.as_deref()),
        }
    }
}

/// Reads the error range around a measure value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorGetter {
    /// `[v - se, v + se]`.
    Standard {
        /// Standard error component.
        id: String,
        /// Whether the error is expressed in percent of the value.
        percent: bool,
    },
    /// `[v - lower, v + upper]`.
    Interval {
        /// Upper bound component.
        upper: String,
        /// Lower bound component.
        lower: String,
        /// Whether the upper bound is in percent of the value.
        upper_percent: bool,
        /// Whether the lower bound is in percent of the value.
        lower_percent: bool,
    },
}

impl ErrorGetter {
    /// Builds the getter enabled by `field`, if its related components exist.
    ///
    /// Confidence intervals take precedence over standard errors when both are shown.
    pub fn for_measure(components: &Components, measure: &Component, field: &MeasureField) -> Option<Self> {
        let related = |kind| {
            measure
                .related_id(kind)
                .and_then(|id| components.get(id))
        };
        if field.show_confidence_interval
            && let (Some(upper), Some(lower)) = (
                related(RelatedKind::ConfidenceUpperBound),
                related(RelatedKind::ConfidenceLowerBound),
            )
        {
            return Some(Self::Interval {
                upper: upper.id.clone(),
                lower: lower.id.clone(),
                upper_percent: upper.is_percent(),
                lower_percent: lower.is_percent(),
            });
        }
        if field.show_standard_error
            && let Some(se) = related(RelatedKind::StandardError)
        {
            return Some(Self::Standard {
                id: se.id.clone(),
                percent: se.is_percent(),
            });
        }
        None
    }

    /// `(low, high)` around `value`; `None` when either side is missing.
    pub fn get(&self, o: &Observation, value: f64) -> Option<(f64, f64)> {
        let absolute = |raw: f64, percent: bool| {
            if percent { value.abs() * raw / 100.0 } else { raw }
        };
        let (below, above) = match self {
            Self::Standard { id, percent } => {
                let e = absolute(o.number(id), *percent);
                (e, e)
            }
            Self::Interval {
                upper,
                lower,
                upper_percent,
                lower_percent,
            } => (
                absolute(o.number(lower), *lower_percent),
                absolute(o.number(upper), *upper_percent),
            ),
        };
        (value.is_finite() && below.is_finite() && above.is_finite())
            .then_some((value - below, value + above))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use cubeviz_core::{ComponentKind, DimensionValue};

    use super::*;

    fn components() -> Components {
        Components::new(vec![
            Component::new("m", "Measure", ComponentKind::NumericalMeasure)
                .with_related(RelatedKind::StandardError, "se")
                .with_related(RelatedKind::ConfidenceUpperBound, "hi")
                .with_related(RelatedKind::ConfidenceLowerBound, "lo"),
            Component::new("se", "SE", ComponentKind::StandardErrorDimension),
            Component::new("hi", "Upper", ComponentKind::ConfidenceUpperBoundDimension).with_unit("%"),
            Component::new("lo", "Lower", ComponentKind::ConfidenceLowerBoundDimension),
        ])
    }

    #[test]
    fn standard_error_is_symmetric() {
        let comps = components();
        let mut field = MeasureField::new("m");
        field.show_standard_error = true;
        let getter = ErrorGetter::for_measure(&comps, comps.get("m").unwrap(), &field).unwrap();
        let o = Observation::new().with("m", 10.0).with("se", 2.0);
        assert_eq!(getter.get(&o, 10.0), Some((8.0, 12.0)));
    }

    #[test]
    fn percent_bounds_are_relative_to_the_value() {
        let comps = components();
        let mut field = MeasureField::new("m");
        field.show_confidence_interval = true;
        let getter = ErrorGetter::for_measure(&comps, comps.get("m").unwrap(), &field).unwrap();
        let o = Observation::new().with("m", 200.0).with("hi", 10.0).with("lo", 5.0);
        assert_eq!(getter.get(&o, 200.0), Some((195.0, 220.0)));
    }

    #[test]
    fn missing_related_components_leave_the_getter_unbuilt() {
        let comps = Components::new(vec![
            Component::new("m", "Measure", ComponentKind::NumericalMeasure)
                .with_related(RelatedKind::StandardError, "gone"),
        ]);
        let mut field = MeasureField::new("m");
        field.show_standard_error = true;
        assert!(ErrorGetter::for_measure(&comps, comps.get("m").unwrap(), &field).is_none());
        assert!(NumericGetter::for_component(&comps, "nope").is_none());
    }

    #[test]
    fn labels_prefer_abbreviations_when_enabled() {
        let c = Component::new("d", "D", ComponentKind::NominalDimension).with_values(vec![
            DimensionValue::new("https://ld/zh")
                .with_label("Zürich")
                .with_alternate_name("ZH"),
        ]);
        assert_eq!(LabelGetter::new(&c, false).label("https://ld/zh"), "Zürich");
        assert_eq!(LabelGetter::new(&c, true).label("https://ld/zh"), "ZH");
        assert_eq!(LabelGetter::new(&c, true).label("other"), "other");
    }

    #[test]
    fn temporal_values_parse_with_the_component_format() {
        let c = Component::new("t", "Year", ComponentKind::TemporalDimension)
            .with_time(cubeviz_core::TimeUnit::Year, "%Y");
        let getter = TemporalGetter::new(&c);
        let numeric = Observation::new().with("t", 2020.0);
        let text = Observation::new().with("t", "2020");
        assert_eq!(getter.get(&numeric), Some(1_577_836_800.0));
        assert_eq!(getter.get(&text), getter.get(&numeric));
        assert_eq!(getter.get(&Observation::new()), None);
    }
}
