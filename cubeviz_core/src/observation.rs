// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Long-format observation records.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use serde::{Deserialize, Serialize};

/// A single cell of an observation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationValue {
    /// No value (`null` in JSON).
    #[default]
    Null,
    /// A numeric value.
    Number(f64),
    /// A string value (dimension values, ISO dates, IRIs).
    Text(String),
    /// A point in time, in seconds since the Unix epoch.
    ///
    /// Never produced by deserialization; upstream loaders may construct it directly.
    #[serde(skip_deserializing)]
    Date(f64),
}

impl ObservationValue {
    /// Returns the value as a number.
    ///
    /// Text is parsed if it looks numeric. Everything else is `NaN`.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(v) | Self::Date(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            Self::Null => f64::NAN,
        }
    }

    /// Returns the string form used as a categorical key.
    ///
    /// Integral numbers print without a fractional part so `2020.0` and `"2020"` agree.
    pub fn to_key(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(v) | Self::Date(v) => Some(number_key(*v)),
        }
    }

    /// Returns `true` for [`ObservationValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

fn number_key(v: f64) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "the truncated value is only used when it round-trips exactly"
    )]
    let int = v as i64;
    if v.is_finite() && int as f64 == v {
        int.to_string()
    } else {
        v.to_string()
    }
}

impl From<f64> for ObservationValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ObservationValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for ObservationValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for ObservationValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

static NULL: ObservationValue = ObservationValue::Null;

/// A record keyed by component id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation {
    values: BTreeMap<String, ObservationValue>,
}

impl Observation {
    /// Creates an empty observation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, value: impl Into<ObservationValue>) -> Self {
        self.insert(id, value);
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<ObservationValue>) {
        self.values.insert(id.into(), value.into());
    }

    /// Returns the value for `id`; a missing key reads as `Null`.
    pub fn get(&self, id: &str) -> &ObservationValue {
        self.values.get(id).unwrap_or(&NULL)
    }

    /// Numeric read; missing or non-numeric values are `NaN`.
    pub fn number(&self, id: &str) -> f64 {
        self.get(id).as_f64()
    }

    /// Categorical key read.
    pub fn key(&self, id: &str) -> Option<String> {
        self.get(id).to_key()
    }

    /// Iterates `(component id, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObservationValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn missing_and_null_read_as_nan() {
        let o = Observation::new().with("a", ObservationValue::Null);
        assert!(o.number("a").is_nan());
        assert!(o.number("b").is_nan());
        assert_eq!(o.key("b"), None);
    }

    #[test]
    fn integral_numbers_key_like_their_text() {
        let o = Observation::new().with("year", 2020.0).with("label", "2020");
        assert_eq!(o.key("year"), o.key("label"));
        assert_eq!(Observation::new().with("v", 1.5).key("v").as_deref(), Some("1.5"));
    }

    #[test]
    fn deserializes_untagged_json() {
        let o: Observation =
            serde_json::from_str(r#"{"cat":"A","year":2020,"val":null}"#).unwrap();
        assert_eq!(o.get("cat"), &ObservationValue::Text("A".into()));
        assert_eq!(o.number("year"), 2020.0);
        assert!(o.get("val").is_null());
    }
}
