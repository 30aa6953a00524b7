//! Attribute filter algebra.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// An attribute filter over a feature's property map.
///
/// A missing property never equals a value, so `NotEquals` on a missing
/// property matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    /// `property == value`
    Equals {
        /// Property name.
        property: String,
        /// Expected string value.
        value: String,
    },
    /// `property != value`
    NotEquals {
        /// Property name.
        property: String,
        /// Excluded string value.
        value: String,
    },
    /// Conjunction of every child expression. Empty matches everything.
    All(Vec<Self>),
    /// A constant result.
    Literal(bool),
}

impl FilterExpr {
    /// Builds an equality condition.
    #[must_use]
    pub fn equals(property: &str, value: impl Into<String>) -> Self {
        Self::Equals {
            property: property.to_owned(),
            value: value.into(),
        }
    }

    /// Builds an inequality condition.
    #[must_use]
    pub fn not_equals(property: &str, value: impl Into<String>) -> Self {
        Self::NotEquals {
            property: property.to_owned(),
            value: value.into(),
        }
    }

    /// Evaluates the expression against a feature's properties.
    #[must_use]
    pub fn matches(&self, properties: &Map<String, Value>) -> bool {
        match self {
            Self::Equals { property, value } => property_equals(properties, property, value),
            Self::NotEquals { property, value } => !property_equals(properties, property, value),
            Self::All(children) => children.iter().all(|child| child.matches(properties)),
            Self::Literal(result) => *result,
        }
    }

    /// Serializes to `MapLibre`/Mapbox expression syntax, e.g.
    /// `["==", ["get", "MUN"], "NEWARK CITY"]`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Equals { property, value } => {
                serde_json::json!(["==", ["get", property], value])
            }
            Self::NotEquals { property, value } => {
                serde_json::json!(["!=", ["get", property], value])
            }
            Self::All(children) => {
                let mut items = Vec::with_capacity(children.len() + 1);
                items.push(Value::from("all"));
                items.extend(children.iter().map(Self::to_json));
                Value::Array(items)
            }
            Self::Literal(result) => serde_json::json!(["literal", result]),
        }
    }
}

impl Serialize for FilterExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn property_equals(properties: &Map<String, Value>, property: &str, value: &str) -> bool {
    match properties.get(property) {
        Some(Value::String(s)) => s == value,
        Some(Value::Number(n)) => n.to_string() == value,
        _ => false,
    }
}
