//! Observation types and their typed result values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sta_filter::Scalar;
use std::fmt;

const OM_PREFIX: &str = "http://www.opengis.net/def/observationType/OGC-OM/2.0/";

/// Observation type of a Datastream, one per supported result representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    Measurement,
    CategoryObservation,
    CountObservation,
    TruthObservation,
    TextObservation,
    /// Generic `OM_Observation`; results are kept as text.
    Observation,
}

impl ObservationType {
    /// Resolve an observation-type URI. Unknown URIs return `None`.
    pub fn from_uri(uri: &str) -> Option<ObservationType> {
        let local = uri.trim().strip_prefix(OM_PREFIX)?;
        Some(match local {
            "OM_Measurement" => ObservationType::Measurement,
            "OM_CategoryObservation" => ObservationType::CategoryObservation,
            "OM_CountObservation" => ObservationType::CountObservation,
            "OM_TruthObservation" => ObservationType::TruthObservation,
            "OM_TextObservation" => ObservationType::TextObservation,
            "OM_Observation" => ObservationType::Observation,
            _ => return None,
        })
    }

    pub fn uri(&self) -> String {
        let local = match self {
            ObservationType::Measurement => "OM_Measurement",
            ObservationType::CategoryObservation => "OM_CategoryObservation",
            ObservationType::CountObservation => "OM_CountObservation",
            ObservationType::TruthObservation => "OM_TruthObservation",
            ObservationType::TextObservation => "OM_TextObservation",
            ObservationType::Observation => "OM_Observation",
        };
        format!("{}{}", OM_PREFIX, local)
    }
}

/// A typed observation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ObservationValue {
    /// Decimal measurement; `None` marks a reserved non-numeric token
    /// (`NaN`, `Inf`, `-Inf`).
    Quantity(Option<f64>),
    Category(String),
    Count(i64),
    Text(String),
    Boolean(bool),
}

impl ObservationValue {
    /// The value as a filter scalar.
    pub fn to_scalar(&self) -> Scalar {
        match self {
            ObservationValue::Quantity(Some(v)) => Scalar::Float(*v),
            ObservationValue::Quantity(None) => Scalar::Null,
            ObservationValue::Category(s) | ObservationValue::Text(s) => Scalar::String(s.clone()),
            ObservationValue::Count(n) => Scalar::Int(*n),
            ObservationValue::Boolean(b) => Scalar::Bool(*b),
        }
    }

    /// Client-facing JSON representation of the result.
    pub fn to_json(&self) -> Value {
        match self {
            ObservationValue::Quantity(Some(v)) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ObservationValue::Quantity(None) => Value::String("NaN".to_string()),
            ObservationValue::Category(s) | ObservationValue::Text(s) => Value::String(s.clone()),
            ObservationValue::Count(n) => Value::from(*n),
            ObservationValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for ObservationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationValue::Quantity(Some(v)) => write!(f, "{}", v),
            ObservationValue::Quantity(None) => f.write_str("NaN"),
            ObservationValue::Category(s) | ObservationValue::Text(s) => f.write_str(s),
            ObservationValue::Count(n) => write!(f, "{}", n),
            ObservationValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_round_trip_for_known_types() {
        let uri = "http://www.opengis.net/def/observationType/OGC-OM/2.0/OM_Measurement";
        assert_eq!(ObservationType::from_uri(uri), Some(ObservationType::Measurement));
        assert_eq!(ObservationType::Measurement.uri(), uri);
    }

    #[test]
    fn test_unknown_uri() {
        assert_eq!(
            ObservationType::from_uri(
                "http://www.opengis.net/def/observationType/OGC-OM/2.0/OM_Mystery"
            ),
            None
        );
        assert_eq!(ObservationType::from_uri("OM_Measurement"), None);
    }

    #[test]
    fn test_value_scalars() {
        assert_eq!(ObservationValue::Quantity(Some(6.0)).to_scalar(), Scalar::Float(6.0));
        assert_eq!(ObservationValue::Quantity(None).to_scalar(), Scalar::Null);
        assert_eq!(ObservationValue::Count(3).to_json(), serde_json::json!(3));
    }
}
