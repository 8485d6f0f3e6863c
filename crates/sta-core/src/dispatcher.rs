//! Observation result parsing.
//!
//! A Datastream's observation type selects one [`ObservationValue`] variant;
//! the raw JSON result must parse into that variant or the Observation is
//! rejected.

use serde_json::Value;
use sta_common::{StaError, StaResult};
use sta_model::{ObservationType, ObservationValue};

/// Tokens stored as a quantity without a numeric value.
const NON_NUMERIC_TOKENS: [&str; 3] = ["NaN", "Inf", "-Inf"];

/// Resolve a client-supplied observation type URI.
pub fn observation_type(uri: &str) -> StaResult<ObservationType> {
    ObservationType::from_uri(uri)
        .ok_or_else(|| StaError::invalid(format!("unknown observationType '{}'", uri)))
}

/// Parse a raw result for the given observation type.
pub fn parse_result(ty: ObservationType, raw: &Value) -> StaResult<ObservationValue> {
    match ty {
        ObservationType::Measurement => quantity(raw),
        ObservationType::CategoryObservation => text(raw).map(ObservationValue::Category),
        ObservationType::TextObservation | ObservationType::Observation => {
            text(raw).map(ObservationValue::Text)
        }
        ObservationType::CountObservation => count(raw),
        ObservationType::TruthObservation => truth(raw),
    }
}

fn quantity(raw: &Value) -> StaResult<ObservationValue> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .map(|f| ObservationValue::Quantity(Some(f)))
            .ok_or_else(|| rejected("Measurement", raw)),
        Value::String(s) => {
            let s = s.trim();
            if NON_NUMERIC_TOKENS.contains(&s) {
                return Ok(ObservationValue::Quantity(None));
            }
            let f: f64 = s.parse().map_err(|_| rejected("Measurement", raw))?;
            if f.is_finite() {
                Ok(ObservationValue::Quantity(Some(f)))
            } else {
                Err(rejected("Measurement", raw))
            }
        }
        _ => Err(rejected("Measurement", raw)),
    }
}

fn text(raw: &Value) -> StaResult<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Err(rejected("text", raw)),
        other => Ok(other.to_string()),
    }
}

fn count(raw: &Value) -> StaResult<ObservationValue> {
    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(ObservationValue::Count)
        .ok_or_else(|| rejected("CountObservation", raw))
}

fn truth(raw: &Value) -> StaResult<ObservationValue> {
    let parsed = match raw {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(ObservationValue::Boolean)
        .ok_or_else(|| rejected("TruthObservation", raw))
}

fn rejected(ty: &str, raw: &Value) -> StaError {
    StaError::invalid(format!("result {} is not a valid {} value", raw, ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sta_common::ErrorKind;

    #[test]
    fn test_quantity() {
        assert_eq!(
            parse_result(ObservationType::Measurement, &json!(3.5)).unwrap(),
            ObservationValue::Quantity(Some(3.5))
        );
        assert_eq!(
            parse_result(ObservationType::Measurement, &json!("21.25")).unwrap(),
            ObservationValue::Quantity(Some(21.25))
        );
        for token in ["NaN", "Inf", "-Inf"] {
            assert_eq!(
                parse_result(ObservationType::Measurement, &json!(token)).unwrap(),
                ObservationValue::Quantity(None)
            );
        }
        let err = parse_result(ObservationType::Measurement, &json!("warm")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(parse_result(ObservationType::Measurement, &json!(true)).is_err());
    }

    #[test]
    fn test_count_rejects_fractions() {
        assert_eq!(
            parse_result(ObservationType::CountObservation, &json!(12)).unwrap(),
            ObservationValue::Count(12)
        );
        assert_eq!(
            parse_result(ObservationType::CountObservation, &json!("7")).unwrap(),
            ObservationValue::Count(7)
        );
        assert!(parse_result(ObservationType::CountObservation, &json!(1.5)).is_err());
        assert!(parse_result(ObservationType::CountObservation, &json!("1.5")).is_err());
    }

    #[test]
    fn test_truth_and_text() {
        assert_eq!(
            parse_result(ObservationType::TruthObservation, &json!("TRUE")).unwrap(),
            ObservationValue::Boolean(true)
        );
        assert!(parse_result(ObservationType::TruthObservation, &json!(1)).is_err());
        assert_eq!(
            parse_result(ObservationType::CategoryObservation, &json!("sunny")).unwrap(),
            ObservationValue::Category("sunny".to_string())
        );
        assert_eq!(
            parse_result(ObservationType::TextObservation, &json!(42)).unwrap(),
            ObservationValue::Text("42".to_string())
        );
    }

    #[test]
    fn test_unknown_type_uri() {
        assert!(observation_type("http://example.org/OM_Weird").is_err());
        assert_eq!(
            observation_type(&ObservationType::CountObservation.uri()).unwrap(),
            ObservationType::CountObservation
        );
    }
}
