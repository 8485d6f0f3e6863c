//! Generators for predictable observation data.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use crate::fixtures;

/// Fixed instant all generated series start from, 2023-01-01T00:00:00Z.
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_672_531_200, 0).single().unwrap_or_default()
}

/// Format an instant the way clients send it.
pub fn iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Observation bodies for `results`, one per hour from [`epoch`].
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use test_utils::observation_series;
///
/// let series = observation_series("d1", &[json!(3), json!(4)]);
/// assert_eq!(series[1]["phenomenonTime"], "2023-01-01T01:00:00Z");
/// ```
pub fn observation_series(datastream_id: &str, results: &[Value]) -> Vec<Value> {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let time = epoch() + Duration::hours(i as i64);
            fixtures::observation(datastream_id, &iso(time), result.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_series_is_hourly() {
        let series = observation_series("d1", &[json!(1), json!(2), json!(3)]);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0]["phenomenonTime"], "2023-01-01T00:00:00Z");
        assert_eq!(series[2]["phenomenonTime"], "2023-01-01T02:00:00Z");
        assert_eq!(series[2]["Datastream"]["@iot.id"], "d1");
    }
}
