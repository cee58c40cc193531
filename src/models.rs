use crate::errors::{Result, StepsError};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One day of activity as persisted: `{"steps": int, "km": number}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DailyRecord {
    #[serde(rename = "steps")]
    pub step_count: u64,
    #[serde(rename = "km", default)]
    pub distance_km: f64,
}

impl DailyRecord {
    pub fn new(step_count: u64, distance_km: f64) -> Self {
        Self {
            step_count,
            distance_km,
        }
    }

    /// Reads a stored value, accepting the legacy bare step count.
    pub fn from_json(date: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(|steps| Self::new(steps, 0.0)).ok_or_else(|| {
                StepsError::malformed(date, format!("step count must be a non-negative integer, got {n}"))
            }),
            Value::Object(fields) => {
                let steps = match fields.get("steps") {
                    Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
                        StepsError::malformed(date, format!("steps must be a non-negative integer, got {n}"))
                    })?,
                    Some(other) => {
                        return Err(StepsError::malformed(
                            date,
                            format!("steps must be a number, got {}", value_kind(other)),
                        ))
                    }
                    None => return Err(StepsError::malformed(date, "missing steps")),
                };
                let km = match fields.get("km") {
                    None | Some(Value::Null) => 0.0,
                    Some(other) => other
                        .as_f64()
                        .filter(|km| km.is_finite() && *km >= 0.0)
                        .ok_or_else(|| {
                            StepsError::malformed(date, format!("km must be a non-negative number, got {other}"))
                        })?,
                };
                Ok(Self::new(steps, km))
            }
            other => Err(StepsError::malformed(
                date,
                format!("expected integer or object, got {}", value_kind(other)),
            )),
        }
    }
}

/// Sparse date-keyed series; a missing date means "no data".
pub type DailySeries = BTreeMap<NaiveDate, DailyRecord>;

/// A day as returned by the fitness API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchedDay {
    pub date: NaiveDate,
    pub record: DailyRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Metadata {
    /// The most recent sync attempt failed after the last successful one.
    pub fn is_degraded(&self) -> bool {
        match (self.last_failure, self.last_updated) {
            (Some(failure), Some(updated)) => failure > updated,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

/// The JSON document kept in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PersistedDocument {
    pub metadata: Option<Metadata>,
    pub data: DailySeries,
}

impl PersistedDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| StepsError::persistence(format!("document is not valid JSON: {err}")))?;
        Self::from_value(value)
    }

    /// Accepts both the wrapped `{metadata, data}` form and a bare legacy
    /// series.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = match value {
            Value::Object(root) => root,
            other => {
                return Err(StepsError::persistence(format!(
                    "document root must be an object, got {}",
                    value_kind(&other)
                )))
            }
        };

        if root.contains_key("data") && root.contains_key("metadata") {
            let metadata = match root.remove("metadata") {
                Some(Value::Null) | None => None,
                Some(raw) => Some(
                    serde_json::from_value::<Metadata>(raw)
                        .map_err(|err| StepsError::persistence(format!("invalid metadata: {err}")))?,
                ),
            };
            let data = match root.remove("data") {
                Some(Value::Object(days)) => parse_series(&days)?,
                Some(other) => {
                    return Err(StepsError::persistence(format!(
                        "data must be an object, got {}",
                        value_kind(&other)
                    )))
                }
                None => DailySeries::new(),
            };
            return Ok(Self { metadata, data });
        }

        Ok(Self {
            metadata: None,
            data: parse_series(&root)?,
        })
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

fn parse_series(days: &serde_json::Map<String, Value>) -> Result<DailySeries> {
    days.iter()
        .map(|(key, value)| {
            let date = parse_date_key(key)?;
            Ok((date, DailyRecord::from_json(key, value)?))
        })
        .collect()
}

pub fn parse_date_key(key: &str) -> Result<NaiveDate> {
    if key.len() != 10 {
        return Err(StepsError::malformed(key, "date key must be YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_err(|err| StepsError::malformed(key, format!("invalid date key: {err}")))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakDay {
    pub date: NaiveDate,
    pub steps: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub steps: u64,
    pub km: f64,
    pub days: u32,
    pub max_day: NaiveDate,
    pub max_steps: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StreakRun {
    pub length: u32,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    #[default]
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Trend {
    pub direction: TrendDirection,
    pub change_percent: f64,
    pub recent_average: f64,
    pub previous_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTotal {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_steps: u64,
}

/// Everything the dashboard page binds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub goal: u64,
    pub total_steps: u64,
    pub total_km: f64,
    pub days_recorded: usize,
    pub daily_average_steps: f64,
    pub daily_average_km: f64,
    pub max_day: Option<PeakDay>,
    pub monthly_totals: BTreeMap<String, MonthlyTotal>,
    pub current_streak: StreakRun,
    pub longest_streak: StreakRun,
    pub days_with_goal: u32,
    pub elapsed_days: u32,
    pub consistency: f64,
    pub trend: Trend,
    pub projected_year_total: u64,
    pub week: WeeklyTotal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardStatus {
    Ready,
    Empty,
    Stale,
    Degraded,
    LoadFailed,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub status: DashboardStatus,
    pub message: Option<String>,
    pub metadata: Option<Metadata>,
    pub series: DailySeries,
    pub stats: Option<DerivedStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_integer_normalizes_to_zero_km() {
        let record = DailyRecord::from_json("2026-01-01", &json!(8000)).unwrap();
        assert_eq!(record, DailyRecord::new(8000, 0.0));
    }

    #[test]
    fn object_record_reads_steps_and_km() {
        let record =
            DailyRecord::from_json("2026-01-01", &json!({ "steps": 10000, "km": 8.5 })).unwrap();
        assert_eq!(record, DailyRecord::new(10000, 8.5));
    }

    #[test]
    fn malformed_values_are_rejected() {
        for bad in [
            json!("10000"),
            json!(null),
            json!([1, 2]),
            json!(-5),
            json!(12.5),
            json!({ "km": 3.0 }),
            json!({ "steps": "many" }),
            json!({ "steps": 100, "km": -1.0 }),
        ] {
            let err = DailyRecord::from_json("2026-01-01", &bad).unwrap_err();
            assert!(
                matches!(err, StepsError::MalformedRecord { .. }),
                "{bad} should be malformed"
            );
        }
    }

    #[test]
    fn wrapped_document_keeps_metadata() {
        let doc = PersistedDocument::from_value(json!({
            "metadata": {
                "lastUpdated": "2026-01-05T10:30:00+11:00",
                "timezone": "Australia/Sydney"
            },
            "data": {
                "2026-01-01": { "steps": 10000, "km": 8.5 },
                "2026-01-02": { "steps": 12000, "km": 10.2 }
            }
        }))
        .unwrap();

        let metadata = doc.metadata.expect("metadata");
        assert_eq!(metadata.timezone, "Australia/Sydney");
        assert!(!metadata.is_degraded());
        assert_eq!(doc.data.len(), 2);
        let first = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(doc.data[&first], DailyRecord::new(10000, 8.5));
    }

    #[test]
    fn bare_legacy_document_has_no_metadata() {
        let doc = PersistedDocument::from_value(json!({
            "2026-01-01": 10000,
            "2026-01-02": 12000
        }))
        .unwrap();

        assert!(doc.metadata.is_none());
        let second = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(doc.data[&second], DailyRecord::new(12000, 0.0));
    }

    #[test]
    fn bad_date_key_is_malformed() {
        let err = PersistedDocument::from_value(json!({ "yesterday": 100 })).unwrap_err();
        assert!(matches!(err, StepsError::MalformedRecord { ref date, .. } if date == "yesterday"));
    }

    #[test]
    fn written_document_reads_back() {
        let mut data = DailySeries::new();
        data.insert(
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            DailyRecord::new(4321, 3.1),
        );
        let doc = PersistedDocument {
            metadata: Some(Metadata {
                last_updated: DateTime::parse_from_rfc3339("2026-02-01T20:00:00+11:00").ok(),
                timezone: "Australia/Sydney".to_string(),
                ..Metadata::default()
            }),
            data,
        };

        let bytes = doc.to_json_pretty().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"lastUpdated\""));
        assert!(text.contains("\"2026-02-01\""));
        assert_eq!(PersistedDocument::from_slice(&bytes).unwrap(), doc);
    }

    #[test]
    fn failure_after_success_is_degraded() {
        let metadata = Metadata {
            last_updated: DateTime::parse_from_rfc3339("2026-01-05T06:00:00+11:00").ok(),
            last_failure: DateTime::parse_from_rfc3339("2026-01-06T06:00:00+11:00").ok(),
            failure_reason: Some("timeout".to_string()),
            ..Metadata::default()
        };
        assert!(metadata.is_degraded());
    }
}
