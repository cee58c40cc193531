//! Client for the fitness API's daily step summaries.

use crate::errors::{Result, StepsError};
use crate::models::{parse_date_key, DailyRecord, FetchedDay};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const API_USER_AGENT: &str = concat!("step_dashboard/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can return per-day step records for an inclusive range.
pub trait StepSource {
    fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<FetchedDay>>> + Send;
}

/// One element of `/usersummary-service/stats/steps/daily/{start}/{end}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyStepSummary {
    calendar_date: String,
    #[serde(default)]
    total_steps: Value,
    /// Metres.
    #[serde(default)]
    total_distance: Value,
}

pub struct HttpStepSource {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpStepSource {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| StepsError::config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn build_url(&self, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/usersummary-service/stats/steps/daily/{}/{}",
            self.base_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(API_USER_AGENT));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| StepsError::config("API token contains invalid header characters"))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

impl StepSource for HttpStepSource {
    async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<FetchedDay>> {
        let url = self.build_url(start, end);
        debug!(%start, %end, "fetching daily steps");

        let response = self
            .client
            .get(&url)
            .headers(self.build_headers()?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    StepsError::upstream(format!("not authorized ({status})"))
                }
                StatusCode::TOO_MANY_REQUESTS => StepsError::upstream("rate limited"),
                _ => StepsError::upstream(format!("API error {status}: {body}")),
            });
        }

        let summaries: Vec<DailyStepSummary> = response.json().await?;

        let mut days = Vec::with_capacity(summaries.len());
        for summary in summaries {
            if let Some(day) = to_fetched_day(summary)? {
                days.push(day);
            }
        }
        Ok(days)
    }
}

/// `None` for days the API has no step total for yet.
fn to_fetched_day(summary: DailyStepSummary) -> Result<Option<FetchedDay>> {
    let date = parse_date_key(&summary.calendar_date)?;
    let step_count = match &summary.total_steps {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_u64().ok_or_else(|| {
            StepsError::malformed(&summary.calendar_date, format!("totalSteps must be a non-negative integer, got {n}"))
        })?,
        other => {
            return Err(StepsError::malformed(
                &summary.calendar_date,
                format!("totalSteps must be a number, got {other}"),
            ))
        }
    };
    let distance_km = match &summary.total_distance {
        Value::Null => 0.0,
        other => other
            .as_f64()
            .filter(|metres| metres.is_finite() && *metres >= 0.0)
            .map(metres_to_km)
            .ok_or_else(|| {
                StepsError::malformed(
                    &summary.calendar_date,
                    format!("totalDistance must be a non-negative number, got {other}"),
                )
            })?,
    };

    Ok(Some(FetchedDay {
        date,
        record: DailyRecord::new(step_count, distance_km),
    }))
}

fn metres_to_km(metres: f64) -> f64 {
    (metres / 10.0).round() / 100.0
}
