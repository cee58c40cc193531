use crate::errors::{Result, StepsError};
use crate::stats::DEFAULT_STEP_GOAL;
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

const DEFAULT_DATA_PATH: &str = "data/steps_data.json";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEZONE: Tz = chrono_tz::Australia::Sydney;
const DEFAULT_STALE_AFTER_HOURS: u64 = 48;
const DEFAULT_API_URL: &str = "https://connectapi.garmin.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub port: u16,
    pub timezone: Tz,
    pub series_start: NaiveDate,
    /// Year the adherence and projection figures refer to.
    pub year: i32,
    pub step_goal: u64,
    pub stale_after: Duration,
    pub api_url: String,
    pub api_token: Option<String>,
    pub sync_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timezone = match get("TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| StepsError::config(format!("TIMEZONE is not an IANA zone: {name}")))?,
            None => DEFAULT_TIMEZONE,
        };

        let series_start = match get("SERIES_START_DATE") {
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|err| {
                StepsError::config(format!("SERIES_START_DATE must be YYYY-MM-DD: {err}"))
            })?,
            None => {
                let year = Utc::now().with_timezone(&timezone).year();
                NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| StepsError::config(format!("year {year} out of range")))?
            }
        };

        let sync_interval = parse_var::<u64>(&get, "SYNC_INTERVAL_MINUTES")?
            .filter(|minutes| *minutes > 0)
            .map(|minutes| Duration::from_secs(minutes * 60));
        let stale_hours =
            parse_var::<u64>(&get, "STALE_AFTER_HOURS")?.unwrap_or(DEFAULT_STALE_AFTER_HOURS);

        Ok(Self {
            data_path: get("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            port: parse_var(&get, "PORT")?.unwrap_or(DEFAULT_PORT),
            timezone,
            series_start,
            year: parse_var(&get, "DASHBOARD_YEAR")?.unwrap_or(series_start.year()),
            step_goal: parse_var(&get, "STEP_GOAL")?.unwrap_or(DEFAULT_STEP_GOAL),
            stale_after: Duration::from_secs(stale_hours * 3600),
            api_url: get("STEPS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_token: get("STEPS_API_TOKEN"),
            sync_interval,
        })
    }

    pub fn require_api_token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .ok_or_else(|| StepsError::config("STEPS_API_TOKEN is required for sync"))
    }
}

fn parse_var<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|err| StepsError::config(format!("{key}={raw}: {err}")))
        })
        .transpose()
}
