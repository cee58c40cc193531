use crate::models::{DailySeries, FetchedDay};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct MergeCounts {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl MergeCounts {
    pub fn changed(&self) -> usize {
        self.new + self.updated
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub series: DailySeries,
    pub counts: MergeCounts,
}

/// Overlays fetched days on the stored series. Days are never removed.
pub fn merge_days(existing: &DailySeries, fetched: &[FetchedDay]) -> MergeOutcome {
    let mut series = existing.clone();
    let mut counts = MergeCounts::default();

    for day in fetched {
        match series.insert(day.date, day.record) {
            None => {
                counts.new += 1;
                info!(date = %day.date, steps = day.record.step_count, km = day.record.distance_km, "new day");
            }
            Some(previous) if previous != day.record => {
                counts.updated += 1;
                info!(
                    date = %day.date,
                    step_change = day.record.step_count as i64 - previous.step_count as i64,
                    km_change = day.record.distance_km - previous.distance_km,
                    "updated day"
                );
            }
            Some(_) => {
                counts.unchanged += 1;
                debug!(date = %day.date, "unchanged day");
            }
        }
    }

    MergeOutcome { series, counts }
}

/// Days missing from `existing` between `start` and `today`, plus today and
/// yesterday so late upstream corrections are picked up.
pub fn dates_to_fetch(existing: &DailySeries, start: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = start
        .iter_days()
        .take_while(|date| *date <= today)
        .filter(|date| !existing.contains_key(date))
        .collect();

    dates.push(today - Duration::days(1));
    dates.push(today);
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Collapses sorted dates into inclusive `(start, end)` ranges of
/// consecutive days.
pub fn contiguous_ranges(dates: &[NaiveDate]) -> Vec<(NaiveDate, NaiveDate)> {
    let mut ranges: Vec<(NaiveDate, NaiveDate)> = Vec::new();
    for &date in dates {
        match ranges.last_mut() {
            Some((_, end)) if *end + Duration::days(1) == date => *end = date,
            _ => ranges.push((date, date)),
        }
    }
    ranges
}
