use crate::models::{
    DailySeries, DerivedStats, MonthlyTotal, PeakDay, StreakRun, Trend, TrendDirection, WeeklyTotal,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;

pub const DEFAULT_STEP_GOAL: u64 = 10_000;

const TREND_WINDOW: usize = 7;
const TREND_THRESHOLD_PERCENT: f64 = 5.0;

/// The clock and goal a stats run is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsContext {
    pub today: NaiveDate,
    /// Whether `today` has already ended locally. While it is in progress
    /// it neither breaks the streak nor counts towards adherence.
    pub today_complete: bool,
    pub year: i32,
    pub goal: u64,
}

impl StatsContext {
    pub fn at(today: NaiveDate, year: i32, goal: u64) -> Self {
        Self {
            today,
            today_complete: false,
            year,
            goal,
        }
    }

    pub fn now(tz: Tz, year: i32, goal: u64) -> Self {
        Self::at(Utc::now().with_timezone(&tz).date_naive(), year, goal)
    }

    /// Last day whose outcome is final.
    fn last_closed_day(&self) -> NaiveDate {
        if self.today_complete {
            self.today
        } else {
            self.today - Duration::days(1)
        }
    }
}

pub fn compute_stats(series: &DailySeries, ctx: &StatsContext) -> DerivedStats {
    let total_steps = sum_steps(series.values().map(|record| record.step_count));
    let total_km: f64 = series.values().map(|record| record.distance_km).sum();
    let days_recorded = series.len();
    let (daily_average_steps, daily_average_km) = if days_recorded == 0 {
        (0.0, 0.0)
    } else {
        (
            total_steps as f64 / days_recorded as f64,
            total_km / days_recorded as f64,
        )
    };

    let adherence = adherence(series, ctx);

    DerivedStats {
        goal: ctx.goal,
        total_steps,
        total_km,
        days_recorded,
        daily_average_steps,
        daily_average_km,
        max_day: max_day(series),
        monthly_totals: monthly_totals(series),
        current_streak: current_streak(series, ctx),
        longest_streak: longest_streak(series, ctx.goal),
        days_with_goal: adherence.days_with_goal,
        elapsed_days: adherence.elapsed_days,
        consistency: adherence.consistency(),
        trend: trend(series, ctx.today),
        projected_year_total: adherence.projected_total(ctx.year),
        week: weekly_total(series, ctx.today),
    }
}

/// Largest step count; ties keep the earliest date.
fn max_day(series: &DailySeries) -> Option<PeakDay> {
    let mut best: Option<PeakDay> = None;
    for (&date, record) in series {
        if best.as_ref().is_none_or(|peak| record.step_count > peak.steps) {
            best = Some(PeakDay {
                date,
                steps: record.step_count,
            });
        }
    }
    best
}

fn monthly_totals(series: &DailySeries) -> BTreeMap<String, MonthlyTotal> {
    let mut months: BTreeMap<String, MonthlyTotal> = BTreeMap::new();
    for (&date, record) in series {
        months
            .entry(month_key(date))
            .and_modify(|month| {
                month.steps = month.steps.saturating_add(record.step_count);
                month.km += record.distance_km;
                month.days += 1;
                if record.step_count > month.max_steps {
                    month.max_steps = record.step_count;
                    month.max_day = date;
                }
            })
            .or_insert(MonthlyTotal {
                steps: record.step_count,
                km: record.distance_km,
                days: 1,
                max_day: date,
                max_steps: record.step_count,
            });
    }
    months
}

/// Trailing run of consecutive goal days, walked back from today.
fn current_streak(series: &DailySeries, ctx: &StatsContext) -> StreakRun {
    let mut run = StreakRun::default();
    let mut expected = ctx.today;
    // A day still in progress cannot break the run yet.
    let today_open = !ctx.today_complete
        && series
            .get(&ctx.today)
            .is_none_or(|record| record.step_count < ctx.goal);
    if today_open {
        expected = ctx.today - Duration::days(1);
    }

    for (&date, record) in series.range(..=expected).rev() {
        if date != expected || record.step_count < ctx.goal {
            break;
        }
        run.length += 1;
        run.start = Some(date);
        run.end.get_or_insert(date);
        expected = date - Duration::days(1);
    }

    run
}

fn longest_streak(series: &DailySeries, goal: u64) -> StreakRun {
    let mut best = StreakRun::default();
    let mut current = StreakRun::default();

    for (&date, record) in series {
        if record.step_count < goal {
            current = StreakRun::default();
            continue;
        }
        let extends = current
            .end
            .is_some_and(|end| end + Duration::days(1) == date);
        if !extends {
            current = StreakRun {
                length: 0,
                start: Some(date),
                end: None,
            };
        }
        current.length += 1;
        current.end = Some(date);
        if current.length > best.length {
            best = current.clone();
        }
    }

    best
}

struct Adherence {
    days_with_goal: u32,
    elapsed_days: u32,
    steps_in_window: u64,
}

impl Adherence {
    fn consistency(&self) -> f64 {
        if self.elapsed_days == 0 {
            0.0
        } else {
            f64::from(self.days_with_goal) / f64::from(self.elapsed_days)
        }
    }

    fn projected_total(&self, year: i32) -> u64 {
        if self.elapsed_days == 0 {
            return 0;
        }
        let per_day = self.steps_in_window as f64 / f64::from(self.elapsed_days);
        (per_day * f64::from(days_in_year(year))).round() as u64
    }
}

/// Goal days over closed days of the configured year.
fn adherence(series: &DailySeries, ctx: &StatsContext) -> Adherence {
    let last_closed = ctx.last_closed_day();
    let elapsed_days = match last_closed.year().cmp(&ctx.year) {
        std::cmp::Ordering::Less => 0,
        std::cmp::Ordering::Equal => last_closed.ordinal(),
        std::cmp::Ordering::Greater => days_in_year(ctx.year),
    };

    let mut result = Adherence {
        days_with_goal: 0,
        elapsed_days,
        steps_in_window: 0,
    };
    let (Some(year_start), Some(year_end)) = (
        NaiveDate::from_ymd_opt(ctx.year, 1, 1),
        NaiveDate::from_ymd_opt(ctx.year, 12, 31),
    ) else {
        return result;
    };
    if elapsed_days == 0 {
        return result;
    }

    for record in series.range(year_start..=last_closed.min(year_end)).map(|(_, r)| r) {
        result.steps_in_window = result.steps_in_window.saturating_add(record.step_count);
        if record.step_count >= ctx.goal {
            result.days_with_goal += 1;
        }
    }
    result
}

/// Mean of the latest seven recorded days against the seven before them.
fn trend(series: &DailySeries, today: NaiveDate) -> Trend {
    let steps: Vec<u64> = series
        .range(..=today)
        .rev()
        .take(TREND_WINDOW * 2)
        .map(|(_, record)| record.step_count)
        .collect();
    if steps.len() < TREND_WINDOW * 2 {
        return Trend::default();
    }

    let mean = |window: &[u64]| sum_steps(window.iter().copied()) as f64 / window.len() as f64;
    let recent_average = mean(&steps[..TREND_WINDOW]);
    let previous_average = mean(&steps[TREND_WINDOW..]);

    let change_percent = if previous_average > 0.0 {
        (recent_average - previous_average) / previous_average * 100.0
    } else if recent_average > 0.0 {
        100.0
    } else {
        0.0
    };

    let direction = if change_percent > TREND_THRESHOLD_PERCENT {
        TrendDirection::Improving
    } else if change_percent < -TREND_THRESHOLD_PERCENT {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    Trend {
        direction,
        change_percent,
        recent_average,
        previous_average,
    }
}

/// Monday to Sunday week containing `today`.
pub fn weekly_total(series: &DailySeries, today: NaiveDate) -> WeeklyTotal {
    let start = week_start(today);
    let end = start + Duration::days(6);
    let total_steps = sum_steps(series.range(start..=end).map(|(_, record)| record.step_count));

    WeeklyTotal {
        week_start: start,
        week_end: end,
        total_steps,
    }
}

fn sum_steps(steps: impl Iterator<Item = u64>) -> u64 {
    steps.fold(0u64, |acc, value| acc.saturating_add(value))
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn days_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|date| date.ordinal())
        .unwrap_or(365)
}
