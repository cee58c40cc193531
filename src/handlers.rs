use crate::errors::AppError;
use crate::models::{DailySeries, DashboardResponse, DashboardStatus, DerivedStats, PersistedDocument};
use crate::state::AppState;
use crate::stats::{compute_stats, StatsContext};
use crate::storage::DocumentStore;
use crate::ui::render_index;
use axum::{extract::State, response::Html, Json};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::error;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.config))
}

/// Always answers; a document that cannot be read becomes `load_failed`.
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let document = match load_document(&state).await {
        Ok(document) => document,
        Err(err) => {
            return Json(DashboardResponse {
                status: DashboardStatus::LoadFailed,
                message: Some(err.message),
                metadata: None,
                series: DailySeries::new(),
                stats: None,
            })
        }
    };

    let status = dashboard_status(&document, Utc::now(), state.config.stale_after);
    let message = document
        .metadata
        .as_ref()
        .filter(|metadata| metadata.is_degraded())
        .and_then(|metadata| metadata.failure_reason.clone());
    let stats = stats_for(&state, &document.data);

    Json(DashboardResponse {
        status,
        message,
        metadata: document.metadata,
        series: document.data,
        stats: Some(stats),
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<DerivedStats>, AppError> {
    let document = load_document(&state).await?;
    Ok(Json(stats_for(&state, &document.data)))
}

pub async fn get_series(State(state): State<AppState>) -> Result<Json<DailySeries>, AppError> {
    let document = load_document(&state).await?;
    Ok(Json(document.data))
}

async fn load_document(state: &AppState) -> Result<PersistedDocument, AppError> {
    match state.store.load().await {
        Ok(document) => Ok(document.unwrap_or_default()),
        Err(err) => {
            error!("failed to load document: {err}");
            Err(err.into())
        }
    }
}

fn stats_for(state: &AppState, series: &DailySeries) -> DerivedStats {
    let config = &state.config;
    let ctx = StatsContext::now(config.timezone, config.year, config.step_goal);
    compute_stats(series, &ctx)
}

pub fn dashboard_status(
    document: &PersistedDocument,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> DashboardStatus {
    let metadata = document.metadata.as_ref();
    if metadata.is_some_and(|metadata| metadata.is_degraded()) {
        return DashboardStatus::Degraded;
    }
    if document.data.is_empty() {
        return DashboardStatus::Empty;
    }

    let fresh = metadata
        .and_then(|metadata| metadata.last_updated)
        .and_then(|updated| (now - updated.with_timezone(&Utc)).to_std().ok())
        .is_some_and(|age| age <= stale_after);
    if fresh {
        DashboardStatus::Ready
    } else {
        DashboardStatus::Stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyRecord, Metadata};
    use chrono::{NaiveDate, TimeZone};

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap()
    }

    fn document(last_updated: Option<DateTime<Utc>>) -> PersistedDocument {
        let mut data = DailySeries::new();
        data.insert(NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(), DailyRecord::new(9000, 7.0));
        PersistedDocument {
            metadata: Some(Metadata {
                last_updated: last_updated.map(|t| t.fixed_offset()),
                timezone: "UTC".to_string(),
                ..Metadata::default()
            }),
            data,
        }
    }

    #[test]
    fn recent_document_is_ready() {
        let doc = document(Some(now() - chrono::Duration::hours(3)));
        assert_eq!(dashboard_status(&doc, now(), DAY), DashboardStatus::Ready);
    }

    #[test]
    fn old_or_unstamped_document_is_stale() {
        let doc = document(Some(now() - chrono::Duration::days(3)));
        assert_eq!(dashboard_status(&doc, now(), DAY), DashboardStatus::Stale);

        let legacy = PersistedDocument {
            metadata: None,
            ..document(None)
        };
        assert_eq!(dashboard_status(&legacy, now(), DAY), DashboardStatus::Stale);
    }

    #[test]
    fn empty_series_is_distinct_from_stale() {
        let doc = PersistedDocument::default();
        assert_eq!(dashboard_status(&doc, now(), DAY), DashboardStatus::Empty);
    }

    #[test]
    fn failed_sync_is_degraded() {
        let mut doc = document(Some(now() - chrono::Duration::hours(30)));
        if let Some(metadata) = doc.metadata.as_mut() {
            metadata.last_failure = Some((now() - chrono::Duration::hours(1)).fixed_offset());
            metadata.failure_reason = Some("rate limited".to_string());
        }
        assert_eq!(dashboard_status(&doc, now(), DAY), DashboardStatus::Degraded);
    }
}
