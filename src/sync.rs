use crate::errors::Result;
use crate::merge::{contiguous_ranges, dates_to_fetch, merge_days, MergeCounts};
use crate::models::{Metadata, PersistedDocument};
use crate::source::StepSource;
use crate::storage::DocumentStore;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Synced(MergeCounts),
    /// Upstream was unreachable; stored days were kept as they were.
    Degraded { reason: String },
}

#[derive(Debug, Clone)]
pub struct SyncJob<S, D> {
    pub source: S,
    pub store: D,
    pub timezone: Tz,
    pub series_start: NaiveDate,
}

impl<S: StepSource, D: DocumentStore> SyncJob<S, D> {
    /// One fetch-merge-persist cycle as of `now`.
    pub async fn run(&self, now: DateTime<Tz>) -> Result<SyncOutcome> {
        let existing = self.store.load().await?.unwrap_or_default();
        let today = now.date_naive();

        let dates = dates_to_fetch(&existing.data, self.series_start, today);
        let ranges = contiguous_ranges(&dates);
        info!(
            stored_days = existing.data.len(),
            dates = dates.len(),
            ranges = ranges.len(),
            "starting sync"
        );

        let mut fetched = Vec::new();
        for (start, end) in ranges {
            match self.source.fetch_range(start, end).await {
                Ok(days) => fetched.extend(days),
                Err(err) if err.is_upstream() => {
                    let reason = err.to_string();
                    error!(%start, %end, "upstream fetch failed: {reason}");
                    self.record_failure(existing, now, &reason).await?;
                    return Ok(SyncOutcome::Degraded { reason });
                }
                Err(err) => return Err(err),
            }
        }

        let outcome = merge_days(&existing.data, &fetched);
        let document = PersistedDocument {
            metadata: Some(Metadata {
                last_updated: Some(now.fixed_offset()),
                timezone: self.timezone.name().to_string(),
                last_failure: None,
                failure_reason: None,
            }),
            data: outcome.series,
        };
        self.store.save(&document).await?;

        info!(
            new = outcome.counts.new,
            updated = outcome.counts.updated,
            unchanged = outcome.counts.unchanged,
            total_days = document.data.len(),
            "sync complete"
        );
        Ok(SyncOutcome::Synced(outcome.counts))
    }

    async fn record_failure(
        &self,
        mut document: PersistedDocument,
        now: DateTime<Tz>,
        reason: &str,
    ) -> Result<()> {
        let metadata = document.metadata.get_or_insert_with(|| Metadata {
            timezone: self.timezone.name().to_string(),
            ..Metadata::default()
        });
        metadata.last_failure = Some(now.fixed_offset());
        metadata.failure_reason = Some(reason.to_string());

        warn!(days = document.data.len(), "keeping last good series");
        self.store.save(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StepsError;
    use crate::models::{DailyRecord, DailySeries, FetchedDay};
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct FakeSource {
        days: Vec<FetchedDay>,
        fail: bool,
        calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    }

    impl FakeSource {
        fn with_days(days: Vec<FetchedDay>) -> Self {
            Self {
                days,
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with_days(Vec::new())
            }
        }
    }

    impl StepSource for FakeSource {
        async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<FetchedDay>> {
            self.calls.lock().unwrap().push((start, end));
            if self.fail {
                return Err(StepsError::upstream("connection reset"));
            }
            Ok(self
                .days
                .iter()
                .filter(|day| day.date >= start && day.date <= end)
                .copied()
                .collect())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        document: Mutex<Option<PersistedDocument>>,
    }

    impl DocumentStore for MemoryStore {
        async fn load(&self) -> Result<Option<PersistedDocument>> {
            Ok(self.document.lock().unwrap().clone())
        }

        async fn save(&self, document: &PersistedDocument) -> Result<()> {
            *self.document.lock().unwrap() = Some(document.clone());
            Ok(())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn now() -> DateTime<Tz> {
        chrono_tz::Australia::Sydney
            .with_ymd_and_hms(2026, 1, 5, 6, 0, 0)
            .unwrap()
    }

    fn job(source: FakeSource, store: MemoryStore) -> SyncJob<FakeSource, MemoryStore> {
        SyncJob {
            source,
            store,
            timezone: chrono_tz::Australia::Sydney,
            series_start: day(1),
        }
    }

    fn fetched(date: NaiveDate, steps: u64) -> FetchedDay {
        FetchedDay {
            date,
            record: DailyRecord::new(steps, 1.0),
        }
    }

    #[tokio::test]
    async fn first_sync_fetches_whole_range_and_stamps_metadata() {
        let source = FakeSource::with_days((1..=5).map(|d| fetched(day(d), 1000 * d as u64)).collect());
        let job = job(source, MemoryStore::default());

        let outcome = job.run(now()).await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Synced(MergeCounts {
                new: 5,
                updated: 0,
                unchanged: 0
            })
        );
        assert_eq!(*job.source.calls.lock().unwrap(), vec![(day(1), day(5))]);

        let saved = job.store.document.lock().unwrap().clone().unwrap();
        let metadata = saved.metadata.unwrap();
        assert_eq!(metadata.timezone, "Australia/Sydney");
        assert_eq!(metadata.last_updated, Some(now().fixed_offset()));
        assert_eq!(saved.data.len(), 5);
    }

    #[tokio::test]
    async fn later_sync_refetches_only_gaps_today_and_yesterday() {
        let mut data = DailySeries::new();
        for d in [1, 2, 4, 5] {
            data.insert(day(d), DailyRecord::new(1000, 1.0));
        }
        let store = MemoryStore::default();
        *store.document.lock().unwrap() = Some(PersistedDocument { metadata: None, data });

        let source = FakeSource::with_days(vec![fetched(day(3), 3000), fetched(day(4), 1000), fetched(day(5), 2500)]);
        let job = job(source, store);

        let outcome = job.run(now()).await.unwrap();
        assert_eq!(*job.source.calls.lock().unwrap(), vec![(day(3), day(5))]);
        assert_eq!(
            outcome,
            SyncOutcome::Synced(MergeCounts {
                new: 1,
                updated: 1,
                unchanged: 1
            })
        );
    }

    #[tokio::test]
    async fn upstream_failure_keeps_existing_days() {
        let mut data = DailySeries::new();
        data.insert(day(1), DailyRecord::new(12000, 9.0));
        let store = MemoryStore::default();
        *store.document.lock().unwrap() = Some(PersistedDocument { metadata: None, data: data.clone() });

        let job = job(FakeSource::failing(), store);
        let outcome = job.run(now()).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Degraded { ref reason } if reason.contains("connection reset")));

        let saved = job.store.document.lock().unwrap().clone().unwrap();
        assert_eq!(saved.data, data);
        let metadata = saved.metadata.unwrap();
        assert!(metadata.is_degraded());
        assert_eq!(metadata.last_failure, Some(now().fixed_offset()));
        assert!(metadata.last_updated.is_none());
    }
}
