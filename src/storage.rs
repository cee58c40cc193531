use crate::errors::{Result, StepsError};
use crate::models::PersistedDocument;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Where the persisted document lives.
pub trait DocumentStore {
    /// `Ok(None)` when nothing has been written yet.
    fn load(&self) -> impl Future<Output = Result<Option<PersistedDocument>>> + Send;

    fn save(&self, document: &PersistedDocument) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileStore {
    async fn load(&self) -> Result<Option<PersistedDocument>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no document yet");
                return Ok(None);
            }
            Err(err) => {
                return Err(StepsError::persistence(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )))
            }
        };

        PersistedDocument::from_slice(&bytes).map(Some)
    }

    async fn save(&self, document: &PersistedDocument) -> Result<()> {
        let payload = document.to_json_pretty()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|err| {
                StepsError::persistence(format!("failed to create {}: {err}", parent.display()))
            })?;
        }

        // Write beside the target and rename so readers never see half a file.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload).await.map_err(|err| {
            StepsError::persistence(format!("failed to write {}: {err}", staging.display()))
        })?;
        fs::rename(&staging, &self.path).await.map_err(|err| {
            StepsError::persistence(format!("failed to replace {}: {err}", self.path.display()))
        })?;

        info!(path = %self.path.display(), days = document.data.len(), "document saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyRecord, DailySeries};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("steps_data.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_creates_parent_dirs_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/steps_data.json"));

        let mut data = DailySeries::new();
        data.insert(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), DailyRecord::new(100, 0.1));
        let document = PersistedDocument {
            metadata: None,
            data,
        };

        store.save(&document).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(document));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps_data.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = FileStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, StepsError::Persistence(_)));
    }

    #[tokio::test]
    async fn malformed_entry_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps_data.json");
        std::fs::write(&path, br#"{"2026-01-01": "lots"}"#).unwrap();

        let err = FileStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, StepsError::MalformedRecord { .. }));
    }
}
