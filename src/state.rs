use crate::config::Config;
use crate::storage::FileStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: FileStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: FileStore::new(config.data_path.clone()),
            config: Arc::new(config),
        }
    }
}
