pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod merge;
pub mod models;
pub mod source;
pub mod state;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use errors::{Result, StepsError};
pub use state::AppState;
pub use stats::{compute_stats, StatsContext};
pub use sync::{SyncJob, SyncOutcome};
