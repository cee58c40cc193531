use chrono::Utc;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use step_dashboard::source::HttpStepSource;
use step_dashboard::storage::FileStore;
use step_dashboard::{router, AppState, Config, SyncJob, SyncOutcome};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "step_dashboard")]
#[command(version, about = "Daily step dashboard and sync job", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard (default)
    Serve,
    /// Fetch new step data once and update the stored document
    Sync,
}

type HttpSyncJob = SyncJob<HttpStepSource, FileStore>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await?,
        Command::Sync => {
            let job = sync_job(&config)?;
            run_sync(&job).await?;
        }
    }

    Ok(())
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(interval) = config.sync_interval {
        let job = sync_job(&config)?;
        info!(minutes = interval.as_secs() / 60, "background sync enabled");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(err) = run_sync(&job).await {
                    error!("scheduled sync failed: {err}");
                }
            }
        });
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn sync_job(config: &Config) -> step_dashboard::Result<HttpSyncJob> {
    Ok(SyncJob {
        source: HttpStepSource::new(&config.api_url, config.require_api_token()?)?,
        store: FileStore::new(config.data_path.clone()),
        timezone: config.timezone,
        series_start: config.series_start,
    })
}

async fn run_sync(job: &HttpSyncJob) -> step_dashboard::Result<()> {
    let now = Utc::now().with_timezone(&job.timezone);
    match job.run(now).await? {
        SyncOutcome::Synced(counts) if counts.changed() == 0 => info!("no changes"),
        SyncOutcome::Synced(counts) => info!(changed = counts.changed(), "series updated"),
        SyncOutcome::Degraded { reason } => warn!("sync degraded: {reason}"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
