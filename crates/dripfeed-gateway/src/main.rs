use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dripfeed_core::DripfeedConfig;
use dripfeed_publisher::{Credentials, DryRunPublisher, Publisher, TwitterPublisher};
use dripfeed_scheduler::{Job, JobAction, Schedule, SchedulerEngine};
use dripfeed_sources::{LinesFile, NotionSource};
use dripfeed_store::{JsonDocument, Ledger, QueueManager, StoreError};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::pipeline::{Pipeline, PostOutcome};

mod app;
mod auth;
mod error;
mod http;
mod pipeline;
#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(name = "dripfeed-gateway", version, about = "Queue tracker output and publish it one post a day")]
struct Cli {
    /// Config file (default: $DRIPFEED_CONFIG, then ./dripfeed.toml)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dripfeed_gateway=info,tower_http=debug".into()),
        )
        .init();

    // config: --config > DRIPFEED_CONFIG env > ./dripfeed.toml
    let cli = Cli::parse();
    let config_path = cli.config.or_else(|| std::env::var("DRIPFEED_CONFIG").ok());
    let config = DripfeedConfig::load(config_path.as_deref())?;
    config.validate().context("configuration error")?;
    let (post_hour, post_minute) = config.publish.post_time_hm()?;

    let queue = QueueManager::new(&config.paths.schedule_file);
    let ledger = Ledger::new(&config.paths.state_file);
    let lines = LinesFile::new(&config.paths.lines_file, &config.paths.file_state_file);

    // refuse to start on unreadable state unless told to set it aside
    let reset = config.store.reset_corrupt;
    verify_document("schedule", queue.document(), reset)?;
    verify_document("ledger", ledger.document(), reset)?;
    verify_document("file cursor", lines.cursor(), reset)?;

    let tracker = Arc::new(NotionSource::new(
        config.notion.api_key.clone(),
        config.notion.database_id.clone(),
        config.notion.project_id.clone(),
        Some(config.notion.base_url.clone()),
    ));
    let publisher = build_publisher(&config);

    let pipeline = Arc::new(Pipeline::new(queue, ledger, tracker, lines, publisher));

    // Fired-job channel: SchedulerEngine → job dispatcher task
    let (fired_tx, fired_rx) = mpsc::channel::<Job>(16);
    let scheduler_engine = SchedulerEngine::new(Some(fired_tx));
    scheduler_engine.add_job(
        "sync",
        Schedule::Interval {
            every_secs: config.sync.interval_secs,
        },
        JobAction::Sync,
    )?;
    scheduler_engine.add_job(
        "publish",
        Schedule::Daily {
            hour: post_hour,
            minute: post_minute,
        },
        JobAction::Publish,
    )?;
    info!(
        sync_every_secs = config.sync.interval_secs,
        post_time = %config.publish.post_time,
        "scheduled sync and daily publish (UTC)"
    );

    let bind = config.server.bind.clone();
    let port = config.server.port;
    let auth_enabled = config
        .auth
        .dashboard_password
        .as_deref()
        .is_some_and(|p| !p.is_empty());

    let state = Arc::new(app::AppState::new(
        config,
        Arc::clone(&pipeline),
        scheduler_engine.handle(),
    ));
    let router = app::build_router(state);

    tokio::spawn(dispatch_jobs(fired_rx, pipeline));

    // spawn scheduler engine loop in background
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move { scheduler_engine.run(shutdown_rx).await });

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!(%addr, auth_enabled, "dripfeed gateway listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // signal scheduler to stop
    let _ = shutdown_tx.send(true);
    info!("shut down");
    Ok(())
}

fn build_publisher(config: &DripfeedConfig) -> Arc<dyn Publisher> {
    if config.publish.dry_run {
        warn!("DRY RUN: posts will be logged, not published");
        return Arc::new(DryRunPublisher);
    }
    let twitter = &config.twitter;
    Arc::new(TwitterPublisher::new(
        Credentials {
            consumer_key: twitter.app_key.clone(),
            consumer_secret: twitter.app_secret.clone(),
            token: twitter.access_token.clone(),
            token_secret: twitter.access_secret.clone(),
        },
        Some(twitter.base_url.clone()),
    ))
}

/// Load `doc` once. A corrupt document is quarantined when `reset` is set,
/// otherwise startup fails.
fn verify_document<T>(label: &str, doc: &JsonDocument<T>, reset: bool) -> anyhow::Result<()>
where
    T: Serialize + DeserializeOwned + Default,
{
    match doc.load() {
        Ok(_) => Ok(()),
        Err(e @ StoreError::CorruptState { .. }) if !reset => Err(anyhow::Error::new(e).context(
            format!("{label} document is corrupt; fix it or set store.reset_corrupt = true"),
        )),
        Err(StoreError::CorruptState { .. }) => {
            if let Some(moved) = doc.quarantine()? {
                warn!(document = label, moved_to = %moved.display(), "starting from an empty document");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Run each fired job on its own task so a slow sync never delays a publish.
async fn dispatch_jobs(mut fired_rx: mpsc::Receiver<Job>, pipeline: Arc<Pipeline>) {
    while let Some(job) = fired_rx.recv().await {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            match job.action {
                JobAction::Sync => {
                    let report = pipeline.sync_all().await;
                    info!(
                        job_id = %job.id,
                        tracker_added = report.tracker.as_ref().map(|r| r.added).ok(),
                        file_added = report.file.as_ref().map(|r| r.added).ok(),
                        "scheduled sync finished"
                    );
                }
                JobAction::Publish => match pipeline.post_next().await {
                    Ok(PostOutcome::Posted { post_id, .. }) => {
                        info!(job_id = %job.id, %post_id, "scheduled post published")
                    }
                    Ok(PostOutcome::Empty) => info!(job_id = %job.id, "scheduled post skipped, queue empty"),
                    Ok(PostOutcome::Failed { error, .. }) => {
                        warn!(job_id = %job.id, error = %error, "scheduled post failed, will retry next run")
                    }
                    Err(e) => warn!(job_id = %job.id, error = %e, code = e.code(), "scheduled post errored"),
                },
            }
        });
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
