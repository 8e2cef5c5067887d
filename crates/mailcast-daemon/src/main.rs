use anyhow::Result;
use chrono::Utc;
use mailcast_dispatch::{CampaignCache, MailingScheduler};
use mailcast_mailer::smtp::SmtpMailer;
use mailcast_storage::sqlite::SqliteStore;
use mailcast_storage::EntityStore;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod config;
mod seed;

use config::DaemonConfig;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  mailcast-daemon [config.toml]                      Run the periodic dispatcher");
    eprintln!("  mailcast-daemon run-once [config.toml]             Run a single evaluation pass");
    eprintln!("  mailcast-daemon init-data <config.toml> <seed.json> Import clients, messages and campaigns");
}

const DEFAULT_CONFIG_PATH: &str = "config/mailcast.toml";

#[tokio::main]
async fn main() -> Result<()> {
    mailcast_common::id::init(1, 1);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mailcast=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("init-data") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-data requires <config.toml> and <seed.json> arguments")
            })?;
            let seed_path = args.get(3).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-data requires <seed.json> argument")
            })?;
            run_init_data(config_path, seed_path)
        }
        Some("run-once") => {
            let config_path = args.get(2).map(|s| s.as_str()).unwrap_or(DEFAULT_CONFIG_PATH);
            run_single_pass(config_path).await
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args.get(1).map(|s| s.as_str()).unwrap_or(DEFAULT_CONFIG_PATH);
            run_daemon(config_path).await
        }
    }
}

fn build_scheduler(config: &DaemonConfig) -> Result<MailingScheduler> {
    let store = Arc::new(SqliteStore::new(Path::new(&config.data_dir))?);
    let mailer = SmtpMailer::new(
        &config.smtp.host,
        config.smtp.port,
        config.smtp.username.as_deref(),
        config.smtp.password.as_deref(),
        config.smtp.send_timeout_secs,
    )?;
    let cache = CampaignCache::new(config.cache.enabled, config.cache.ttl_secs);
    Ok(MailingScheduler::new(
        store as Arc<dyn EntityStore>,
        Arc::new(mailer),
        cache,
        config.mail_from.clone(),
    ))
}

async fn run_daemon(config_path: &str) -> Result<()> {
    let config = DaemonConfig::load(config_path)?;

    tracing::info!(
        tick_secs = config.tick_secs,
        data_dir = %config.data_dir,
        smtp_host = %config.smtp.host,
        cache_enabled = config.cache.enabled,
        "mailcast-daemon starting"
    );

    let scheduler = build_scheduler(&config)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                cancel.cancel();
            }
        });
    }

    let mut tick = interval(Duration::from_secs(config.tick_secs));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Shutting down gracefully");
                break;
            }
            _ = tick.tick() => {
                // A failed pass is retried on the next tick
                if let Err(e) = scheduler.run_once(Utc::now(), &cancel).await {
                    tracing::error!(error = %e, "Mailing pass failed");
                }
            }
        }
    }

    Ok(())
}

/// One evaluation pass and out, for cron-style invocation.
async fn run_single_pass(config_path: &str) -> Result<()> {
    let config = DaemonConfig::load(config_path)?;
    let scheduler = build_scheduler(&config)?;

    let summary = scheduler.run_once(Utc::now(), &CancellationToken::new()).await?;
    tracing::info!(
        evaluated = summary.evaluated,
        dispatched = summary.dispatched,
        failed = summary.failed,
        "run-once completed"
    );
    Ok(())
}

/// Imports clients, message templates and campaigns from a JSON seed file.
fn run_init_data(config_path: &str, seed_path: &str) -> Result<()> {
    let config = DaemonConfig::load(config_path)?;
    let store = SqliteStore::new(Path::new(&config.data_dir))?;

    let seed_content = std::fs::read_to_string(seed_path)
        .map_err(|e| anyhow::anyhow!("Failed to read seed file '{}': {}", seed_path, e))?;
    let seed: seed::SeedFile = serde_json::from_str(&seed_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse seed file '{}': {}", seed_path, e))?;

    let report = seed::apply(&store, &seed)?;
    tracing::info!(
        clients_created = report.clients_created,
        clients_skipped = report.clients_skipped,
        messages_created = report.messages_created,
        messages_skipped = report.messages_skipped,
        campaigns_created = report.campaigns_created,
        campaigns_skipped = report.campaigns_skipped,
        memberships_created = report.memberships_created,
        "init-data completed"
    );
    Ok(())
}
