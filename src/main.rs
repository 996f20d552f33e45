// Memobridge - caregiving reminder daemon
// Entry point: wires the store, the mail channel and the monitor loop.

use memobridge::database::{create_pool, Repository};
use memobridge::services::{EscalationEngine, HttpMailer, MonitorService, NotificationChannel};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memobridge=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Memobridge reminder daemon");

    let db_path = std::env::var("MEMOBRIDGE_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("memobridge.db"));

    let pool = create_pool(&db_path).await?;
    let repo = Repository::new(pool);

    let mailer = HttpMailer::from_env()?;

    let engine = Arc::new(EscalationEngine::new(
        Arc::new(repo),
        Arc::new(mailer) as Arc<dyn NotificationChannel>,
    ));

    let monitor = MonitorService::new(engine);
    monitor.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    monitor.stop();

    Ok(())
}
