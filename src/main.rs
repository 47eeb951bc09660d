//! Entitlement engine worker.
//!
//! Loads configuration, connects to PostgreSQL and runs the subscription
//! expiry sweeper until Ctrl-C. Request-driven components (payments, reads,
//! escrow) are embedded by the host service through the library crate.

use std::error::Error;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use entitlement_engine::adapters::postgres::{
    PostgresSubscriptionCache, PostgresSubscriptionRepository,
};
use entitlement_engine::application::{ExpirySweeper, SubscriptionLifecycle};
use entitlement_engine::config::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    let lifecycle = Arc::new(SubscriptionLifecycle::new(
        Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        Arc::new(PostgresSubscriptionCache::new(pool.clone())),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = ExpirySweeper::new(lifecycle, config.subscription.sweep_interval());
    let sweeper_task = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    info!("Entitlement engine worker started");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown requested");

    let _ = shutdown_tx.send(true);
    sweeper_task.await?;
    pool.close().await;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(logging.env_filter()?)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    if logging.json {
        builder.json().with_target(false).try_init()
    } else {
        builder.try_init()
    }
}
