//! parkline HTTP server.
//!
//! Wires the engines over PostgreSQL, spawns the overstay sweeper, and
//! serves the API until a shutdown signal arrives.

use parkline_core::config::{SweeperConfig, TicketConfig};
use parkline_core::engines::OverstaySweeper;
use parkline_core::environment::SystemClock;
use parkline_postgres::{run_migrations, PostgresBookingStore};
use parkline_server::{build_router, AppState, Config};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkline=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        addr = %config.bind_addr(),
        sweep_interval_secs = config.sweeper.interval_secs,
        "starting parkline server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .connect(&config.postgres.url)
        .await?;
    run_migrations(&pool).await?;
    info!("database connected and migrated");

    // The sweeper runs alongside request traffic and only touches
    // booking rows; it gets its own store handle.
    let sweeper = OverstaySweeper::new(
        Arc::new(PostgresBookingStore::new(pool.clone())),
        Arc::new(SystemClock),
        SweeperConfig::new(Duration::from_secs(config.sweeper.interval_secs))
            .with_batch_limit(config.sweeper.batch_limit),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx));

    let state = AppState::new(pool, TicketConfig::new(config.ticket.prefix.clone()));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the sweeper and wait for the in-flight sweep to finish.
    shutdown_tx.send(true).ok();
    sweeper_handle.await?;
    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
}
