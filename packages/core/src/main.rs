use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;

use iot_platform::api::{create_router, shutdown_on, AppState};
use iot_platform::cli::Cli;
use iot_platform::config::Config;
use iot_platform::db::create_pool_with_options;
use iot_platform::logging::init_logging;
use iot_platform::metrics::AppMetrics;
use iot_platform::repository::{SqliteDeviceRepository, SqliteSensorReadingRepository};
use iot_platform::services::{DeviceService, SensorReadingService};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    if let Err(err) = run(Cli::parse()).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?.apply_cli(&cli);
    tracing::info!(
        bind = %config.bind_address,
        max_connections = config.max_connections,
        "Service starting"
    );

    let pool = create_pool_with_options(&config.database_url, config.max_connections).await?;
    let device_repo = SqliteDeviceRepository::connect(pool.clone()).await?;
    let reading_repo = SqliteSensorReadingRepository::connect(pool.clone()).await?;

    let state = Arc::new(AppState {
        devices: DeviceService::new(Arc::new(device_repo)),
        readings: SensorReadingService::new(Arc::new(reading_repo)),
        metrics: Arc::new(AppMetrics::new()?),
    });

    let app = create_router(state, config.request_timeout);
    let listener = TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await?;

    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

