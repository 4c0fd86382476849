use std::net::SocketAddr;
use std::time::Duration;

use forno_server::error::BoxError;
use forno_server::{AppState, Config, api, logger};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let _log_guard = logger::init_logger(config.log_dir.as_deref(), config.log_json);

    tracing::info!("Starting forno-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    // Periodic cache sweep (expired entries, capacity trim)
    let cache = state.cache.clone();
    let sweep_every = config.cache_sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let report = cache.sweep();
            if report.expired > 0 || report.trimmed > 0 {
                tracing::debug!(
                    expired = report.expired,
                    trimmed = report.trimmed,
                    "Cache sweep"
                );
            }
        }
    });

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("forno-server HTTP listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("forno-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
