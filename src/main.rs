use anyhow::{Context, Result};
use chrono::TimeDelta;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sputnik_popularity::{
    api,
    config::Config,
    db::{self, UtilizationStore},
    recent::RecentCache,
    refresh::RefreshService,
    scrape::{ScrapeService, Scraper},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent — env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    // Shared in-memory window of recent readings
    let retention = TimeDelta::from_std(config.recent_retention)
        .context("RECENT_RETENTION_SECS is too large")?;
    let cache = RecentCache::new(retention).context("creating the recent cache")?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database ready");
    let store = UtilizationStore::new(pool);

    // Spawn scrape loop
    {
        let http = reqwest::Client::builder()
            .timeout(config.scrape_timeout)
            .build()
            .context("building the scrape HTTP client")?;
        let scraper = Scraper::new(
            http,
            &config.scrape_url,
            &config.scrape_gym_name,
            config.scrape_gym_id,
            chrono::Utc::now,
        );
        let service =
            ScrapeService::new(scraper, cache.clone(), store.clone(), config.scrape_period);
        tokio::spawn(service.run());
    }

    // Spawn refresh loop — reloads the cache from the database
    {
        let service = RefreshService::new(store, cache.clone(), config.refresh_period);
        tokio::spawn(service.run());
    }

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    api::serve(
        listener,
        api::router(cache, config.server_request_timeout),
        shutdown_signal(),
        config.server_shutdown_timeout,
    )
    .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
