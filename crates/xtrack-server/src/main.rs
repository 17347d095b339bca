mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use xtrack_pipeline::ScrapeOptions;
use xtrack_search::{SearchProvider, TwitterApiClient};

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = xtrack_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = xtrack_db::PoolConfig::from_app_config(&config);
    let pool = xtrack_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = xtrack_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let search: Option<Arc<dyn SearchProvider>> = match TwitterApiClient::from_app_config(&config)
    {
        Ok(client) => Some(Arc::new(client)),
        Err(xtrack_search::SearchError::MissingApiKey) => {
            tracing::warn!("TWITTERAPI_KEY not set; POST /api/v1/scrape will fail until configured");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let state = AppState {
        pool,
        search,
        scrape_options: ScrapeOptions::from_app_config(&config),
    };
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, env = %config.env, "xtrack-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
