mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tapred_fairscale::{FairscaleClient, RetryPolicy};
use tapred_tapestry::TapestryClient;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = tapred_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, "starting tapred server");

    let tapestry = TapestryClient::with_base_url(
        &config.tapestry_api_key,
        config.http_timeout_secs,
        &config.tapestry_base_url,
    )?;
    let fairscale = FairscaleClient::with_base_url(
        &config.fairscale_api_key,
        config.http_timeout_secs,
        RetryPolicy {
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        },
        &config.fairscale_base_url,
    )?;

    let app = build_app(AppState {
        tapestry: Arc::new(tapestry),
        fairscale: Arc::new(fairscale),
        score_max_age: chrono::Duration::hours(config.score_max_age_hours),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
