use anyhow::{Context, Result};
use pr_reviewer::config::Config;
use pr_reviewer::server::{self, AppState};
use pr_reviewer::services::EntropySource;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("LOG_LEVEL {:?} is not a valid filter", config.log_level))?;
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    log::info!(
        "Starting pr-reviewer (env: {}, port: {})",
        config.environment,
        config.port
    );

    let pool = pr_reviewer::db::initialize_with(&config.database_path, &config.pool_settings())
        .await
        .with_context(|| {
            format!(
                "Failed to initialize database at {}",
                config.database_path.display()
            )
        })?;

    let app = server::router(AppState::new(pool.clone(), Arc::new(EntropySource)));

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind to port {}", config.port))?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    server::serve(listener, app, cancel).await?;

    pool.close().await;
    log::info!("Database pool closed");
    Ok(())
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl-C"),
        _ = terminate => log::info!("Received SIGTERM"),
    }

    token.cancel();
}
