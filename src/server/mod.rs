//! HTTP server for the reviewer-assignment API.
//!
//! A thin axum layer over the services: JSON in, JSON out, errors mapped
//! through [`error::ApiErr`]. Shutdown is driven by a `CancellationToken`.

pub mod error;
pub mod middleware;
pub mod routes;

use crate::db::pool::DbPool;
use crate::services::{PullRequestService, RandomSource, TeamService, UserService};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;

/// Shared state for the axum routes.
#[derive(Clone)]
pub struct AppState {
    pub teams: TeamService,
    pub users: UserService,
    pub pull_requests: PullRequestService,
}

impl AppState {
    pub fn new(pool: DbPool, random: Arc<dyn RandomSource>) -> Self {
        Self {
            teams: TeamService::new(pool.clone()),
            users: UserService::new(pool.clone()),
            pull_requests: PullRequestService::new(pool, random),
        }
    }
}

/// Build the full router with logging and panic recovery.
pub fn router(state: AppState) -> Router {
    routes::api_routes()
        .with_state(state)
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum::middleware::from_fn(middleware::log_requests))
}

/// Serve `app` on `listener` until `cancel` fires.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    cancel: CancellationToken,
) -> Result<(), std::io::Error> {
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    if let Some(addr) = addr {
        log::info!("[server] Listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            log::info!("[server] Shutdown requested, draining connections");
        })
        .await?;

    log::info!("[server] Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SeededSource;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let dir = tempdir().unwrap();
        let pool = crate::db::initialize(&dir.path().join("test.db")).await.unwrap();
        let app = router(AppState::new(pool, Arc::new(SeededSource(1))));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve(listener, app, cancel.clone()));

        cancel.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
