//! HTTP surface of jobboard: an axum router over the repositories and the
//! job workflow.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middlewares;
pub mod params;
pub mod router;
pub mod state;

pub use router::build_routes;
pub use state::AppState;

use jobboard_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;

/// Serves the API on `addr` until the server fails or ctrl+c is received.
pub async fn listen(state: AppState, addr: SocketAddr) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::NetworkError(format!("failed to bind {}: {}", addr, e)))?;
    tracing::info!("Listening on {}", addr);
    tokio::select! {
        r = axum::serve(listener, build_routes(state)).into_future() => {
            if let Err(e) = r {
                tracing::warn!("server ended unexpectedly: {:?}", e);
                return Err(AppError::NetworkError(e.to_string()));
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl+c interrupt, closing server");
        }
    }
    Ok(())
}
