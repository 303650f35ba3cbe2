//! HTTP control surface

pub mod api;
pub mod error;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::state::DaemonState;

pub use error::ApiError;

/// Build the application router with its state attached
pub fn app(state: DaemonState) -> Router {
    api::router().with_state(state)
}

/// Serve the control surface until `shutdown` resolves.
///
/// Every channel is interrupted before in-flight requests are drained, so a
/// handler waiting on a hung command returns its `interrupted` record.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    state: DaemonState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("HTTP server listening on http://{}", addr);
    }
    let registry = Arc::clone(&state.registry);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            registry.cancel_all();
        })
        .await
}

/// Bind `addr` and serve until `cancel` fires
pub async fn serve(addr: &str, state: DaemonState, cancel: CancellationToken) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_shutdown(listener, state, async move { cancel.cancelled().await }).await
}
