//! HTTP server: routing, middleware and lifecycle.

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod rate_limit;
pub mod state;

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::FutureExt;
use tokio::net::TcpListener;
use tracing::{error, info};

pub use error::ServiceError;
pub use state::AppState;

/// Builds the application router.
///
/// `/generate` is guarded by its own limiter and accepts bodies of any size;
/// every other route shares the default limiter. Unknown paths get a JSON 404
/// and handler panics a JSON 500.
pub fn router(state: AppState) -> Router {
    let generate = Router::new()
        .route("/generate", post(handlers::generate))
        .route_layer(from_fn_with_state(
            state.generate_limiter.clone(),
            rate_limit::enforce,
        ))
        .layer(DefaultBodyLimit::disable());

    let defaults = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route_layer(from_fn_with_state(
            state.default_limiter.clone(),
            rate_limit::enforce,
        ));

    generate
        .merge(defaults)
        .fallback(handlers::not_found)
        .layer(from_fn(recover_panics))
        .with_state(state)
}

/// Turns a panicking handler into a JSON 500 instead of a dropped connection.
async fn recover_panics(request: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            error!(panic = %message, "Server error");
            ServiceError::Internal.into_response()
        }
    }
}

/// Serves `state` on `listener` until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!("listening on http://{}", addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("HTTP server failed")
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    serve_with_shutdown(listener, state, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
    })
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn boom() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn panics_become_json_internal_errors() {
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(from_fn(recover_panics));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let response = reqwest::get(format!("http://{addr}/boom")).await.unwrap();
        assert_eq!(response.status().as_u16(), 500);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Internal server error" }));
    }
}
