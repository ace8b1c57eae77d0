//! HTTP collaborator for the capture core.
//!
//! Two endpoints:
//! - `/v1/screenshot` - validated, tier-bounded page capture
//! - `/healthz` - liveness probe
//!
//! The server owns caller identification, tier lookup, and translating the
//! core's structured errors into wire responses. The capture core never
//! sees a request object or a header.

pub mod handlers;
mod types;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::capture::Capturer;
use crate::config::ServiceConfig;
use crate::error::ShotError;

pub use handlers::{PROXY_SECRET_HEADER, TIER_HEADER};
pub use types::{AppState, ErrorBody, HealthResponse, ScreenshotParams};

/// Builds the service router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/screenshot", get(handlers::screenshot))
        .route("/healthz", get(handlers::health))
        .with_state(state)
}

/// Binds and runs the capture service until the process is stopped.
pub async fn serve(config: ServiceConfig, capturer: Arc<dyn Capturer>) -> crate::Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    if config.auth.secret.is_none() {
        log::warn!(
            "{} is not set; every capture request will be answered with a configuration error",
            crate::config::PROXY_SECRET_ENV
        );
    }

    let state = AppState {
        config: Arc::new(config),
        capturer,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| ShotError::Config(format!("Failed to bind {}: {}", addr, err)))?;

    log::info!("urlshot listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
