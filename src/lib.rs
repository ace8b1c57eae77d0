//! urlshot library
//!
//! A safe URL screenshot service: validate an untrusted target URL, clamp
//! the requested viewport against subscription-tier bounds, drive a headless
//! browser through an isolated per-request session, and hand back PNG bytes
//! or a structured error.
//!
//! # Module Overview
//!
//! - [`validator`] - URL safety validation (scheme allowlist, private/loopback
//!   address rejection)
//! - [`viewport`] - best-effort viewport normalization and clamping
//! - [`tiers`] - static subscription-tier limits table
//! - [`capture`] - capture orchestration and the rendering-engine seam
//! - [`error`] - error taxonomy and capture-failure classification
//! - [`config`] - service configuration
//! - [`server`] - axum HTTP collaborator
//!
//! # Example
//!
//! ```no_run
//! use urlshot_lib::{normalize, validate, CaptureBudgets, CaptureRequest, Orchestrator, PlaywrightEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let url = validate(Some("https://example.com"))?;
//! let viewport = normalize(Some("1280"), Some("720"), None);
//!
//! let engine = PlaywrightEngine::new("node");
//! let orchestrator = Orchestrator::new(engine, CaptureBudgets::default());
//! let request = CaptureRequest { url, viewport, full_page: false };
//! let shot = orchestrator.capture(&request).await?;
//! println!("captured {} bytes in {:?}", shot.image.len(), shot.duration);
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod server;
pub mod tiers;
pub mod validator;
pub mod viewport;

// Capture module re-exports
pub use capture::engine::{EngineError, EngineSession, RenderEngine};
pub use capture::playwright::{ensure_node_available, ensure_playwright_available, PlaywrightEngine};
pub use capture::{
    CaptureBudgets, CaptureFailure, CaptureRequest, CaptureResult, Capturer, Orchestrator,
    DEFAULT_CAPTURE_TIMEOUT, DEFAULT_LAUNCH_TIMEOUT, DEFAULT_NAVIGATION_TIMEOUT,
};
pub use config::{ProxyAuth, ServiceConfig, EXPECTED_HOST_ENV, PROXY_SECRET_ENV};
pub use error::{classify, ErrorCode, ErrorPayload, Result, ShotError};
pub use server::{router, serve, AppState, PROXY_SECRET_HEADER, TIER_HEADER};
pub use tiers::{Tier, TierLimits};
pub use validator::{validate, Scheme, ValidatedUrl, ValidationError};
pub use viewport::{
    normalize, Viewport, DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_DIMENSION, MIN_DIMENSION,
};
