//! Capture orchestration.
//!
//! One capture call = one fresh engine session: launch, navigate under a
//! deadline, snapshot under a separate deadline, and tear the session down
//! no matter which of those steps failed. Sessions are never pooled or
//! reused; full isolation between untrusted targets is worth the per-call
//! startup cost at this request volume.

pub mod engine;
pub mod playwright;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::timeout;

use crate::validator::ValidatedUrl;
use crate::viewport::Viewport;
use engine::{EngineSession, RenderEngine};

/// Default deadline for navigation (page load + network idle).
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for producing the raster snapshot.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for acquiring a fresh engine session.
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Time budgets for the phases of a single capture.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CaptureBudgets {
    #[serde(with = "humantime_serde")]
    pub launch: Duration,
    #[serde(with = "humantime_serde")]
    pub navigation: Duration,
    #[serde(with = "humantime_serde")]
    pub capture: Duration,
}

impl Default for CaptureBudgets {
    fn default() -> Self {
        Self {
            launch: DEFAULT_LAUNCH_TIMEOUT,
            navigation: DEFAULT_NAVIGATION_TIMEOUT,
            capture: DEFAULT_CAPTURE_TIMEOUT,
        }
    }
}

/// Everything the orchestrator needs for one capture. Immutable; nothing in
/// here is shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub url: ValidatedUrl,
    pub viewport: Viewport,
    pub full_page: bool,
}

/// A successful capture: PNG bytes plus wall-clock duration.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub image: Vec<u8>,
    pub duration: Duration,
}

/// A failed capture. Carries the engine's descriptive text for the error
/// classifier; consumed immediately and discarded.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CaptureFailure {
    pub message: String,
}

impl CaptureFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The capture operation as the HTTP layer sees it.
#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture(&self, request: &CaptureRequest) -> Result<CaptureResult, CaptureFailure>;
}

/// Drives a [`RenderEngine`] through the scoped per-request session
/// lifecycle.
pub struct Orchestrator<E> {
    engine: E,
    budgets: CaptureBudgets,
}

impl<E: RenderEngine> Orchestrator<E> {
    pub fn new(engine: E, budgets: CaptureBudgets) -> Self {
        Self { engine, budgets }
    }

    /// Captures one page. The session opened here is closed on every exit
    /// path - success, phase failure, or deadline expiry - before this
    /// function returns.
    pub async fn capture(&self, request: &CaptureRequest) -> Result<CaptureResult, CaptureFailure> {
        let started = Instant::now();

        let mut session = match timeout(
            self.budgets.launch,
            self.engine.session(request.viewport, self.budgets),
        )
        .await
        {
            Ok(Ok(session)) => session,
            Ok(Err(err)) => return Err(CaptureFailure::new(err.to_string())),
            Err(_) => {
                return Err(CaptureFailure::new(format!(
                    "Engine launch timeout of {}ms exceeded",
                    self.budgets.launch.as_millis()
                )))
            }
        };

        let outcome = drive(session.as_mut(), request, &self.budgets).await;
        session.close().await;

        let image = outcome?;
        Ok(CaptureResult {
            image,
            duration: started.elapsed(),
        })
    }
}

#[async_trait]
impl<E: RenderEngine> Capturer for Orchestrator<E> {
    async fn capture(&self, request: &CaptureRequest) -> Result<CaptureResult, CaptureFailure> {
        Orchestrator::capture(self, request).await
    }
}

/// The two blocking phases, each under its own deadline. Split out so the
/// caller can close the session unconditionally around whatever happens in
/// here.
async fn drive(
    session: &mut dyn EngineSession,
    request: &CaptureRequest,
    budgets: &CaptureBudgets,
) -> Result<Vec<u8>, CaptureFailure> {
    match timeout(budgets.navigation, session.navigate(request.url.href())).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => return Err(CaptureFailure::new(err.to_string())),
        Err(_) => {
            return Err(CaptureFailure::new(format!(
                "Navigation timeout of {}ms exceeded",
                budgets.navigation.as_millis()
            )))
        }
    }

    match timeout(budgets.capture, session.snapshot(request.full_page)).await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(err)) => Err(CaptureFailure::new(err.to_string())),
        Err(_) => Err(CaptureFailure::new(format!(
            "Screenshot timeout of {}ms exceeded",
            budgets.capture.as_millis()
        ))),
    }
}
