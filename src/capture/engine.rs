//! The rendering-engine seam.
//!
//! The orchestrator only ever talks to these traits: an engine is a factory
//! that opens one exclusive session per capture, and a session exposes the
//! two blocking phases (navigate, snapshot) plus teardown. Keeping the seam
//! object-safe lets tests drive the orchestrator with scripted sessions.

use async_trait::async_trait;
use thiserror::Error;

use crate::capture::CaptureBudgets;
use crate::viewport::Viewport;

/// Faults raised at the engine boundary. `Page` carries the engine's own
/// failure text verbatim so downstream classification can inspect it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be started at all (missing binary, missing
    /// browser package, dead helper).
    #[error("{0}")]
    Launch(String),

    /// Navigation or capture failed inside a running session.
    #[error("{0}")]
    Page(String),

    /// The helper spoke something other than the expected protocol.
    #[error("engine protocol error: {0}")]
    Protocol(String),

    #[error("engine io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One exclusive rendering session. Never shared or reused across captures;
/// cookies, cache, and page state die with it.
#[async_trait]
pub trait EngineSession: Send {
    /// Navigates to `url` and waits until the network is judged idle.
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError>;

    /// Produces a PNG of the configured viewport, or of the full scrollable
    /// page height when `full_page` is set.
    async fn snapshot(&mut self, full_page: bool) -> Result<Vec<u8>, EngineError>;

    /// Tears the session down. Must be safe to call on a session in any
    /// state, including one whose navigate or snapshot was cancelled.
    async fn close(&mut self);
}

/// Factory for rendering sessions, one per capture call.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Opens a fresh session configured at `viewport`. The budgets are
    /// forwarded so the engine can enforce matching deadlines internally.
    async fn session(
        &self,
        viewport: Viewport,
        budgets: CaptureBudgets,
    ) -> Result<Box<dyn EngineSession>, EngineError>;
}
