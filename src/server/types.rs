//! HTTP wire types and shared state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capture::Capturer;
use crate::config::ServiceConfig;
use crate::error::ErrorPayload;

/// Shared state handed to every handler. The config is immutable after
/// startup; the capturer is the only collaborator that does real work.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub capturer: Arc<dyn Capturer>,
}

/// Raw query parameters for the screenshot endpoint. Everything arrives as
/// untrusted text; validation and normalization happen in the core.
#[derive(Debug, Default, Deserialize)]
pub struct ScreenshotParams {
    pub url: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub full_page: Option<String>,
}

/// JSON error envelope: `{ "error": { "code", "message" } }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Query-parameter truthiness for `full_page`: `true`/`1` in any case,
/// everything else false. Best-effort like the viewport policy.
pub(crate) fn is_truthy(raw: Option<&str>) -> bool {
    raw.map_or(false, |value| {
        value.eq_ignore_ascii_case("true") || value == "1"
    })
}
