//! Request handlers for the capture service.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::types::{is_truthy, AppState, ErrorBody, HealthResponse, ScreenshotParams};
use crate::capture::{CaptureRequest, CaptureResult, Capturer as _};
use crate::error::{classify, ErrorCode, ErrorPayload};
use crate::tiers::{Tier, TierLimits};
use crate::validator::validate;
use crate::viewport::{normalize, Viewport};

/// Caller-supplied shared secret proving the request came through the proxy.
pub const PROXY_SECRET_HEADER: &str = "x-proxy-secret";

/// Subscription tier resolved by the upstream proxy.
pub const TIER_HEADER: &str = "x-subscription-tier";

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// The capture endpoint: identify the caller, validate the target, clamp
/// the viewport, orchestrate the capture, and answer with PNG bytes or a
/// structured error.
pub async fn screenshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ScreenshotParams>,
) -> Response {
    let Some(secret) = state.config.auth.secret.as_deref() else {
        log::error!("proxy secret is not configured; refusing capture request");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SERVER_MISCONFIGURED",
            "capture service is not configured for proxied requests",
        );
    };

    let presented = headers
        .get(PROXY_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented != Some(secret) {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "missing or invalid proxy credentials",
        );
    }

    if let Some(expected) = state.config.auth.expected_host.as_deref() {
        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok());
        if !host.map_or(false, |h| h.eq_ignore_ascii_case(expected)) {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "request host does not match the configured endpoint",
            );
        }
    }

    let tier = headers
        .get(TIER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map_or(Tier::Basic, Tier::from_name);
    let limits = tier.limits();

    let url = match validate(params.url.as_deref()) {
        Ok(url) => url,
        Err(err) => {
            log::debug!("rejected capture target: {}", err);
            return taxonomy_response(err.code(), err.to_string());
        }
    };

    let viewport = normalize(params.width.as_deref(), params.height.as_deref(), Some(limits));
    let full_page = is_truthy(params.full_page.as_deref());

    let request = CaptureRequest {
        url,
        viewport,
        full_page,
    };

    log::info!(
        "capturing {} at {} (tier {}, full_page {})",
        request.url.host(),
        viewport,
        tier.name(),
        full_page
    );

    match state.capturer.capture(&request).await {
        Ok(result) => {
            log::info!(
                "captured {} in {}ms ({} bytes)",
                request.url.host(),
                result.duration.as_millis(),
                result.image.len()
            );
            png_response(result, viewport, full_page, limits)
        }
        Err(failure) => {
            let code = classify(&failure);
            log::warn!(
                "capture of {} failed ({}): {}",
                request.url.host(),
                code,
                failure
            );
            taxonomy_response(code, failure.message)
        }
    }
}

fn png_response(
    result: CaptureResult,
    viewport: Viewport,
    full_page: bool,
    limits: &TierLimits,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert("x-screenshot-width", HeaderValue::from(viewport.width));
    headers.insert("x-screenshot-height", HeaderValue::from(viewport.height));
    headers.insert(
        "x-screenshot-full-page",
        HeaderValue::from_static(if full_page { "true" } else { "false" }),
    );
    headers.insert(
        "x-processing-ms",
        HeaderValue::from(result.duration.as_millis() as u64),
    );
    headers.insert(
        "x-ratelimit-limit",
        HeaderValue::from(limits.max_requests_per_period),
    );
    (StatusCode::OK, headers, result.image).into_response()
}

fn taxonomy_response(code: ErrorCode, message: String) -> Response {
    let status = StatusCode::from_u16(code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorBody {
            error: ErrorPayload::new(code, message),
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: ErrorPayload {
                code: code.to_string(),
                message: message.to_string(),
            },
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureFailure, Capturer};
    use crate::config::{ProxyAuth, ServiceConfig};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubCapturer {
        calls: AtomicUsize,
        outcome: Result<Vec<u8>, String>,
    }

    impl StubCapturer {
        fn succeeding() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome: Ok(b"\x89PNG\r\n\x1a\nfake".to_vec()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome: Err(message.to_string()),
            })
        }
    }

    #[async_trait]
    impl Capturer for StubCapturer {
        async fn capture(
            &self,
            _request: &CaptureRequest,
        ) -> Result<CaptureResult, CaptureFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(bytes) => Ok(CaptureResult {
                    image: bytes.clone(),
                    duration: std::time::Duration::from_millis(42),
                }),
                Err(message) => Err(CaptureFailure::new(message.clone())),
            }
        }
    }

    fn state_with(capturer: Arc<StubCapturer>, secret: Option<&str>) -> AppState {
        let mut config = ServiceConfig::default();
        config.auth = ProxyAuth {
            secret: secret.map(String::from),
            expected_host: None,
        };
        AppState {
            config: Arc::new(config),
            capturer,
        }
    }

    fn authed_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(PROXY_SECRET_HEADER, HeaderValue::from_static("hunter2"));
        headers
    }

    fn params(url: &str) -> ScreenshotParams {
        ScreenshotParams {
            url: Some(url.to_string()),
            ..ScreenshotParams::default()
        }
    }

    #[tokio::test]
    async fn missing_secret_configuration_yields_500() {
        let capturer = StubCapturer::succeeding();
        let state = state_with(capturer.clone(), None);
        let response = screenshot(
            State(state),
            authed_headers(),
            Query(params("http://example.com")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_secret_yields_401() {
        let capturer = StubCapturer::succeeding();
        let state = state_with(capturer.clone(), Some("hunter2"));
        let mut headers = HeaderMap::new();
        headers.insert(PROXY_SECRET_HEADER, HeaderValue::from_static("wrong"));
        let response = screenshot(State(state), headers, Query(params("http://example.com"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn host_mismatch_yields_401() {
        let capturer = StubCapturer::succeeding();
        let mut config = ServiceConfig::default();
        config.auth = ProxyAuth {
            secret: Some("hunter2".to_string()),
            expected_host: Some("shots.example.com".to_string()),
        };
        let state = AppState {
            config: Arc::new(config),
            capturer: capturer.clone(),
        };
        let mut headers = authed_headers();
        headers.insert(header::HOST, HeaderValue::from_static("evil.example.com"));
        let response = screenshot(State(state), headers, Query(params("http://example.com"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blocked_target_never_reaches_the_engine() {
        let capturer = StubCapturer::succeeding();
        let state = state_with(capturer.clone(), Some("hunter2"));
        let response = screenshot(
            State(state),
            authed_headers(),
            Query(params("http://192.168.1.1")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_url_is_a_bad_request() {
        let capturer = StubCapturer::succeeding();
        let state = state_with(capturer.clone(), Some("hunter2"));
        let response = screenshot(
            State(state),
            authed_headers(),
            Query(ScreenshotParams::default()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_capture_answers_png_with_metadata() {
        let capturer = StubCapturer::succeeding();
        let state = state_with(capturer.clone(), Some("hunter2"));
        let response = screenshot(
            State(state),
            authed_headers(),
            Query(params("http://example.com")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert_eq!(headers.get("x-screenshot-width").unwrap(), "1366");
        assert_eq!(headers.get("x-screenshot-height").unwrap(), "768");
        assert_eq!(headers.get("x-screenshot-full-page").unwrap(), "false");
        assert_eq!(headers.get("x-processing-ms").unwrap(), "42");
        assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "250");
        assert_eq!(capturer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tier_header_tightens_viewport_and_rate_limit() {
        let capturer = StubCapturer::succeeding();
        let state = state_with(capturer.clone(), Some("hunter2"));
        let mut headers = authed_headers();
        headers.insert(TIER_HEADER, HeaderValue::from_static("pro"));
        let mut query = params("http://example.com");
        query.width = Some("5000".to_string());
        query.height = Some("5000".to_string());
        let response = screenshot(State(state), headers, Query(query)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-screenshot-width").unwrap(), "2560");
        assert_eq!(
            response.headers().get("x-screenshot-height").unwrap(),
            "1440"
        );
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "2500");
    }

    #[tokio::test]
    async fn capture_failures_are_classified() {
        let capturer = StubCapturer::failing("net::ERR_NAME_NOT_RESOLVED at http://nope.invalid/");
        let state = state_with(capturer.clone(), Some("hunter2"));
        let response = screenshot(
            State(state),
            authed_headers(),
            Query(params("http://nope.invalid/")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let capturer = StubCapturer::failing("Navigation timeout of 30000ms exceeded");
        let state = state_with(capturer.clone(), Some("hunter2"));
        let response = screenshot(
            State(state),
            authed_headers(),
            Query(params("http://slow.example.com/")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
