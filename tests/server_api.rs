//! End-to-end HTTP round-trips against a live server with a stub capturer:
//! caller identification, validator short-circuits, PNG responses with
//! metadata headers, and classified failure payloads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use urlshot_lib::{
    router, AppState, CaptureFailure, CaptureRequest, CaptureResult, Capturer, ProxyAuth,
    ServiceConfig, PROXY_SECRET_HEADER, TIER_HEADER,
};

const SECRET: &str = "test-proxy-secret";
const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nstub-image";

struct StubCapturer {
    calls: AtomicUsize,
    fail_with: Option<&'static str>,
}

impl StubCapturer {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_with: None,
        })
    }

    fn failing(message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_with: Some(message),
        })
    }
}

#[async_trait]
impl Capturer for StubCapturer {
    async fn capture(&self, _request: &CaptureRequest) -> Result<CaptureResult, CaptureFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_with {
            Some(message) => Err(CaptureFailure::new(message)),
            None => Ok(CaptureResult {
                image: FAKE_PNG.to_vec(),
                duration: Duration::from_millis(17),
            }),
        }
    }
}

/// Binds the service on an ephemeral port and returns its base URL.
async fn spawn_server(capturer: Arc<StubCapturer>, secret: Option<&str>) -> String {
    let mut config = ServiceConfig::default();
    config.auth = ProxyAuth {
        secret: secret.map(String::from),
        expected_host: None,
    };
    let state = AppState {
        config: Arc::new(config),
        capturer,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let base = spawn_server(StubCapturer::succeeding(), Some(SECRET)).await;
    let response = client()
        .get(format!("{base}/healthz"))
        .send()
        .await
        .expect("health request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("health body");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn screenshot_round_trip_returns_png_and_metadata() {
    let capturer = StubCapturer::succeeding();
    let base = spawn_server(capturer.clone(), Some(SECRET)).await;

    let response = client()
        .get(format!("{base}/v1/screenshot"))
        .query(&[("url", "http://example.com"), ("full_page", "true")])
        .header(PROXY_SECRET_HEADER, SECRET)
        .send()
        .await
        .expect("screenshot request");

    assert_eq!(response.status().as_u16(), 200);
    let headers = response.headers();
    assert_eq!(headers.get("content-type").unwrap(), "image/png");
    assert_eq!(headers.get("x-screenshot-width").unwrap(), "1366");
    assert_eq!(headers.get("x-screenshot-height").unwrap(), "768");
    assert_eq!(headers.get("x-screenshot-full-page").unwrap(), "true");
    assert_eq!(headers.get("x-processing-ms").unwrap(), "17");
    assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "250");

    let body = response.bytes().await.expect("body");
    assert_eq!(&body[..], FAKE_PNG);
    assert_eq!(capturer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blocked_target_short_circuits_before_the_engine() {
    let capturer = StubCapturer::succeeding();
    let base = spawn_server(capturer.clone(), Some(SECRET)).await;

    let response = client()
        .get(format!("{base}/v1/screenshot"))
        .query(&[("url", "http://192.168.1.1")])
        .header(PROXY_SECRET_HEADER, SECRET)
        .send()
        .await
        .expect("blocked request");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("error body");
    assert_eq!(body["error"]["code"], "PRIVATE_ADDRESS");
    assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_url_is_rejected_with_missing_input() {
    let base = spawn_server(StubCapturer::succeeding(), Some(SECRET)).await;
    let response = client()
        .get(format!("{base}/v1/screenshot"))
        .header(PROXY_SECRET_HEADER, SECRET)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("error body");
    assert_eq!(body["error"]["code"], "MISSING_INPUT");
}

#[tokio::test]
async fn requests_without_the_secret_are_unauthorized() {
    let capturer = StubCapturer::succeeding();
    let base = spawn_server(capturer.clone(), Some(SECRET)).await;

    let response = client()
        .get(format!("{base}/v1/screenshot"))
        .query(&[("url", "http://example.com")])
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unconfigured_secret_is_a_server_error() {
    let base = spawn_server(StubCapturer::succeeding(), None).await;
    let response = client()
        .get(format!("{base}/v1/screenshot"))
        .query(&[("url", "http://example.com")])
        .header(PROXY_SECRET_HEADER, SECRET)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.expect("error body");
    assert_eq!(body["error"]["code"], "SERVER_MISCONFIGURED");
}

#[tokio::test]
async fn tier_header_is_reflected_in_limits() {
    let base = spawn_server(StubCapturer::succeeding(), Some(SECRET)).await;
    let response = client()
        .get(format!("{base}/v1/screenshot"))
        .query(&[("url", "http://example.com"), ("width", "5000")])
        .header(PROXY_SECRET_HEADER, SECRET)
        .header(TIER_HEADER, "mega")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers().get("x-screenshot-width").unwrap(),
        "3000"
    );
    assert_eq!(
        response.headers().get("x-ratelimit-limit").unwrap(),
        "50000"
    );
}

#[tokio::test]
async fn capture_failures_map_to_classified_statuses() {
    let base = spawn_server(
        StubCapturer::failing("net::ERR_CONNECTION_REFUSED at http://example.com/"),
        Some(SECRET),
    )
    .await;
    let response = client()
        .get(format!("{base}/v1/screenshot"))
        .query(&[("url", "http://example.com")])
        .header(PROXY_SECRET_HEADER, SECRET)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("error body");
    assert_eq!(body["error"]["code"], "CONNECTION_REFUSED");

    let base = spawn_server(
        StubCapturer::failing("Navigation timeout of 30000ms exceeded"),
        Some(SECRET),
    )
    .await;
    let response = client()
        .get(format!("{base}/v1/screenshot"))
        .query(&[("url", "http://example.com")])
        .header(PROXY_SECRET_HEADER, SECRET)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 504);
    let body: serde_json::Value = response.json().await.expect("error body");
    assert_eq!(body["error"]["code"], "TIMEOUT");
}
