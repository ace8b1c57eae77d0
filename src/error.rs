use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CaptureFailure;

/// Service-level errors: configuration, I/O, and serialization faults that
/// are not per-request rejections.
#[derive(Debug, Error)]
pub enum ShotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ShotError>;

/// Stable codes for every way a capture request can be rejected or fail.
///
/// Validator codes are deterministic rejections; capture codes come out of
/// [`classify`] and are best-effort. All of them are recoverable per-request
/// outcomes, never fatal to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingInput,
    MalformedUrl,
    DisallowedScheme,
    BlockedHost,
    PrivateAddress,
    Timeout,
    DomainNotFound,
    ConnectionRefused,
    CaptureFailed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingInput => "MISSING_INPUT",
            ErrorCode::MalformedUrl => "MALFORMED_URL",
            ErrorCode::DisallowedScheme => "DISALLOWED_SCHEME",
            ErrorCode::BlockedHost => "BLOCKED_HOST",
            ErrorCode::PrivateAddress => "PRIVATE_ADDRESS",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::DomainNotFound => "DOMAIN_NOT_FOUND",
            ErrorCode::ConnectionRefused => "CONNECTION_REFUSED",
            ErrorCode::CaptureFailed => "CAPTURE_FAILED",
        }
    }

    /// The HTTP status the wire layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::MissingInput
            | ErrorCode::MalformedUrl
            | ErrorCode::DisallowedScheme
            | ErrorCode::BlockedHost
            | ErrorCode::PrivateAddress
            | ErrorCode::DomainNotFound
            | ErrorCode::ConnectionRefused => 400,
            ErrorCode::Timeout => 504,
            ErrorCode::CaptureFailed => 500,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered substring patterns for capture-failure classification. First
/// match wins. Both the Chromium `net::ERR_*` spellings and the Node-side
/// `E*`/getaddrinfo spellings appear because the helper surfaces either,
/// depending on where the failure happened.
const CLASSIFICATION_PATTERNS: [(&str, ErrorCode); 6] = [
    ("timeout", ErrorCode::Timeout),
    ("err_name_not_resolved", ErrorCode::DomainNotFound),
    ("enotfound", ErrorCode::DomainNotFound),
    ("getaddrinfo", ErrorCode::DomainNotFound),
    ("err_connection_refused", ErrorCode::ConnectionRefused),
    ("econnrefused", ErrorCode::ConnectionRefused),
];

/// Maps a capture failure onto the error taxonomy by inspecting its text.
///
/// Best-effort: the rendering engine reports failures as prose, not typed
/// categories, so this is approximate by construction.
pub fn classify(failure: &CaptureFailure) -> ErrorCode {
    let lower = failure.message.to_ascii_lowercase();
    for (pattern, code) in CLASSIFICATION_PATTERNS {
        if lower.contains(pattern) {
            return code;
        }
    }
    ErrorCode::CaptureFailed
}

/// Structured error body returned to callers. Carries a stable code and the
/// already-captured human-readable message; raw engine diagnostics never
/// travel further than this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_text(text: &str) -> ErrorCode {
        classify(&CaptureFailure::new(text))
    }

    #[test]
    fn timeout_messages_map_to_timeout() {
        assert_eq!(
            classify_text("Navigation timeout of 30000ms exceeded"),
            ErrorCode::Timeout
        );
        assert_eq!(
            classify_text("page.screenshot: Timeout 30000ms exceeded."),
            ErrorCode::Timeout
        );
    }

    #[test]
    fn resolution_failures_map_to_domain_not_found() {
        assert_eq!(
            classify_text("net::ERR_NAME_NOT_RESOLVED at http://no-such.example/"),
            ErrorCode::DomainNotFound
        );
        assert_eq!(
            classify_text("getaddrinfo ENOTFOUND no-such.example"),
            ErrorCode::DomainNotFound
        );
    }

    #[test]
    fn refused_connections_map_to_connection_refused() {
        assert_eq!(
            classify_text("net::ERR_CONNECTION_REFUSED at http://example.com/"),
            ErrorCode::ConnectionRefused
        );
        assert_eq!(
            classify_text("connect ECONNREFUSED 93.184.216.34:81"),
            ErrorCode::ConnectionRefused
        );
    }

    #[test]
    fn anything_else_is_capture_failed() {
        assert_eq!(classify_text("browser crashed"), ErrorCode::CaptureFailed);
        assert_eq!(classify_text(""), ErrorCode::CaptureFailed);
    }

    #[test]
    fn first_matching_pattern_wins() {
        // A timeout while resolving still reads as a timeout.
        assert_eq!(
            classify_text("Timeout 30000ms exceeded waiting for getaddrinfo"),
            ErrorCode::Timeout
        );
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(ErrorCode::Timeout.http_status(), 504);
        assert_eq!(ErrorCode::DomainNotFound.http_status(), 400);
        assert_eq!(ErrorCode::ConnectionRefused.http_status(), 400);
        assert_eq!(ErrorCode::CaptureFailed.http_status(), 500);
        assert_eq!(ErrorCode::PrivateAddress.http_status(), 400);
    }

    #[test]
    fn payload_serializes_with_stable_code() {
        let payload = ErrorPayload::new(ErrorCode::BlockedHost, "host 'localhost' is blocked");
        let json = serde_json::to_value(&payload).expect("serialize payload");
        assert_eq!(json["code"], "BLOCKED_HOST");
        assert_eq!(json["message"], "host 'localhost' is blocked");
    }
}
