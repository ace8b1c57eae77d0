//! URL safety validation for outbound capture targets.
//!
//! The validator is the only defense between an attacker-supplied URL and
//! the headless browser: it rejects anything that is not plain `http`/`https`
//! and anything whose literal hostname points at loopback, private, or
//! link-local address space. Classification is purely textual - no DNS
//! resolution happens here, so a public hostname that resolves to a private
//! address at connect time is not caught (see DESIGN.md).

use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use url::{Host, Url};

use crate::error::ErrorCode;

/// Hostnames rejected outright, before any address-range classification.
const BLOCKED_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "::1", "[::1]"];

/// Scheme of a validated URL. Only plain web schemes survive validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// A URL that passed safety validation.
///
/// Only [`validate`] constructs these; the capture pipeline treats the
/// contained href as trusted from here on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl {
    href: String,
    scheme: Scheme,
    host: String,
}

impl ValidatedUrl {
    /// The normalized absolute URL the engine will navigate to.
    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The lowercased hostname (bracketed for IPv6 literals).
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Why a raw URL was rejected. All variants are deterministic, recoverable
/// rejections of a single request, never fatal.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing url parameter")]
    MissingInput,

    #[error("invalid url: {0}")]
    MalformedUrl(#[from] url::ParseError),

    #[error("scheme '{0}' is not allowed; only http and https can be captured")]
    DisallowedScheme(String),

    #[error("host '{0}' is blocked")]
    BlockedHost(String),

    #[error("host '{0}' is within a private or reserved address range")]
    PrivateAddress(String),
}

impl ValidationError {
    /// Stable wire code for this rejection.
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::MissingInput => ErrorCode::MissingInput,
            ValidationError::MalformedUrl(_) => ErrorCode::MalformedUrl,
            ValidationError::DisallowedScheme(_) => ErrorCode::DisallowedScheme,
            ValidationError::BlockedHost(_) => ErrorCode::BlockedHost,
            ValidationError::PrivateAddress(_) => ErrorCode::PrivateAddress,
        }
    }
}

/// Validates a raw, untrusted URL string for outbound capture.
///
/// Pure and total: no I/O, no DNS. Returns the normalized href plus the
/// scheme and hostname classification that were actually checked.
pub fn validate(raw: Option<&str>) -> Result<ValidatedUrl, ValidationError> {
    let raw = raw.ok_or(ValidationError::MissingInput)?;
    let parsed = Url::parse(raw)?;

    let scheme = match parsed.scheme() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        other => return Err(ValidationError::DisallowedScheme(other.to_string())),
    };

    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or(url::ParseError::EmptyHost)?;

    if BLOCKED_HOSTS.contains(&host.as_str()) {
        return Err(ValidationError::BlockedHost(host));
    }

    match parsed.host() {
        Some(Host::Ipv4(addr)) if is_private_ipv4(addr) => {
            return Err(ValidationError::PrivateAddress(host));
        }
        Some(Host::Ipv6(addr)) if is_private_ipv6(addr) => {
            return Err(ValidationError::PrivateAddress(host));
        }
        _ => {}
    }

    Ok(ValidatedUrl {
        href: parsed.to_string(),
        scheme,
        host,
    })
}

/// Literal-address check against 10/8, 172.16/12, 192.168/16, 169.254/16
/// and 127/8. Runs only on addresses the URL parser recognized as IPv4
/// literals, never on resolved names.
fn is_private_ipv4(addr: Ipv4Addr) -> bool {
    let octets = addr.octets();
    match octets[0] {
        10 | 127 => true,
        172 => (16..=31).contains(&octets[1]),
        192 => octets[1] == 168,
        169 => octets[1] == 254,
        _ => false,
    }
}

/// Loopback, link-local (fe80::/10) and unique-local (fc00::/7) literals.
fn is_private_ipv6(addr: Ipv6Addr) -> bool {
    let head = addr.segments()[0];
    addr.is_loopback() || (head & 0xffc0) == 0xfe80 || (head & 0xfe00) == 0xfc00
}
