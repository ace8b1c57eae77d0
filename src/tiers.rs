//! Subscription tier limits.
//!
//! A static table keyed by tier name. The HTTP layer looks the tier up from
//! a caller-identification header; everything downstream only sees the
//! resolved [`TierLimits`]. Read-only after process start.

/// Per-tier resource bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    /// Requests allowed per billing period, surfaced to callers as a
    /// rate-limit informational header. Enforcement lives upstream.
    pub max_requests_per_period: u32,
    pub max_viewport_width: u32,
    pub max_viewport_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Basic,
    Pro,
    Ultra,
    Mega,
}

const BASIC_LIMITS: TierLimits = TierLimits {
    max_requests_per_period: 250,
    max_viewport_width: 1920,
    max_viewport_height: 1080,
};

const PRO_LIMITS: TierLimits = TierLimits {
    max_requests_per_period: 2_500,
    max_viewport_width: 2560,
    max_viewport_height: 1440,
};

const ULTRA_LIMITS: TierLimits = TierLimits {
    max_requests_per_period: 10_000,
    max_viewport_width: 3000,
    max_viewport_height: 3000,
};

const MEGA_LIMITS: TierLimits = TierLimits {
    max_requests_per_period: 50_000,
    max_viewport_width: 3000,
    max_viewport_height: 3000,
};

impl Tier {
    /// Resolves a tier name from a request header. Unrecognized names fall
    /// back to `Basic` rather than failing the request.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "PRO" => Tier::Pro,
            "ULTRA" => Tier::Ultra,
            "MEGA" => Tier::Mega,
            _ => Tier::Basic,
        }
    }

    pub fn limits(self) -> &'static TierLimits {
        match self {
            Tier::Basic => &BASIC_LIMITS,
            Tier::Pro => &PRO_LIMITS,
            Tier::Ultra => &ULTRA_LIMITS,
            Tier::Mega => &MEGA_LIMITS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Basic => "BASIC",
            Tier::Pro => "PRO",
            Tier::Ultra => "ULTRA",
            Tier::Mega => "MEGA",
        }
    }
}
