//! Viewport normalization policy.
//!
//! Requested render dimensions are best-effort: unparsable or absent values
//! fall back to the default per axis, and everything is clamped into the
//! allowed range. There is deliberately no error path here - a capture
//! request never fails because of its viewport.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::tiers::TierLimits;

/// Smallest dimension the engine will render.
pub const MIN_DIMENSION: u32 = 200;
/// Largest dimension any tier may request.
pub const MAX_DIMENSION: u32 = 3000;
/// Default width when the caller does not supply a usable value.
pub const DEFAULT_WIDTH: u32 = 1366;
/// Default height when the caller does not supply a usable value.
pub const DEFAULT_HEIGHT: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Normalizes raw query values into a renderable viewport.
///
/// Each axis is parsed independently, falling back to the default on any
/// unparsable value, then clamped to `[MIN_DIMENSION, min(MAX_DIMENSION,
/// tier max)]` when tier limits are supplied.
pub fn normalize(
    raw_width: Option<&str>,
    raw_height: Option<&str>,
    limits: Option<&TierLimits>,
) -> Viewport {
    Viewport {
        width: clamp_axis(
            parse_axis(raw_width, DEFAULT_WIDTH),
            limits.map(|l| l.max_viewport_width),
        ),
        height: clamp_axis(
            parse_axis(raw_height, DEFAULT_HEIGHT),
            limits.map(|l| l.max_viewport_height),
        ),
    }
}

fn parse_axis(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn clamp_axis(value: u32, tier_max: Option<u32>) -> u32 {
    let max = tier_max
        .map_or(MAX_DIMENSION, |m| m.min(MAX_DIMENSION))
        .max(MIN_DIMENSION);
    value.clamp(MIN_DIMENSION, max)
}

#[derive(Debug, Error)]
pub enum ViewportParseError {
    #[error("Invalid viewport format: expected WIDTHxHEIGHT (e.g., 1366x768)")]
    InvalidFormat,
    #[error("Invalid width: {0}")]
    InvalidWidth(String),
    #[error("Invalid height: {0}")]
    InvalidHeight(String),
}

impl FromStr for Viewport {
    type Err = ViewportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            return Err(ViewportParseError::InvalidFormat);
        }

        let width: u32 = parts[0]
            .trim()
            .parse()
            .map_err(|_| ViewportParseError::InvalidWidth(parts[0].to_string()))?;

        let height: u32 = parts[1]
            .trim()
            .parse()
            .map_err(|_| ViewportParseError::InvalidHeight(parts[1].to_string()))?;

        Ok(Viewport { width, height })
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
