//! Service configuration.
//!
//! Built exactly once at startup and passed by reference from there on; the
//! validator and orchestrator never read ambient process state. The proxy
//! secret only ever enters through [`ProxyAuth::from_env`] in `main` - it
//! cannot be set from a config file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::capture::CaptureBudgets;
use crate::error::ShotError;

/// Environment variable holding the shared proxy-validation secret.
pub const PROXY_SECRET_ENV: &str = "URLSHOT_PROXY_SECRET";

/// Environment variable holding the host callers are expected to address.
pub const EXPECTED_HOST_ENV: &str = "URLSHOT_EXPECTED_HOST";

/// Caller-identification material, read from the environment once at
/// startup. A missing secret is not fatal here - the HTTP layer answers
/// every capture request with a 500-class error instead.
#[derive(Debug, Clone, Default)]
pub struct ProxyAuth {
    pub secret: Option<String>,
    pub expected_host: Option<String>,
}

impl ProxyAuth {
    pub fn from_env() -> Self {
        Self {
            secret: non_empty_env(PROXY_SECRET_ENV),
            expected_host: non_empty_env(EXPECTED_HOST_ENV),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServiceConfig {
    /// Interface the HTTP server binds to.
    pub bind: String,
    pub port: u16,
    /// The Node.js command used to spawn rendering helpers.
    pub node_command: String,
    /// Per-phase capture deadlines.
    pub budgets: CaptureBudgets,
    #[serde(skip)]
    pub auth: ProxyAuth,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            node_command: "node".to_string(),
            budgets: CaptureBudgets::default(),
            auth: ProxyAuth::default(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from an optional TOML file, falling back to
    /// defaults when no path is given.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ShotError::Config(format!("Failed to read config {}: {}", path.display(), err))
        })?;
        toml::from_str(&raw).map_err(|err| {
            ShotError::Config(format!("Invalid config {}: {}", path.display(), err))
        })
    }
}
