//! Configuration
//!
//! Both configs can be read from `HK_*` environment variables. Malformed
//! values fall back to the defaults.

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_PER_PAGE: u32 = 15;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the remote task service
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL, without the trailing `/tasks`
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: lookup("HK_API_URL")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.base_url),
            token: lookup("HK_API_TOKEN")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            request_timeout: secs(&lookup, "HK_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout),
        }
    }
}

/// Settings for a task list session
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub per_page: u32,
    /// Upper bound on the remote call inside one mutation
    pub mutation_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            mutation_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            per_page: lookup("HK_PER_PAGE")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.per_page),
            mutation_timeout: secs(&lookup, "HK_MUTATION_TIMEOUT_SECS")
                .unwrap_or(defaults.mutation_timeout),
            fetch_timeout: secs(&lookup, "HK_FETCH_TIMEOUT_SECS").unwrap_or(defaults.fetch_timeout),
        }
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<Duration> {
    lookup(name)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .map(Duration::from_secs)
}
