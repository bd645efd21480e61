//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

/// Coach core configuration.
#[derive(Debug, Clone)]
pub struct CoachConfig {
    /// Base URL of the backend API (no trailing slash needed).
    pub base_url: String,
    /// Optional bearer token sent with every backend request.
    pub api_token: Option<SecretString>,
    /// Timeout for chat, review, commit, and store calls.
    pub request_timeout: Duration,
    /// Timeout for roadmap generation (the slowest call by far).
    pub generation_timeout: Duration,
    /// Whether completing a mission synthesizes the follow-up coach turn.
    pub auto_advance: bool,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/v1".to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(120),
            auto_advance: true,
        }
    }
}

impl CoachConfig {
    /// Build a config from `GROW_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("GROW_API_BASE_URL").unwrap_or(defaults.base_url),
            api_token: std::env::var("GROW_API_TOKEN").ok().map(SecretString::from),
            request_timeout: env_secs("GROW_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout),
            generation_timeout: env_secs("GROW_GENERATION_TIMEOUT_SECS")
                .unwrap_or(defaults.generation_timeout),
            auto_advance: std::env::var("GROW_AUTO_ADVANCE")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(defaults.auto_advance),
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key).ok()?.parse().ok().map(Duration::from_secs)
}
