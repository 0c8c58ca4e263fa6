//! Frontend configuration module
//!
//! Values are baked in at compile time from `PAYDESK_*` environment variables
//! so the bundle needs no runtime configuration fetch.

use std::time::Duration;

use shared::auth::{LOGIN_PATH, path_is_under};
use tracing::level_filters::LevelFilter;

/// Default revalidation period while a credential is held.
pub const DEFAULT_REVALIDATE_EVERY: Duration = Duration::from_secs(15 * 60);

/// What to do when the validation endpoint answers that a session is no
/// longer valid. Network failures never reach this decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidSessionPolicy {
    /// Keep the local session and log a warning.
    #[default]
    Retain,
    /// Clear the local session as if the user had logged out.
    Logout,
}

impl InvalidSessionPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "retain" | "keep" => Some(Self::Retain),
            "logout" | "clear" => Some(Self::Logout),
            _ => None,
        }
    }
}

/// Frontend configuration for the API and session handling.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontendConfig {
    /// Base URL for backend calls, without a trailing slash.
    pub api_base_url: String,
    pub revalidate_every: Duration,
    pub login_path: String,
    /// Storage key for the raw credential.
    pub token_key: String,
    /// Storage key for the JSON user record.
    pub user_key: String,
    pub invalid_session_policy: InvalidSessionPolicy,
    pub log_level: LevelFilter,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self::from_values(
            option_env!("PAYDESK_API_BASE_URL"),
            option_env!("PAYDESK_REVALIDATE_SECS"),
            option_env!("PAYDESK_INVALID_SESSION_POLICY"),
            option_env!("PAYDESK_WEB_LOG_LEVEL"),
        )
    }
}

impl FrontendConfig {
    /// Create a new frontend configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the configuration from optional raw values. Anything missing or
    /// unparseable falls back to its default.
    pub fn from_values(
        api_base_url: Option<&str>,
        revalidate_secs: Option<&str>,
        invalid_session_policy: Option<&str>,
        log_level: Option<&str>,
    ) -> Self {
        let api_base_url = api_base_url
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or("/api")
            .to_string();

        let revalidate_every = revalidate_secs
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_REVALIDATE_EVERY, Duration::from_secs);

        Self {
            api_base_url,
            revalidate_every,
            login_path: LOGIN_PATH.to_string(),
            token_key: "auth_token".to_string(),
            user_key: "auth_user".to_string(),
            invalid_session_policy: invalid_session_policy
                .and_then(InvalidSessionPolicy::parse)
                .unwrap_or_default(),
            log_level: log_level
                .and_then(|level| level.parse::<LevelFilter>().ok())
                .unwrap_or(LevelFilter::INFO),
        }
    }

    /// Whether `path` is the login surface or below it.
    pub fn is_login_path(&self, path: &str) -> bool {
        path_is_under(path, &self.login_path)
    }
}
