use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const BASE_URL_ENV: &str = "PLANNER_API_URL";

/// Connection and session-expiry settings for `PlannerApi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Applied uniformly to every call.
    pub timeout: Duration,
    /// Where to send the user when the session expires.
    pub login_path: String,
    /// Turned off under test harnesses, which have no page to leave.
    pub redirect_on_expiry: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            login_path: "/login".to_string(),
            redirect_on_expiry: true,
        }
    }
}

impl ClientConfig {
    /// Defaults, with the base URL taken from `PLANNER_API_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = std::env::var(BASE_URL_ENV).ok().filter(|u| !u.trim().is_empty()) {
            config.base_url = url;
        }
        config
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.login_path, "/login");
        assert!(config.redirect_on_expiry);
    }
}
