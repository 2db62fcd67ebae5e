//! Client configuration.
//!
//! Defaults point at a local booking server. `from_env` layers environment
//! overrides on top; values that fail to parse are ignored.

use std::time::Duration;

use crate::protocol;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub host: String,
    /// Base path prepended to every endpoint.
    pub path: String,
    pub user_id: Option<String>,
    pub session_token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: protocol::DEFAULT_HOST.to_string(),
            path: protocol::DEFAULT_PATH.to_string(),
            user_id: None,
            session_token: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("booked-client/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `BOOKED_*` environment variables and
    /// `USER_ID_KEY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("BOOKED_HOST") {
            if !host.is_empty() {
                self.host = host;
            }
        }

        if let Ok(path) = std::env::var("BOOKED_PATH") {
            self.path = path;
        }

        if let Ok(timeout) = std::env::var("BOOKED_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(max) = std::env::var("BOOKED_MAX_ATTEMPTS") {
            if let Ok(n) = max.parse::<u32>() {
                self.retry.max_attempts = n.max(1);
            }
        }

        if let Ok(user_id) = std::env::var("USER_ID_KEY") {
            if !user_id.is_empty() {
                self.user_id = Some(user_id);
            }
        }

        if let Ok(token) = std::env::var("BOOKED_SESSION_TOKEN") {
            if !token.is_empty() {
                self.session_token = Some(token);
            }
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Join host, base path and an endpoint uri into a full URL.
    pub fn url_for(&self, uri: &str) -> String {
        let host = self.host.trim_end_matches('/');
        let path = self.path.trim_matches('/');
        let uri = uri.trim_start_matches('/');
        if path.is_empty() {
            format!("{host}/{uri}")
        } else {
            format!("{host}/{path}/{uri}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "http://localhost:8011");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_id.is_none());
        assert!(config.user_agent.starts_with("booked-client/"));
    }

    #[test]
    fn url_joins_host_path_and_uri() {
        let config = ClientConfig::new("http://localhost:3000/");
        assert_eq!(
            config.url_for("/classes/Room"),
            "http://localhost:3000/booked/Web/Services/index.php/classes/Room"
        );
        let bare = ClientConfig::new("http://h").with_path("");
        assert_eq!(bare.url_for("Resources/Status"), "http://h/Resources/Status");
    }

    #[test]
    fn builder_setters() {
        let config = ClientConfig::new("http://h")
            .with_user_id("7")
            .with_session_token("tok")
            .with_timeout(Duration::from_secs(2));
        assert_eq!(config.user_id.as_deref(), Some("7"));
        assert_eq!(config.session_token.as_deref(), Some("tok"));
        assert_eq!(config.timeout, Duration::from_secs(2));
    }
}
