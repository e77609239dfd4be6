//! WebSocket configuration.
//!
//! Provides the push endpoint base URL and optional auth token.

use url::Url;

use super::error::WsError;
use super::messages::Channel;

/// Default WebSocket base URL.
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000";

/// WebSocket configuration.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Base URL; channel paths are appended to it.
    pub url: String,

    /// Optional auth token, sent as the `token` query parameter.
    pub token: Option<String>,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            token: None,
        }
    }
}

impl WsConfig {
    /// Creates a new configuration with the given base URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Sets the auth token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Returns the connection URL for a channel, with the token appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse.
    pub fn channel_url(&self, channel: Channel) -> Result<String, WsError> {
        let mut url = Url::parse(&format!("{}{}", self.url, channel.ws_path()))
            .map_err(|e| WsError::InvalidConfig(e.to_string()))?;

        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("token", token);
        }

        Ok(url.into())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), WsError> {
        if self.url.is_empty() {
            return Err(WsError::InvalidConfig("url cannot be empty".to_string()));
        }

        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(WsError::InvalidConfig(
                "url must start with ws:// or wss://".to_string(),
            ));
        }

        Url::parse(&self.url).map_err(|e| WsError::InvalidConfig(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = WsConfig::default();
        assert_eq!(config.url, DEFAULT_WS_URL);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_channel_url_without_token() {
        let config = WsConfig::new("ws://localhost:8000/");
        assert_eq!(
            config.channel_url(Channel::Foreign).expect("url"),
            "ws://localhost:8000/ws/foreign"
        );
    }

    #[test]
    fn test_channel_url_encodes_token() {
        let config = WsConfig::new("wss://board.example.com").with_token("a b&c");
        assert_eq!(
            config.channel_url(Channel::Alerts).expect("url"),
            "wss://board.example.com/ws/alerts?token=a+b%26c"
        );
    }

    #[test]
    fn test_channel_url_ignores_empty_token() {
        let config = WsConfig::new("ws://localhost:8000").with_token("");
        assert_eq!(
            config.channel_url(Channel::Market).expect("url"),
            "ws://localhost:8000/ws/market"
        );
    }

    #[test]
    fn test_config_validate() {
        assert!(WsConfig::new("ws://localhost:8000").validate().is_ok());
        assert!(WsConfig::new("").validate().is_err());
        assert!(WsConfig::new("http://localhost:8000").validate().is_err());
    }
}
