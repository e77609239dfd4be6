//! Monitor configuration.
//!
//! Loaded from `TICKERBOARD_*` environment variables with defaults for a
//! backend on localhost.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tickerboard_sdk::{ClientConfig, WsConfig};

use crate::subscription::SubscriptionOptions;

/// Backend REST base URL variable.
pub const ENV_API_URL: &str = "TICKERBOARD_API_URL";
/// Push endpoint variable.
pub const ENV_WS_URL: &str = "TICKERBOARD_WS_URL";
/// Push token variable.
pub const ENV_WS_TOKEN: &str = "TICKERBOARD_WS_TOKEN";
/// Candle symbol variable.
pub const ENV_SYMBOL: &str = "TICKERBOARD_SYMBOL";
/// Alert sound toggle variable.
pub const ENV_ALERT_SOUND: &str = "TICKERBOARD_ALERT_SOUND";

/// Configuration for the `tickerboard-monitor` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// REST base URL, including the `/api` prefix.
    pub api_url: String,

    /// Push endpoint base URL.
    pub ws_url: String,

    /// Optional push token.
    pub ws_token: Option<String>,

    /// Symbol whose live candles are built.
    pub symbol: String,

    /// Ring the terminal bell on critical alerts.
    pub alert_sound: bool,

    /// Market channel fallback interval in milliseconds.
    pub market_fallback_ms: u64,

    /// Foreign and alerts channel fallback interval in milliseconds.
    pub fallback_interval_ms: u64,

    /// Consecutive push failures before polling.
    pub max_reconnect_attempts: u32,

    /// Foreign detail and basis trend poll interval in milliseconds.
    pub detail_poll_ms: u64,

    /// Basis trend window in minutes.
    pub basis_trend_minutes: u32,

    /// Status report interval in milliseconds.
    pub report_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/api".to_string(),
            ws_url: "ws://127.0.0.1:8000".to_string(),
            ws_token: None,
            symbol: "VN30F1M".to_string(),
            alert_sound: false,
            market_fallback_ms: 3_000,
            fallback_interval_ms: 5_000,
            max_reconnect_attempts: 3,
            detail_poll_ms: 10_000,
            basis_trend_minutes: 30,
            report_interval_ms: 15_000,
        }
    }
}

impl MonitorConfig {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unparsable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(url) = lookup(ENV_WS_URL) {
            config.ws_url = url;
        }
        config.ws_token = lookup(ENV_WS_TOKEN).filter(|token| !token.is_empty());
        if let Some(symbol) = lookup(ENV_SYMBOL) {
            config.symbol = symbol.trim().to_uppercase();
        }
        if let Some(value) = lookup(ENV_ALERT_SOUND) {
            config.alert_sound = parse_flag(ENV_ALERT_SOUND, &value)?;
        }
        Ok(config)
    }

    /// Sets the push token.
    #[must_use]
    pub fn with_ws_token(mut self, token: impl Into<String>) -> Self {
        self.ws_token = Some(token.into());
        self
    }

    /// Sets the candle symbol.
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Sets the fallback intervals.
    #[must_use]
    pub fn with_fallback_intervals(mut self, market_ms: u64, other_ms: u64) -> Self {
        self.market_fallback_ms = market_ms;
        self.fallback_interval_ms = other_ms;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.api_url.clone()));
        }
        if !(self.ws_url.starts_with("ws://") || self.ws_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(self.ws_url.clone()));
        }
        if self.symbol.is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.market_fallback_ms == 0
            || self.fallback_interval_ms == 0
            || self.detail_poll_ms == 0
            || self.report_interval_ms == 0
        {
            return Err(ConfigError::InvalidInterval);
        }
        if self.max_reconnect_attempts == 0 {
            return Err(ConfigError::InvalidReconnectAttempts);
        }
        Ok(())
    }

    /// Returns the REST client configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.api_url)
    }

    /// Returns the push configuration.
    #[must_use]
    pub fn ws_config(&self) -> WsConfig {
        let config = WsConfig::new(&self.ws_url);
        match &self.ws_token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        }
    }

    /// Returns subscription options with the configured reconnect policy and
    /// fallback interval.
    #[must_use]
    pub fn subscription_options<T>(&self, fallback_ms: u64) -> SubscriptionOptions<T> {
        SubscriptionOptions::new()
            .with_max_reconnect_attempts(self.max_reconnect_attempts)
            .with_fallback_interval(Duration::from_millis(fallback_ms))
    }

    /// Returns the detail poll interval.
    #[must_use]
    pub fn detail_poll_interval(&self) -> Duration {
        Duration::from_millis(self.detail_poll_ms)
    }

    /// Returns the status report interval.
    #[must_use]
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// URL with an unsupported scheme.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Empty candle symbol.
    #[error("symbol must not be empty")]
    EmptySymbol,

    /// Zero interval.
    #[error("intervals must be > 0")]
    InvalidInterval,

    /// Zero reconnect attempts.
    #[error("max_reconnect_attempts must be > 0")]
    InvalidReconnectAttempts,

    /// Unparsable environment value.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tickerboard_sdk::Channel;
    use tokio_test::{assert_err, assert_ok};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.api_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.market_fallback_ms, 3_000);
        assert_eq!(config.fallback_interval_ms, 5_000);
        assert!(!config.alert_sound);
        assert_ok!(config.validate());
    }

    #[test]
    fn test_from_lookup() {
        let config = MonitorConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://board.example/api"),
            (ENV_WS_URL, "wss://board.example"),
            (ENV_WS_TOKEN, "t0k"),
            (ENV_SYMBOL, " fpt "),
            (ENV_ALERT_SOUND, "on"),
        ]))
        .expect("config");

        assert_eq!(config.api_url, "https://board.example/api");
        assert_eq!(config.symbol, "FPT");
        assert!(config.alert_sound);
        assert_eq!(
            config.ws_config().channel_url(Channel::Foreign).expect("url"),
            "wss://board.example/ws/foreign?token=t0k"
        );
    }

    #[test]
    fn test_empty_token_ignored() {
        let config = MonitorConfig::from_lookup(lookup(&[(ENV_WS_TOKEN, "")])).expect("config");
        assert!(config.ws_token.is_none());
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let result = MonitorConfig::from_lookup(lookup(&[(ENV_ALERT_SOUND, "loud")]));
        assert_eq!(
            result.err(),
            Some(ConfigError::InvalidValue {
                key: ENV_ALERT_SOUND.to_string(),
                value: "loud".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = MonitorConfig {
            ws_url: "http://127.0.0.1:8000".to_string(),
            ..Default::default()
        };
        assert_err!(config.validate());

        let config = MonitorConfig::default().with_fallback_intervals(0, 5_000);
        assert_eq!(config.validate(), Err(ConfigError::InvalidInterval));

        let config = MonitorConfig::default().with_symbol("");
        assert_eq!(config.validate(), Err(ConfigError::EmptySymbol));
    }

    #[test]
    fn test_subscription_options() {
        let config = MonitorConfig::default();
        let options = config.subscription_options::<u32>(config.market_fallback_ms);
        assert_eq!(options.fallback_interval, Duration::from_secs(3));
        assert_eq!(options.max_reconnect_attempts, 3);
        assert!(options.fallback.is_none());
    }
}
