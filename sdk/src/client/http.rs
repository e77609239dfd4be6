//! HTTP client implementation.
//!
//! Provides the main HTTP client for the Tickerboard REST API.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::config::ClientConfig;
use super::error::ClientError;
use crate::types::{
    Alert, BasisPoint, CandleData, DerivativesHistory, ForeignDetailResponse, IndexCandleData,
    MarketSnapshot, VolumeStatsResponse, Vn30Components,
};

/// HTTP client for the Tickerboard REST API.
#[derive(Debug, Clone)]
pub struct MarketClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl MarketClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(&config.user_agent)
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self { config, http })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, ClientError> {
        Self::new(ClientConfig::default())
    }

    /// Creates a new client with the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(base_url))
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Makes a GET request to a path relative to the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not decode.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.config.base_url, path);
        self.request_with_retry(path, || self.http.get(&url)).await
    }

    /// Makes a request with retry logic.
    ///
    /// Timeouts and 429 responses are retried up to `max_retries` times; every
    /// other failure is returned immediately.
    async fn request_with_retry<T, F>(&self, path: &str, request_fn: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = None;
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            let response = request_fn().send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let body = resp
                            .text()
                            .await
                            .map_err(|e| ClientError::Deserialization(e.to_string()))?;

                        return serde_json::from_str(&body)
                            .map_err(|e| ClientError::Deserialization(e.to_string()));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse().ok());

                        if retry_count < self.config.max_retries {
                            let wait_time = retry_after.unwrap_or(1);
                            debug!(path, wait_time, "rate limited, backing off");
                            tokio::time::sleep(Duration::from_secs(wait_time)).await;
                            retry_count += 1;
                            continue;
                        }

                        return Err(ClientError::RateLimited { retry_after });
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(ClientError::Unauthorized);
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ClientError::NotFound(path.to_string()));
                    }

                    let reason = status.canonical_reason().unwrap_or_default().to_string();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(ClientError::Api {
                        status: status.as_u16(),
                        message: if body.is_empty() { reason } else { body },
                    });
                }
                Err(e) => {
                    if e.is_timeout() && retry_count < self.config.max_retries {
                        retry_count += 1;
                        tokio::time::sleep(Duration::from_millis(100 * (1 << retry_count))).await;
                        last_error = Some(ClientError::from(e));
                        continue;
                    }
                    return Err(ClientError::from(e));
                }
            }
        }

        Err(last_error.unwrap_or(ClientError::Timeout))
    }

    /// Gets the unified market snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_snapshot(&self) -> Result<MarketSnapshot, ClientError> {
        self.get("/market/snapshot").await
    }

    /// Gets the foreign flow summary and per-symbol breakdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_foreign_detail(&self) -> Result<ForeignDetailResponse, ClientError> {
        self.get("/market/foreign-detail").await
    }

    /// Gets per-symbol session volume statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_volume_stats(&self) -> Result<VolumeStatsResponse, ClientError> {
        self.get("/market/volume-stats").await
    }

    /// Gets recent alerts, newest first.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of alerts (the backend caps this at 200)
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_alerts(&self, limit: u32) -> Result<Vec<Alert>, ClientError> {
        self.get(&format!("/market/alerts?limit={}", limit)).await
    }

    /// Gets the futures basis trend.
    ///
    /// # Arguments
    ///
    /// * `minutes` - Lookback window in minutes
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_basis_trend(&self, minutes: u32) -> Result<Vec<BasisPoint>, ClientError> {
        self.get(&format!("/market/basis-trend?minutes={}", minutes))
            .await
    }

    /// Gets one-minute candles for a stock symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_candles(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CandleData>, ClientError> {
        self.get(&format!(
            "/history/{}/candles?start={}&end={}",
            symbol, start, end
        ))
        .await
    }

    /// Gets one-minute candles for an index.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_index_candles(
        &self,
        index_name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexCandleData>, ClientError> {
        self.get(&format!(
            "/history/index/{}/candles?start={}&end={}",
            index_name, start, end
        ))
        .await
    }

    /// Gets history for a futures contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_derivatives_history(
        &self,
        contract: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DerivativesHistory>, ClientError> {
        self.get(&format!(
            "/history/derivatives/{}?start={}&end={}",
            contract, start, end
        ))
        .await
    }

    /// Gets the VN30 constituent symbols.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_vn30_components(&self) -> Result<Vec<String>, ClientError> {
        let response: Vn30Components = self.get("/vn30-components").await?;
        Ok(response.symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let config = ClientConfig::new("http://localhost:8000/api");
        let client = MarketClient::new(config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_defaults() {
        let client = MarketClient::with_defaults();
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_invalid_config() {
        let config = ClientConfig::new("");
        let client = MarketClient::new(config);
        assert!(client.is_err());
    }

    #[test]
    fn test_client_config_access() {
        let client = MarketClient::with_base_url("http://localhost:8000/api/").expect("client");
        assert_eq!(client.config().base_url, "http://localhost:8000/api");
    }

    #[tokio::test]
    async fn test_client_unreachable_host_errors() {
        let config = ClientConfig::new("http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(200))
            .with_max_retries(0);
        let client = MarketClient::new(config).expect("client");

        tokio_test::assert_err!(client.get_snapshot().await);
    }
}
