// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Fortune service client.
//!
//! Posts a profile snapshot to `/my_fortune` and decodes the prefecture the
//! service assigns for the day.

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use tokio::time::Instant;
use url::Url;

use crate::codec::{self, FortuneRequest};
use crate::config::FortuneApiConfig;
use crate::error::{AppError, FetchError};
use crate::metrics::Metrics;
use crate::model::FortuneResult;

const API_VERSION_HEADER: &str = "API-Version";

/// Source of daily fortunes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FortuneApi: Send + Sync {
    async fn post_fortune(&self, request: &FortuneRequest) -> Result<FortuneResult, FetchError>;
}

/// HTTP client wrapper for the remote fortune service.
#[derive(Clone)]
pub struct FortuneClient {
    base_url: String,
    api_version: HeaderValue,
    client: Client,
    metrics: Metrics,
}

impl FortuneClient {
    /// Construct a new fortune client using the provided configuration.
    pub fn try_new(config: FortuneApiConfig, metrics: Metrics) -> Result<Self, AppError> {
        let api_version = HeaderValue::from_str(&config.api_version).map_err(|e| {
            AppError::Internal(anyhow!(
                "Invalid API-Version {:?}: {}",
                config.api_version,
                e
            ))
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(anyhow!("Failed to build fortune client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url,
            api_version,
            client,
            metrics,
        })
    }

    fn endpoint(&self) -> Result<Url, FetchError> {
        let raw = format!("{}/my_fortune", self.base_url.trim_end_matches('/'));
        Url::parse(&raw).map_err(|_| FetchError::InvalidUrl(raw))
    }

    async fn send(&self, request: &FortuneRequest) -> Result<FortuneResult, FetchError> {
        let url = self.endpoint()?;
        let body = request.to_bytes()?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(API_VERSION_HEADER, self.api_version.clone())
            .body(body)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatusCode(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        codec::decode_result(&body)
    }
}

#[async_trait]
impl FortuneApi for FortuneClient {
    async fn post_fortune(&self, request: &FortuneRequest) -> Result<FortuneResult, FetchError> {
        let start = Instant::now();
        let outcome = self.send(request).await;
        self.metrics
            .record_fortune_request(start.elapsed().as_secs_f64(), outcome.is_ok());

        match &outcome {
            Ok(result) => {
                tracing::debug!(prefecture = %result.prefecture.name, "fortune service answered")
            }
            Err(error) => tracing::warn!(%error, "fortune request failed"),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_version: &str) -> FortuneApiConfig {
        FortuneApiConfig {
            base_url: "https://fortune.example.com".to_string(),
            api_version: api_version.to_string(),
            timeout: None,
        }
    }

    #[test]
    fn unusable_api_version_is_rejected_at_construction() {
        let result = FortuneClient::try_new(
            config("v1\r\nX-Injected: 1"),
            Metrics::new().unwrap(),
        );
        assert!(matches!(result, Err(AppError::Internal(_))));

        let client = FortuneClient::try_new(config("v1"), Metrics::new().unwrap()).unwrap();
        assert_eq!(client.api_version, "v1");
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let mut with_slash = config("v1");
        with_slash.base_url = "https://fortune.example.com/".to_string();
        let client = FortuneClient::try_new(with_slash, Metrics::new().unwrap()).unwrap();

        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "https://fortune.example.com/my_fortune"
        );
    }
}
