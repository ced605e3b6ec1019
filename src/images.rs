// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Image retrieval: direct fetches through the [`ImageCache`] and keyword
//! searches against a Pixabay-compatible API.

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use image::GenericImageView;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::cache::ImageCache;
use crate::config::ImageSearchConfig;
use crate::error::{AppError, FetchError};
use crate::metrics::Metrics;
use crate::model::Image;

/// The provider rejects pages smaller than three; only the first hit is used.
const SEARCH_PAGE_SIZE: &str = "3";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[allow(dead_code)]
    total: u64,
    #[allow(dead_code)]
    #[serde(rename = "totalHits", alias = "total_hits")]
    total_hits: u64,
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "webformatURL", alias = "webformat_url")]
    webformat_url: Url,
}

/// Source of prefecture imagery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn fetch_image(&self, url: &Url) -> Result<Image, FetchError>;
    async fn search_image(&self, query: &str) -> Result<Image, FetchError>;
}

#[derive(Clone)]
pub struct ImageClient {
    search_base_url: String,
    api_key: String,
    client: Client,
    cache: ImageCache,
    metrics: Metrics,
}

impl ImageClient {
    pub fn try_new(
        config: ImageSearchConfig,
        cache: ImageCache,
        metrics: Metrics,
    ) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(anyhow!("Failed to build image client: {}", e)))?;

        Ok(Self {
            search_base_url: config.base_url,
            api_key: config.api_key,
            client,
            cache,
            metrics,
        })
    }

    fn search_url(&self, query: &str) -> Result<Url, FetchError> {
        let raw = format!("{}/api/", self.search_base_url.trim_end_matches('/'));
        let mut url = Url::parse(&raw).map_err(|_| FetchError::InvalidUrl(raw))?;

        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("q", query)
            .append_pair("lang", "ja")
            .append_pair("editors_choice", "true")
            .append_pair("image_type", "photo")
            .append_pair("orientation", "horizontal")
            .append_pair("per_page", SEARCH_PAGE_SIZE);

        Ok(url)
    }

    /// GET `url` and return the body with its content type.
    async fn download(&self, url: Url) -> Result<(Bytes, Option<String>), FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatusCode(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(FetchError::Network)?;

        Ok((body, content_type))
    }

    async fn fetch_uncached(&self, url: &Url) -> Result<Image, FetchError> {
        let (bytes, content_type) = self.download(url.clone()).await?;
        let image = decode_image(url.as_str(), bytes, content_type)?;

        self.cache.put(url.as_str().to_string(), image.clone()).await;
        Ok(image)
    }

    /// URL of the first search hit for `query`.
    async fn first_hit(&self, query: &str) -> Result<Url, FetchError> {
        let url = self.search_url(query)?;
        let (body, _) = self.download(url).await?;

        let response: SearchResponse =
            serde_json::from_slice(&body).map_err(FetchError::Decoding)?;
        response
            .hits
            .into_iter()
            .next()
            .map(|hit| hit.webformat_url)
            .ok_or(FetchError::NoImageFound)
    }
}

#[async_trait]
impl ImageService for ImageClient {
    async fn fetch_image(&self, url: &Url) -> Result<Image, FetchError> {
        if let Some(image) = self.cache.get(url.as_str()).await {
            self.metrics.record_image_cache_hit();
            return Ok(image);
        }
        self.metrics.record_image_cache_miss();

        let outcome = self.fetch_uncached(url).await;
        if let Err(error) = &outcome {
            self.metrics.record_image_failure();
            tracing::debug!(%error, url = %url, "image fetch failed");
        }
        outcome
    }

    async fn search_image(&self, query: &str) -> Result<Image, FetchError> {
        self.metrics.record_image_search();

        let hit = match self.first_hit(query).await {
            Ok(hit) => hit,
            Err(error) => {
                self.metrics.record_image_failure();
                tracing::debug!(%error, query, "image search failed");
                return Err(error);
            }
        };

        self.fetch_image(&hit).await
    }
}

fn decode_image(
    source_url: &str,
    bytes: Bytes,
    content_type: Option<String>,
) -> Result<Image, FetchError> {
    let decoded = image::load_from_memory(&bytes).map_err(|_| FetchError::DataConversion)?;
    let (width, height) = decoded.dimensions();

    let content_type = content_type
        .filter(|value| value.starts_with("image/"))
        .or_else(|| {
            image::guess_format(&bytes)
                .ok()
                .and_then(|format| format.extensions_str().first().copied())
                .map(|ext| format!("image/{ext}"))
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(Image {
        source_url: source_url.to_string(),
        content_type,
        width,
        height,
        bytes,
    })
}
