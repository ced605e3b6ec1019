// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics for fortune runs and image retrieval.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

use crate::error::AppError;

fn metric_error(e: prometheus::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("Failed to create metric: {}", e))
}

/// Metrics collector shared by the clients and the HTTP layer
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,

    // Fortune service metrics
    pub fortune_requests: IntCounter,
    pub fortune_failures: IntCounter,
    pub fortune_latency: Histogram,

    // Image metrics
    pub image_cache_hits: IntCounter,
    pub image_cache_misses: IntCounter,
    pub image_fetch_failures: IntCounter,
    pub image_searches: IntCounter,

    pub profiles: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new();

        let fortune_requests = IntCounter::with_opts(Opts::new(
            "fortune_requests_total",
            "Total number of fortune service requests",
        ))
        .map_err(metric_error)?;

        let fortune_failures = IntCounter::with_opts(Opts::new(
            "fortune_failures_total",
            "Total number of fortune service requests that resulted in an error",
        ))
        .map_err(metric_error)?;

        let fortune_latency = Histogram::with_opts(
            HistogramOpts::new(
                "fortune_latency_seconds",
                "Duration of fortune service requests in seconds",
            )
            .buckets(vec![
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.0, 5.0,
            ]),
        )
        .map_err(metric_error)?;

        let image_cache_hits = IntCounter::with_opts(Opts::new(
            "fortune_image_cache_hits_total",
            "Total number of image fetches served from the cache",
        ))
        .map_err(metric_error)?;

        let image_cache_misses = IntCounter::with_opts(Opts::new(
            "fortune_image_cache_misses_total",
            "Total number of image fetches that went to the network",
        ))
        .map_err(metric_error)?;

        let image_fetch_failures = IntCounter::with_opts(Opts::new(
            "fortune_image_fetch_failures_total",
            "Total number of image fetches or searches that failed",
        ))
        .map_err(metric_error)?;

        let image_searches = IntCounter::with_opts(Opts::new(
            "fortune_image_searches_total",
            "Total number of image search requests",
        ))
        .map_err(metric_error)?;

        let profiles = IntGauge::with_opts(Opts::new(
            "fortune_profiles",
            "Current number of registered profiles",
        ))
        .map_err(metric_error)?;

        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(fortune_requests.clone()),
            Box::new(fortune_failures.clone()),
            Box::new(fortune_latency.clone()),
            Box::new(image_cache_hits.clone()),
            Box::new(image_cache_misses.clone()),
            Box::new(image_fetch_failures.clone()),
            Box::new(image_searches.clone()),
            Box::new(profiles.clone()),
        ];
        for collector in collectors {
            registry.register(collector).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to register metric: {}", e))
            })?;
        }

        Ok(Self {
            registry: Arc::new(registry),
            fortune_requests,
            fortune_failures,
            fortune_latency,
            image_cache_hits,
            image_cache_misses,
            image_fetch_failures,
            image_searches,
            profiles,
        })
    }

    /// Record a fortune request and its latency in seconds
    pub fn record_fortune_request(&self, seconds: f64, succeeded: bool) {
        self.fortune_requests.inc();
        self.fortune_latency.observe(seconds);
        if !succeeded {
            self.fortune_failures.inc();
        }
    }

    pub fn record_image_cache_hit(&self) {
        self.image_cache_hits.inc();
    }

    pub fn record_image_cache_miss(&self) {
        self.image_cache_misses.inc();
    }

    pub fn record_image_failure(&self) {
        self.image_fetch_failures.inc();
    }

    pub fn record_image_search(&self) {
        self.image_searches.inc();
    }

    /// Update the registered profiles gauge
    pub fn update_profiles(&self, count: usize) {
        self.profiles.set(count as i64);
    }

    /// Export metrics in Prometheus format
    pub fn export(&self) -> Result<String, AppError> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to convert metrics to string: {}",
                e
            ))
        })
    }
}
