use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_FORTUNE_API_BASE_URL: &str =
    "https://yumemi-ios-junior-engineer-codecheck.app.swift.cloud";
const DEFAULT_IMAGE_SEARCH_BASE_URL: &str = "https://pixabay.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Settings for the fortune service client.
#[derive(Debug, Clone)]
pub struct FortuneApiConfig {
    pub base_url: String,
    pub api_version: String,
    pub timeout: Option<Duration>,
}

/// Settings for the image search client.
#[derive(Clone)]
pub struct ImageSearchConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
}

pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub fortune_api: FortuneApiConfig,
    pub image_search: ImageSearchConfig,
    pub seed_sample_profiles: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let listen_addr: SocketAddr = env::var("FORTUNE_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("invalid FORTUNE_ADDR")?;

        let timeout = parse_timeout("FORTUNE_HTTP_TIMEOUT_SECONDS", 0)?;

        let fortune_api = FortuneApiConfig {
            base_url: env::var("FORTUNE_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_FORTUNE_API_BASE_URL.to_string()),
            api_version: env::var("FORTUNE_API_VERSION").unwrap_or_else(|_| "v1".to_string()),
            timeout,
        };

        let api_key = env::var("PIXABAY_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            bail!("PIXABAY_API_KEY must be set to an image search API key");
        }

        let image_search = ImageSearchConfig {
            base_url: env::var("IMAGE_SEARCH_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_SEARCH_BASE_URL.to_string()),
            api_key,
            timeout,
        };

        let seed_sample_profiles = parse_bool("FORTUNE_SEED_SAMPLE_PROFILES", false)?;

        let log_format = match env::var("FORTUNE_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("text") | Err(_) => LogFormat::Text,
            Ok(other) => bail!("FORTUNE_LOG_FORMAT must be text or json, got {other}"),
        };

        Ok(Self {
            listen_addr,
            fortune_api,
            image_search,
            seed_sample_profiles,
            log_format,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }
}

fn parse_timeout(env_key: &str, default_secs: u64) -> Result<Option<Duration>> {
    let raw = env::var(env_key).unwrap_or_else(|_| default_secs.to_string());
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("{env_key} must be an integer number of seconds"))?;

    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn parse_bool(env_key: &str, default: bool) -> Result<bool> {
    match env::var(env_key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{env_key} must be true or false")),
        Err(_) => Ok(default),
    }
}
