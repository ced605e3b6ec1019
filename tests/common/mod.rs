//! Shared helpers: mock upstream servers on ephemeral ports and fixtures.

#![allow(dead_code)]

use std::io::Cursor;

use axum::Router;
use bytes::Bytes;
use prefecture_fortune::config::{FortuneApiConfig, ImageSearchConfig};
use prefecture_fortune::metrics::Metrics;
use prefecture_fortune::{FortuneClient, ImageCache, ImageClient};
use tokio::net::TcpListener;

pub const REQUEST_EXAMPLE: &str = include_str!("../fixtures/request_example.json");
pub const RESPONSE_EXAMPLE: &str = include_str!("../fixtures/response_example.json");

/// Reserve a local port; returns the listener and its `http://` base URL.
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("http://{addr}"))
}

pub fn serve(listener: TcpListener, app: Router) {
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
}

/// A base URL nothing is listening on.
pub async fn closed_base_url() -> String {
    let (listener, base_url) = bind().await;
    drop(listener);
    base_url
}

pub fn png(width: u32, height: u32) -> Bytes {
    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height))
        .write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)
        .unwrap();
    Bytes::from(buffer)
}

/// Fortune response whose logo lives at `logo_url`.
pub fn fortune_body(logo_url: &str) -> serde_json::Value {
    serde_json::json!({
        "prefecture": {
            "name": "富山県",
            "capital": "富山市",
            "citizen_day": { "month": 5, "day": 9 },
            "has_coast_line": true,
            "logo_url": logo_url,
            "brief": "富山県（とやまけん）は、日本の中部地方に位置する県。\n県庁所在地は富山市。",
        }
    })
}

pub fn fortune_client(base_url: &str) -> FortuneClient {
    let config = FortuneApiConfig {
        base_url: base_url.to_string(),
        api_version: "v1".to_string(),
        timeout: None,
    };
    FortuneClient::try_new(config, Metrics::new().unwrap()).unwrap()
}

pub fn image_client(search_base_url: &str, cache: ImageCache, metrics: Metrics) -> ImageClient {
    let config = ImageSearchConfig {
        base_url: search_base_url.to_string(),
        api_key: "test-key".to_string(),
        timeout: None,
    };
    ImageClient::try_new(config, cache, metrics).unwrap()
}
