//! Fortune client against mock fortune services over real HTTP.

mod common;

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use chrono::NaiveDate;
use prefecture_fortune::{BloodType, FetchError, FortuneApi, FortuneRequest, Profile};
use tokio_test::{assert_err, assert_ok};

type Captured = Arc<Mutex<Option<(HeaderMap, Bytes)>>>;

fn yumemin_request() -> FortuneRequest {
    let profile = Profile::new(
        "ゆめみん".to_string(),
        NaiveDate::from_ymd_opt(2000, 1, 27).unwrap(),
        BloodType::Ab,
        None,
        None,
    );
    FortuneRequest::new(&profile, NaiveDate::from_ymd_opt(2000, 1, 27).unwrap())
}

async fn fixed_response(status: StatusCode, body: &'static str) -> String {
    let (listener, base_url) = common::bind().await;
    let app = Router::new().route("/my_fortune", post(move || async move { (status, body) }));
    common::serve(listener, app);
    base_url
}

#[tokio::test]
async fn post_fortune_returns_decoded_prefecture() {
    let captured: Captured = Arc::default();
    let (listener, base_url) = common::bind().await;
    let app = Router::new()
        .route(
            "/my_fortune",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, body: Bytes| async move {
                    *captured.lock().unwrap() = Some((headers, body));
                    common::RESPONSE_EXAMPLE
                },
            ),
        )
        .with_state(captured.clone());
    common::serve(listener, app);

    let client = common::fortune_client(&base_url);
    let result = assert_ok!(client.post_fortune(&yumemin_request()).await);
    assert_eq!(result.prefecture.name, "富山県");
    assert_eq!(result.prefecture.capital, "富山市");

    let (headers, body) = captured.lock().unwrap().take().unwrap();
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["api-version"], "v1");

    let sent: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let expected: serde_json::Value = serde_json::from_str(common::REQUEST_EXAMPLE).unwrap();
    assert_eq!(sent, expected);
}

#[tokio::test]
async fn transport_fault_is_a_network_error() {
    let client = common::fortune_client(&common::closed_base_url().await);

    let err = assert_err!(client.post_fortune(&yumemin_request()).await);
    assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn non_json_body_is_a_decoding_error() {
    let base_url = fixed_response(StatusCode::OK, "invalid json").await;
    let client = common::fortune_client(&base_url);

    let err = assert_err!(client.post_fortune(&yumemin_request()).await);
    assert!(matches!(err, FetchError::Decoding(_)), "got {err:?}");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let base_url = fixed_response(StatusCode::SERVICE_UNAVAILABLE, "maintenance").await;
    let client = common::fortune_client(&base_url);

    let err = assert_err!(client.post_fortune(&yumemin_request()).await);
    assert!(matches!(err, FetchError::BadStatusCode(503)), "got {err:?}");
}

#[tokio::test]
async fn unparsable_endpoint_is_an_invalid_url() {
    let client = common::fortune_client("not a url");

    let err = assert_err!(client.post_fortune(&yumemin_request()).await);
    assert!(matches!(err, FetchError::InvalidUrl(_)), "got {err:?}");
}
