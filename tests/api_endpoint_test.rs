use axum::http::StatusCode;
use chrono::NaiveDate;
use dcasim::api::{self, AppState};
use dcasim::datasource::{DataSourceError, MockQuoteSource, RawQuote};
use dcasim::{Config, Decimal, Ticker};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tower::util::ServiceExt;

fn quote(y: i32, m: u32, close: &str) -> RawQuote {
    RawQuote::new(
        NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
        Some(Decimal::from_str(close).unwrap()),
        None,
    )
}

fn test_config() -> Config {
    Config {
        currency_symbol: "$".to_string(),
        ..Config::default()
    }
}

fn setup_test_app(source: MockQuoteSource) -> axum::Router {
    let state = AppState::new(test_config(), Arc::new(source));
    api::create_router(state)
}

fn doubling_source() -> MockQuoteSource {
    let ticker = Ticker::parse("AAPL").unwrap();
    let mut quotes: Vec<RawQuote> = (1..=11).map(|m| quote(2020, m, "100")).collect();
    quotes.push(quote(2020, 12, "200"));
    MockQuoteSource::new().with_quotes(&ticker, quotes)
}

async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn new_session(app: &axum::Router) -> String {
    let (status, body) = request(app, "POST", "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["sessionId"].as_str().unwrap().to_string()
}

async fn load_aapl(app: &axum::Router, session: &str) {
    let (status, body) = request(
        app,
        "POST",
        &format!("/v1/sessions/{}/prices", session),
        Some(serde_json::json!({"ticker": "aapl", "from": "2020-01-01", "to": "2020-12-31"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app(MockQuoteSource::new());
    let (status, body) = request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_new_session_uses_default_contribution() {
    let app = setup_test_app(MockQuoteSource::new());
    let (status, body) = request(&app, "POST", "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["monthlyContribution"], "15000");
    assert_eq!(body["historyCount"], 0);
}

#[tokio::test]
async fn test_load_prices_normalizes_series() {
    let app = setup_test_app(doubling_source());
    let session = new_session(&app).await;

    let (status, body) = request(
        &app,
        "POST",
        &format!("/v1/sessions/{}/prices", session),
        Some(serde_json::json!({"ticker": "AAPL", "from": "2020-01-01", "to": "2020-12-31"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticker"], "AAPL");
    assert_eq!(body["count"], 12);
    assert_eq!(body["firstPeriod"], "2020-01");
    assert_eq!(body["lastPeriod"], "2020-12");
    assert_eq!(body["prices"][11]["price"], "200");
}

#[tokio::test]
async fn test_load_prices_empty_result_is_not_found() {
    let app = setup_test_app(MockQuoteSource::new());
    let session = new_session(&app).await;

    let (status, body) = request(
        &app,
        "POST",
        &format!("/v1/sessions/{}/prices", session),
        Some(serde_json::json!({"ticker": "ZZZZ", "from": "2020-01-01", "to": "2020-12-31"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ZZZZ"));
}

#[tokio::test]
async fn test_load_prices_upstream_failure() {
    let source = MockQuoteSource::new().failing_with(DataSourceError::RateLimited);
    let app = setup_test_app(source);
    let session = new_session(&app).await;

    let (status, _) = request(
        &app,
        "POST",
        &format!("/v1/sessions/{}/prices", session),
        Some(serde_json::json!({"ticker": "AAPL"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_load_prices_rejects_path_like_ticker() {
    let app = setup_test_app(doubling_source());
    let session = new_session(&app).await;
    let uri = format!("/v1/sessions/{}/prices", session);

    for ticker in ["../AAPL", "a/b", "AAPL?x=1"] {
        let (status, body) = request(
            &app,
            "POST",
            &uri,
            Some(serde_json::json!({"ticker": ticker})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", ticker);
        assert_eq!(body["error"], "Invalid ticker");
    }
}

#[tokio::test]
async fn test_simulate_full_span() {
    let app = setup_test_app(doubling_source());
    let session = new_session(&app).await;
    load_aapl(&app, &session).await;

    let (status, body) = request(
        &app,
        "POST",
        &format!("/v1/sessions/{}/simulate", session),
        Some(serde_json::json!({"monthlyContribution": "1000"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["rangeStart"], "2020-01");
    assert_eq!(body["rangeEnd"], "2020-12");
    assert_eq!(body["valuationPrice"], "200");
    assert_eq!(body["records"].as_array().unwrap().len(), 12);
    assert_eq!(body["records"][0]["sharesPurchased"], "10");
    assert_eq!(body["records"][11]["sharesPurchased"], "5");
    assert_eq!(body["records"][11]["cumulativeShares"], "115");
    assert_eq!(body["records"][11]["cumulativeInvested"], "12000");
    assert_eq!(body["summary"]["finalValue"], "23000");
    assert_eq!(body["summary"]["finalPnl"], "11000");
    assert_eq!(body["summary"]["finalValueDisplay"], "$23,000");
    assert_eq!(body["summary"]["finalPnlDisplay"], "$11,000");
    assert_eq!(body["ticks"]["ticks"].as_array().unwrap().len(), 12);
    assert_eq!(body["ticks"]["labelRotation"], 45);
}

#[tokio::test]
async fn test_simulate_remembers_contribution() {
    let app = setup_test_app(doubling_source());
    let session = new_session(&app).await;
    load_aapl(&app, &session).await;

    request(
        &app,
        "POST",
        &format!("/v1/sessions/{}/simulate", session),
        Some(serde_json::json!({"monthlyContribution": "2000", "rangeStart": "2020-11"})),
    )
    .await;

    let (_, body) = request(&app, "GET", &format!("/v1/sessions/{}", session), None).await;
    assert_eq!(body["monthlyContribution"], "2000");
    assert_eq!(body["ticker"], "AAPL");

    let (status, body) = request(
        &app,
        "POST",
        &format!("/v1/sessions/{}/simulate", session),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["monthlyContribution"], "2000");
    assert_eq!(body["records"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_simulate_errors_are_bad_requests() {
    let app = setup_test_app(doubling_source());
    let session = new_session(&app).await;
    let uri = format!("/v1/sessions/{}/simulate", session);

    let (status, body) = request(&app, "POST", &uri, Some(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no price data loaded");

    load_aapl(&app, &session).await;

    let (status, body) = request(
        &app,
        "POST",
        &uri,
        Some(serde_json::json!({"monthlyContribution": "0"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("must be positive"));

    let (status, _) = request(
        &app,
        "POST",
        &uri,
        Some(serde_json::json!({"rangeStart": "2021-01", "rangeEnd": "2021-06"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        &uri,
        Some(serde_json::json!({"monthlyContribution": "lots"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = request(
        &app,
        "POST",
        &uri,
        Some(serde_json::json!({"monthlyContribution": "70000000000000000000000000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("overflow at 2020-02"));
}

#[tokio::test]
async fn test_history_record_list_clear() {
    let app = setup_test_app(doubling_source());
    let session = new_session(&app).await;
    let history_uri = format!("/v1/sessions/{}/history", session);

    let (status, _) = request(&app, "POST", &history_uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    load_aapl(&app, &session).await;
    let simulate_uri = format!("/v1/sessions/{}/simulate", session);
    request(
        &app,
        "POST",
        &simulate_uri,
        Some(serde_json::json!({"monthlyContribution": "1000"})),
    )
    .await;

    let (status, entry) = request(&app, "POST", &history_uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["periodCount"], 12);
    assert_eq!(entry["finalValue"], "23000");
    assert_eq!(entry["finalPnlDisplay"], "$11,000");
    assert_eq!(entry["monthlyContributionDisplay"], "$1,000");

    request(
        &app,
        "POST",
        &simulate_uri,
        Some(serde_json::json!({"rangeStart": "2020-12"})),
    )
    .await;
    request(&app, "POST", &history_uri, None).await;

    let (status, body) = request(&app, "GET", &history_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["rangeStart"], "2020-01");
    assert_eq!(entries[1]["rangeStart"], "2020-12");
    assert_eq!(entries[1]["periodCount"], 1);
    assert_eq!(entries[1]["finalPnl"], "0");

    let (status, _) = request(&app, "DELETE", &history_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = request(&app, "GET", &history_uri, None).await;
    assert!(body["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sessions_do_not_share_history() {
    let app = setup_test_app(doubling_source());
    let a = new_session(&app).await;
    let b = new_session(&app).await;

    load_aapl(&app, &a).await;
    request(
        &app,
        "POST",
        &format!("/v1/sessions/{}/simulate", a),
        Some(serde_json::json!({})),
    )
    .await;
    request(&app, "POST", &format!("/v1/sessions/{}/history", a), None).await;

    let (_, body) = request(&app, "GET", &format!("/v1/sessions/{}/history", b), None).await;
    assert!(body["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = setup_test_app(doubling_source());
    let uri = format!("/v1/sessions/{}/history", uuid::Uuid::new_v4());
    let (status, _) = request(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let session = new_session(&app).await;
    let (status, _) = request(&app, "DELETE", &format!("/v1/sessions/{}", session), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = request(&app, "GET", &format!("/v1/sessions/{}", session), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
