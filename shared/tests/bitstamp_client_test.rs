//! BitstampClient against a local HTTP server

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use shared::{BitstampClient, FetchError, Metric, StatsSource};

/// Serve `app` on an ephemeral port and return its base URL
async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn stats_path(coin: &str, metric: Metric) -> String {
    format!("/api-internal/stats/v1/{}/{}", coin, metric.path())
}

#[tokio::test]
async fn test_fetch_series_ok() {
    let app = Router::new().route(
        &stats_path("btc", Metric::Transactions),
        get(|| async {
            Json(json!({
                "txsStats": [
                    {"date": "2024-01-02", "txs": 12},
                    {"date": "2024-01-01", "txs": 10}
                ],
                "unit": "count"
            }))
        }),
    );
    let client = BitstampClient::new(spawn_server(app).await).unwrap();

    let series = client
        .fetch_series("btc", Metric::Transactions)
        .await
        .unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date(), &json!("2024-01-02"));
    assert_eq!(series[0].get("txs"), Some(&json!(12)));
}

#[tokio::test]
async fn test_fetch_series_unavailable() {
    let app = Router::new().route(
        &stats_path("btc", Metric::Price),
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    );
    let client = BitstampClient::new(spawn_server(app).await).unwrap();

    let err = client.fetch_series("btc", Metric::Price).await.unwrap_err();
    assert!(!err.is_rate_limited());
    match err {
        FetchError::Status { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_fetch_series_rate_limited() {
    let app = Router::new().route(
        &stats_path("eth", Metric::Addresses),
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let client = BitstampClient::new(spawn_server(app).await).unwrap();

    let err = client
        .fetch_series("eth", Metric::Addresses)
        .await
        .unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_fetch_series_missing_field() {
    let app = Router::new().route(
        &stats_path("eth", Metric::LargeTransactions),
        get(|| async { Json(json!({"largeTransactions": []})) }),
    );
    let client = BitstampClient::new(spawn_server(app).await).unwrap();

    let err = client
        .fetch_series("eth", Metric::LargeTransactions)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::MissingField { field: "largeTxs", .. }));
}

#[tokio::test]
async fn test_fetch_series_malformed_body() {
    let app = Router::new().route(
        &stats_path("ltc", Metric::Price),
        get(|| async { "<html>oops</html>" }),
    );
    let client = BitstampClient::new(spawn_server(app).await).unwrap();

    let err = client.fetch_series("ltc", Metric::Price).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn test_fetch_series_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = BitstampClient::new(format!("http://{}", addr)).unwrap();

    let err = client.fetch_series("btc", Metric::Price).await.unwrap_err();
    assert!(matches!(err, FetchError::Http { .. }));
}

#[tokio::test]
async fn test_list_coins() {
    let app = Router::new().route(
        "/api/v2/trading-pairs-info/",
        get(|| async {
            Json(json!([
                {"name": "BTC/USD", "url_symbol": "btcusd"},
                {"name": "btc/EUR", "url_symbol": "btceur"},
                {"name": "ETH/USD", "url_symbol": "ethusd"}
            ]))
        }),
    );
    let client = BitstampClient::new(spawn_server(app).await).unwrap();

    assert_eq!(client.list_coins().await.unwrap(), vec!["btc", "eth"]);
}

#[tokio::test]
async fn test_list_coins_rate_limited() {
    let app = Router::new().route(
        "/api/v2/trading-pairs-info/",
        get(|| async { StatusCode::TOO_MANY_REQUESTS }),
    );
    let client = BitstampClient::new(spawn_server(app).await).unwrap();

    assert!(client.list_coins().await.unwrap_err().is_rate_limited());
}
