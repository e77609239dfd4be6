//! End-to-end tests against a loopback backend serving push channels and
//! REST endpoints.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tickerboard_feed::{
    fetcher, ConnectionStatus, Feed, FeedHub, SparklineBook, SubscriptionOptions,
};
use tickerboard_sdk::{Channel, ClientError, ForeignSummary, MarketClient, MarketSnapshot, WsConfig};

fn snapshot_json(price: f64) -> Value {
    json!({
        "prices": {
            "FPT": {"last_price": price, "change": 1.5, "change_pct": 1.26,
                    "ref_price": 119.0, "ceiling": 127.3, "floor": 110.7}
        },
        "quotes": {},
        "indices": {}
    })
}

fn summary_json() -> Value {
    json!({
        "total_buy_value": 9.0e9,
        "total_sell_value": 4.0e9,
        "total_net_value": 5.0e9,
        "total_buy_volume": 900_000,
        "total_sell_volume": 400_000,
        "total_net_volume": 500_000
    })
}

async fn market_ws(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(serve_market)
}

async fn serve_market(mut socket: WebSocket) {
    let frames = [
        Message::Text(json!({"type": "status", "connected": true}).to_string().into()),
        Message::Binary(b"ping".to_vec().into()),
        Message::Text("not json".into()),
        Message::Text(snapshot_json(120.5).to_string().into()),
        Message::Text(snapshot_json(121.0).to_string().into()),
    ];
    for frame in frames {
        if socket.send(frame).await.is_err() {
            return;
        }
    }
    while let Some(Ok(_)) = socket.recv().await {}
}

async fn snapshot() -> Json<Value> {
    Json(snapshot_json(118.0))
}

async fn foreign_detail() -> Json<Value> {
    Json(json!({"summary": summary_json(), "stocks": []}))
}

async fn vn30_components() -> Json<Value> {
    Json(json!({"symbols": ["FPT", "VNM"]}))
}

async fn unauthorized() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

async fn spawn_backend() -> SocketAddr {
    let app = Router::new()
        .route("/ws/market", get(market_ws))
        .route("/api/market/snapshot", get(snapshot))
        .route("/api/market/foreign-detail", get(foreign_detail))
        .route("/api/vn30-components", get(vn30_components))
        .route("/api/market/alerts", get(unauthorized));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

#[tokio::test]
async fn test_market_push_is_live_and_drops_noise() {
    let addr = spawn_backend().await;
    let hub = FeedHub::new(WsConfig::new(format!("ws://{addr}"))).expect("hub");
    let subscription = hub
        .subscribe::<MarketSnapshot>(Channel::Market, SubscriptionOptions::new())
        .expect("subscribe");
    let mut feed = Feed::new(subscription, SparklineBook::default());

    let first = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .expect("first snapshot in time")
        .expect("first snapshot");
    assert_eq!(first.last_price_of("FPT"), Some(120.5));
    feed.next().await.expect("second snapshot");

    assert!(feed.subscription().is_live());
    assert_eq!(feed.subscription().status(), ConnectionStatus::Connected);
    assert_eq!(feed.accumulator().points("FPT"), vec![120.5, 121.0]);

    let metrics = hub.metrics();
    assert_eq!(metrics.control_frames(), 1);
    assert_eq!(metrics.ignored_frames(), 2);
    assert_eq!(metrics.push_messages(), 2);
}

#[tokio::test]
async fn test_missing_channel_falls_back_to_rest() {
    let addr = spawn_backend().await;
    let client = MarketClient::with_base_url(format!("http://{addr}/api")).expect("client");
    let hub = FeedHub::new(WsConfig::new(format!("ws://{addr}"))).expect("hub");

    let options = SubscriptionOptions::new()
        .with_max_reconnect_attempts(1)
        .with_fallback(fetcher(move || {
            let client = client.clone();
            async move { client.get_foreign_detail().await.map(|detail| detail.summary) }
        }));
    let mut subscription = hub
        .subscribe::<ForeignSummary>(Channel::Foreign, options)
        .expect("subscribe");

    let state = tokio::time::timeout(
        Duration::from_secs(5),
        subscription.wait_for(|s| s.data.is_some()),
    )
    .await
    .expect("fallback in time")
    .expect("fallback data");

    assert!(!state.is_live);
    assert!(state.in_fallback);
    assert_eq!(state.status, ConnectionStatus::Connected);
    assert_eq!(state.data.as_ref().map(|s| s.total_net_value), Some(5.0e9));
    assert_eq!(hub.metrics().fallback_activations(), 1);

    subscription.close().await;
}

#[tokio::test]
async fn test_rest_client_against_backend() {
    let addr = spawn_backend().await;
    let client = MarketClient::with_base_url(format!("http://{addr}/api")).expect("client");

    let symbols = client.get_vn30_components().await.expect("components");
    assert_eq!(symbols, vec!["FPT".to_string(), "VNM".to_string()]);

    let snapshot = client.get_snapshot().await.expect("snapshot");
    assert_eq!(snapshot.price("FPT").map(|p| p.ceiling), Some(127.3));

    let missing = client.get::<Value>("/market/unknown").await;
    assert!(matches!(missing, Err(ClientError::NotFound(path)) if path == "/market/unknown"));

    let denied = client.get_alerts(50).await;
    assert!(matches!(denied, Err(ClientError::Unauthorized)));
}
