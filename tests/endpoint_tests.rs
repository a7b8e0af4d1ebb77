//! Tests over real loopback HTTP: the telemetry client against the mock
//! endpoint, the full aggregation, and the trigger service.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{routing::post, Json, Router};
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use telemetry_aggregator::aggregator::{aggregate, AggregationReport};
use telemetry_aggregator::cli::run::run;
use telemetry_aggregator::config::types::{Config, EndpointConfig, MockConfig};
use telemetry_aggregator::mock::MockState;
use telemetry_aggregator::telemetry::{sign, BatchOutcome, TelemetryClient, Transport};
use telemetry_aggregator::web::{router, AppState};
use tokio::net::TcpListener;
use tower::ServiceExt;

const PATH: &str = "/device/real/query";
const SECRET: &str = "interview_token_123";

async fn spawn_mock(tolerance: Duration) -> SocketAddr {
    let mock = MockConfig {
        rate_limit_tolerance: tolerance,
        ..MockConfig::default()
    };
    let state = Arc::new(MockState::new(PATH, SECRET, &mock).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        telemetry_aggregator::mock::serve(listener, PATH, state).await
    });

    addr
}

/// Serves a fixed status and body on the query path.
async fn spawn_fixed(status: StatusCode, body: &'static str) -> SocketAddr {
    let app = Router::new().route(PATH, post(move || async move { (status, body) }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move { axum::serve(listener, app).await });

    addr
}

/// Fails any batch holding `SN-001` and answers every other batch with three
/// copies of its first device.
async fn spawn_over_returning() -> SocketAddr {
    let handler = |Json(body): Json<serde_json::Value>| async move {
        let first = body["sn_list"][0].as_str().unwrap_or_default().to_string();
        if first == "SN-001" {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "boom" })),
            );
        }
        let record = serde_json::json!({ "sn": first, "power": "1.0 kW", "status": "Online" });
        (
            StatusCode::OK,
            Json(serde_json::json!({ "data": [record.clone(), record.clone(), record] })),
        )
    };
    let app = Router::new().route(PATH, post(handler));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move { axum::serve(listener, app).await });

    addr
}

fn endpoint_for(addr: SocketAddr) -> EndpointConfig {
    EndpointConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        path: PATH.to_string(),
        secret: SECRET.to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn devices(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("SN-{:03}", i)).collect()
}

#[tokio::test]
async fn test_client_success_against_mock() {
    let addr = spawn_mock(Duration::from_millis(950)).await;
    let client = TelemetryClient::new(&endpoint_for(addr)).unwrap();
    let batch = devices(0..10);

    match client.send(&batch).await {
        BatchOutcome::Success(records) => {
            let serials: Vec<String> = records.iter().map(|r| r.sn.clone()).collect();
            assert_eq!(serials, batch);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_back_to_back_requests_are_rate_limited() {
    let addr = spawn_mock(Duration::from_millis(950)).await;
    let client = TelemetryClient::new(&endpoint_for(addr)).unwrap();

    assert!(client.send(&devices(0..10)).await.is_success());
    assert_eq!(client.send(&devices(10..20)).await, BatchOutcome::RateLimited);
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let addr = spawn_mock(Duration::ZERO).await;
    let mut endpoint = endpoint_for(addr);
    endpoint.secret = "wrong_secret".to_string();
    let client = TelemetryClient::new(&endpoint).unwrap();

    match client.send(&devices(0..1)).await {
        BatchOutcome::OtherFailure { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("signature"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_batch_is_rejected() {
    let addr = spawn_mock(Duration::ZERO).await;
    let client = TelemetryClient::new(&endpoint_for(addr)).unwrap();

    let outcome = client.send(&devices(0..11)).await;
    assert_eq!(outcome.status_code(), Some(400));
    assert!(!outcome.is_transient());
}

#[tokio::test]
async fn test_missing_headers_are_rejected() {
    let addr = spawn_mock(Duration::ZERO).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}{}", addr, PATH))
        .json(&serde_json::json!({ "sn_list": ["SN-000"] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_mock_accepts_hand_signed_request() {
    let addr = spawn_mock(Duration::ZERO).await;
    let timestamp = chrono::Utc::now().timestamp_millis();
    let signature = sign(PATH, SECRET, timestamp).unwrap();

    let response = reqwest::Client::new()
        .post(format!("http://{}{}", addr, PATH))
        .header("signature", signature)
        .header("timestamp", timestamp.to_string())
        .json(&serde_json::json!({ "sn_list": ["SN-007"] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"][0]["sn"], "SN-007");
}

#[tokio::test]
async fn test_server_error_is_other_failure() {
    let addr = spawn_fixed(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").await;
    let client = TelemetryClient::new(&endpoint_for(addr)).unwrap();

    assert_eq!(
        client.send(&devices(0..3)).await,
        BatchOutcome::OtherFailure {
            status: 500,
            message: "database unavailable".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unparseable_success_body_is_parse_failure() {
    let addr = spawn_fixed(StatusCode::OK, "<html>not json</html>").await;
    let client = TelemetryClient::new(&endpoint_for(addr)).unwrap();

    assert!(matches!(
        client.send(&devices(0..3)).await,
        BatchOutcome::ParseFailure(_)
    ));
}

#[tokio::test]
async fn test_unfamiliar_record_shape_passes_through() {
    let addr = spawn_fixed(
        StatusCode::OK,
        r#"{"data":[{"sn":"SN-000","power":2.4,"status":"Online","last_updated":"2026-01-01T00:00:00Z","firmware":"1.2.3"}]}"#,
    )
    .await;
    let client = TelemetryClient::new(&endpoint_for(addr)).unwrap();

    match client.send(&devices(0..1)).await {
        BatchOutcome::Success(records) => {
            assert_eq!(records.len(), 1);
            assert_eq!(
                serde_json::to_value(&records[0]).unwrap(),
                serde_json::json!({
                    "sn": "SN-000",
                    "power": 2.4,
                    "status": "Online",
                    "last_updated": "2026-01-01T00:00:00Z",
                    "firmware": "1.2.3"
                })
            );
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_fixed_429_is_rate_limited() {
    let addr = spawn_fixed(StatusCode::TOO_MANY_REQUESTS, "slow down").await;
    let client = TelemetryClient::new(&endpoint_for(addr)).unwrap();

    assert_eq!(client.send(&devices(0..3)).await, BatchOutcome::RateLimited);
}

fn config_for(addr: SocketAddr, count: usize) -> Config {
    let mut config = Config {
        endpoint: endpoint_for(addr),
        ..Config::default()
    };
    config.population.count = count;
    config
}

#[tokio::test]
async fn test_full_aggregation_stays_under_rate_limit() {
    let addr = spawn_mock(Duration::from_millis(950)).await;
    let config = config_for(addr, 25);

    let report = aggregate(&config).await.unwrap();

    assert_eq!(report.total_devices, 25);
    assert_eq!(report.fetched_devices, 25);
    assert_eq!(report.failed_batches, 0);
    assert_eq!(report.data[0].sn, "SN-000");
    assert_eq!(report.data[24].sn, "SN-024");
    assert!(report.execution_time_seconds >= 2.0);
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_every_batch_failed() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = config_for(addr, 3);
    config.aggregation.retry.max_retries = 1;
    config.aggregation.retry.delay = Duration::from_millis(10);

    let report = aggregate(&config).await.unwrap();

    assert_eq!(report.fetched_devices, 0);
    assert_eq!(report.failed_batches, 1);
    assert_eq!(report.errors[0].batch_index, 1);
    assert_eq!(report.errors[0].status_code, None);
}

#[tokio::test]
async fn test_run_survives_endpoint_returning_extra_records() {
    let _guard = tracing::subscriber::set_default(tracing_subscriber::fmt().finish());
    let addr = spawn_over_returning().await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
endpoint:
  host: "{}"
  port: {}
  path: {}
  secret: {}
population:
  count: 2
aggregation:
  batch_size: 1
  request_interval: 10ms
mock:
  rate_limit_tolerance: 0ms
"#,
        addr.ip(),
        addr.port(),
        PATH,
        SECRET
    )
    .unwrap();
    file.flush().unwrap();

    let report = run(Some(file.path())).await.unwrap();

    assert_eq!(report.total_devices, 2);
    assert_eq!(report.fetched_devices, 3);
    assert_eq!(report.failed_batches, 1);
    assert_eq!(report.errors[0].devices, vec!["SN-001".to_string()]);
    assert_eq!(report.missing_devices(), 0);
}

#[tokio::test]
async fn test_trigger_endpoint_returns_report() {
    let addr = spawn_mock(Duration::from_millis(950)).await;
    let app = router(Arc::new(AppState::new(config_for(addr, 12))));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/aggregate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let report: AggregationReport = serde_json::from_slice(&bytes).unwrap();

    assert!(report.success);
    assert_eq!(report.total_devices, 12);
    assert_eq!(report.fetched_devices, 12);
    assert_eq!(report.failed_batches, 0);

    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["executionTimeSeconds"].is_number());
}

#[tokio::test]
async fn test_trigger_endpoint_surfaces_execution_failure() {
    let addr = spawn_mock(Duration::from_millis(950)).await;
    let mut config = config_for(addr, 5);
    config.endpoint.secret = String::new();
    let app = router(Arc::new(AppState::new(config)));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/aggregate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_health_check() {
    let app = router(Arc::new(AppState::new(Config::default())));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
