//! End-to-end tests of the HTTP API on the mock backend.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use irlink_controller::{BoardController, BootConfig, HostPlatform, LoggingAdvertiser};
use irlink_core::{Gpio, MacAddress, PinTable};
use irlink_hardware::devices::AnyIrBackend;
use irlink_hardware::mock::{MockIrBackend, MockIrHandle};
use irlink_hardware::{IrCode, IrProtocol};
use irlink_network::{app_state, router};
use irlink_storage::{AnyKeyValueStore, MemoryKeyValueStore};
use rstest::rstest;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestBoard {
    app: Router,
    ir: MockIrHandle,
    store: MemoryKeyValueStore,
}

async fn board() -> TestBoard {
    let (backend, ir) = MockIrBackend::new();
    let store = MemoryKeyValueStore::new();
    let pins = PinTable::new(vec![Gpio(4), Gpio(5)], vec![Gpio(34)]).unwrap();
    let mac = MacAddress::parse("aa:bb:cc:dd:ee:ff").unwrap();

    let controller = BoardController::boot(BootConfig {
        backend: AnyIrBackend::Mock(backend),
        store: AnyKeyValueStore::Memory(store.clone()),
        pins,
        platform: Box::new(HostPlatform::new(mac, Some("10.0.0.7".parse().unwrap()))),
        advertiser: Box::new(LoggingAdvertiser::new()),
        http_port: 80,
    })
    .await;

    TestBoard {
        app: router(app_state(controller)),
        ir,
        store,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    send(app, Request::get(path).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let TestBoard { app, ir, .. } = board().await;

    let (status, body) = get(&app, "/ports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_ports"], 3);
    let ports = body["ports"].as_array().unwrap();
    assert!(ports.iter().all(|p| p["mode"] == "disabled"));
    assert_eq!(ports[2]["gpio"], 34);
    assert_eq!(ports[2]["can_output"], false);

    let (status, body) = post(
        &app,
        "/ports/configure",
        json!({"port": 4, "mode": "ir_output", "name": "tv"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "port": 4, "gpio": 4, "mode": "ir_output", "name": "tv"})
    );

    let (status, body) = post(
        &app,
        "/ports/configure",
        json!({"port": 34, "mode": "ir_output"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "input_only_pin");

    let (_, body) = get(&app, "/ports").await;
    assert_eq!(body["ports"][2]["mode"], "disabled");

    let (status, body) = post(
        &app,
        "/send_ir",
        json!({"output": 4, "code": "20DF10EF", "protocol": "nec"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "protocol": "nec", "protocol_fallback": false})
    );
    assert_eq!(
        ir.sent_codes(Gpio(4)),
        vec![IrCode::new(IrProtocol::Nec, 0x20DF10EF)]
    );

    let (status, _) = post(&app, "/learning/start", json!({"port": 34})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, "/learning/start", json!({"port": 4})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ir.live_receivers(), vec![Gpio(4)]);
}

#[tokio::test]
async fn test_info_and_status() {
    let TestBoard { app, .. } = board().await;

    let (status, info) = get(&app, "/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["board_id"], "ir-ddeeff");
    assert_eq!(info["board_name"], "IR Controller ddeeff");
    assert_eq!(info["mac_address"], "AA:BB:CC:DD:EE:FF");
    assert_eq!(info["ip_address"], "10.0.0.7");
    assert_eq!(info["total_ports"], 3);
    assert_eq!(info["output_count"], 0);
    assert_eq!(info["adopted"], false);
    assert!(info["firmware_version"].is_string());

    let (status, body) = get(&app, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["online"], true);
    assert_eq!(body["learning_active"], false);
    assert!(body["free_heap"].is_u64());
}

#[tokio::test]
async fn test_adopt() {
    let TestBoard { app, .. } = board().await;

    let (status, body) = post(
        &app,
        "/adopt",
        json!({"board_id": "  living-room ", "board_name": "Living Room"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "board_id": "living-room", "board_name": "Living Room"})
    );

    let (_, info) = get(&app, "/info").await;
    assert_eq!(info["board_id"], "living-room");
    assert_eq!(info["adopted"], true);
}

#[rstest]
#[case(json!({}), "missing_field")]
#[case(json!({"board_id": ""}), "invalid_board_id")]
#[case(json!({"board_id": "no spaces"}), "invalid_board_id")]
#[case(json!({"board_id": 12}), "invalid_field")]
#[tokio::test]
async fn test_adopt_rejections(#[case] body: Value, #[case] reason: &str) {
    let TestBoard { app, .. } = board().await;
    let (status, response) = post(&app, "/adopt", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], reason);

    let (_, info) = get(&app, "/info").await;
    assert_eq!(info["adopted"], false);
}

#[rstest]
#[case(json!({"mode": "ir_output"}), "missing_field")]
#[case(json!({"port": 4}), "missing_field")]
#[case(json!({"port": 4, "mode": "blink"}), "invalid_mode")]
#[case(json!({"port": 7, "mode": "ir_input"}), "unknown_port")]
#[case(json!({"port": "four", "mode": "ir_input"}), "invalid_field")]
#[tokio::test]
async fn test_configure_rejections(#[case] body: Value, #[case] reason: &str) {
    let TestBoard { app, ir, .. } = board().await;
    let (status, response) = post(&app, "/ports/configure", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], reason);
    assert!(ir.live_transmitters().is_empty());
    assert!(ir.live_receivers().is_empty());
}

#[tokio::test]
async fn test_malformed_json() {
    let TestBoard { app, .. } = board().await;
    let request = Request::post("/ports/configure")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"port\": 4,"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_json");

    let request = Request::post("/learning/start")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_json");
}

#[tokio::test]
async fn test_send_ir_rejections() {
    let TestBoard { app, .. } = board().await;

    let (status, body) = post(&app, "/send_ir", json!({"output": 4, "code": "10"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "not_output_port");

    post(&app, "/ports/configure", json!({"port": 4, "mode": "ir_output"})).await;

    let (status, body) = post(&app, "/send_ir", json!({"output": 4, "code": "xyz"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_field");

    let (status, body) = post(&app, "/send_ir", json!({"output": 4})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_field");
}

#[tokio::test]
async fn test_send_ir_protocol_fallback() {
    let TestBoard { app, ir, .. } = board().await;
    post(&app, "/ports/configure", json!({"port": 5, "mode": "ir_output"})).await;

    let (status, body) = post(
        &app,
        "/send_ir",
        json!({"output": 5, "code": "0xA90", "protocol": "mystery", "bits": 12}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["protocol"], "nec");
    assert_eq!(body["protocol_fallback"], true);
    assert_eq!(ir.sent_codes(Gpio(5))[0].bits, 12);
}

#[tokio::test]
async fn test_test_output() {
    let TestBoard { app, ir, .. } = board().await;

    let (status, body) = post(&app, "/test_output", json!({"output": 7})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_port");

    post(&app, "/ports/configure", json!({"port": 4, "mode": "ir_output"})).await;
    let (status, body) = post(&app, "/test_output", json!({"output": 4})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "duration_ms": 500}));
    assert_eq!(ir.test_patterns(Gpio(4)), vec![500]);
}

#[tokio::test]
async fn test_learning_cycle() {
    let TestBoard { app, ir, .. } = board().await;

    let (status, body) = post(&app, "/learning/start", json!({"port": 99})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_port");

    let (_, body) = get(&app, "/learning/status").await;
    assert_eq!(
        body,
        json!({"active": false, "port": null, "received_code": null, "elapsed_seconds": 0})
    );

    let (_, body) = post(&app, "/learning/start", json!({"port": 34})).await;
    assert_eq!(body, json!({"success": true, "port": 34, "timeout": 10}));
    ir.inject_frame(Gpio(34), IrCode::new(IrProtocol::Sony, 0xA90))
        .unwrap();

    let (_, body) = get(&app, "/learning/status").await;
    assert_eq!(body["active"], true);
    assert_eq!(body["port"], 34);
    assert_eq!(
        body["received_code"],
        json!({"protocol": "sony", "code": "0xA90", "bits": 12})
    );

    let (_, status) = get(&app, "/status").await;
    assert_eq!(status["learning_active"], true);

    let (_, body) = post(&app, "/learning/stop", json!({})).await;
    assert_eq!(body, json!({"success": true, "was_active": true}));
    let (_, body) = post(&app, "/learning/stop", json!({})).await;
    assert_eq!(body["was_active"], false);
}

#[rstest]
#[case(json!({"port": 34, "timeout": 100}), 60)]
#[case(json!({"port": 34, "timeout": 1}), 5)]
#[case(json!({"port": 34, "timeout": 20}), 20)]
#[tokio::test]
async fn test_learning_timeout_echo(#[case] body: Value, #[case] timeout: u32) {
    let TestBoard { app, .. } = board().await;

    let (status, body) = post(&app, "/learning/start", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timeout"], timeout);
}

#[tokio::test(start_paused = true)]
async fn test_learning_expires() {
    let TestBoard { app, .. } = board().await;

    post(&app, "/learning/start", json!({"port": 34, "timeout": 5})).await;
    tokio::time::advance(Duration::from_secs(2)).await;
    let (_, body) = get(&app, "/learning/status").await;
    assert_eq!(body["active"], true);
    assert_eq!(body["elapsed_seconds"], 2);

    tokio::time::advance(Duration::from_secs(4)).await;
    let (_, status) = get(&app, "/status").await;
    assert_eq!(status["learning_active"], false);
    let (_, body) = get(&app, "/learning/status").await;
    assert_eq!(body["active"], false);
    let (_, body) = post(&app, "/learning/stop", json!({})).await;
    assert_eq!(body["was_active"], false);
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let TestBoard { app, store, .. } = board().await;
    store.set_fail_writes(true);

    let (status, body) = post(
        &app,
        "/ports/configure",
        json!({"port": 4, "mode": "ir_output"}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "storage_failure");

    let (_, body) = get(&app, "/ports").await;
    assert_eq!(body["ports"][0]["mode"], "ir_output");
}

#[tokio::test]
async fn test_unknown_route() {
    let TestBoard { app, .. } = board().await;
    let (status, body) = get(&app, "/firmware/update").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
