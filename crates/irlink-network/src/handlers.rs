//! HTTP handlers.
//!
//! Handlers validate the request body before taking the controller lock, so
//! a malformed request never reaches the registry or the IR resources.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::Uri;
use irlink_controller::{BoardInfo, BoardStatus};
use irlink_core::{Gpio, PortMode};

use crate::dto::{
    AdoptRequest, AdoptResponse, ConfigurePortRequest, ConfigurePortResponse,
    LearningStartRequest, LearningStartResponse, LearningStatusResponse, LearningStopResponse,
    PortEntry, PortsResponse, SendIrRequest, SendIrResponse, TestOutputRequest,
    TestOutputResponse, require,
};
use crate::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn get_info(State(state): State<AppState>) -> Json<BoardInfo> {
    Json(state.lock().await.info())
}

pub async fn get_status(State(state): State<AppState>) -> Json<BoardStatus> {
    Json(state.lock().await.status())
}

pub async fn get_ports(State(state): State<AppState>) -> Json<PortsResponse> {
    let ports: Vec<PortEntry> = state
        .lock()
        .await
        .ports()
        .into_iter()
        .map(PortEntry::from)
        .collect();
    Json(PortsResponse {
        total_ports: ports.len(),
        ports,
    })
}

pub async fn configure_port(
    State(state): State<AppState>,
    body: Result<Json<ConfigurePortRequest>, JsonRejection>,
) -> ApiResult<ConfigurePortResponse> {
    let Json(req) = body?;
    let gpio = Gpio(require(req.port, "port")?);
    let mode: PortMode = require(req.mode, "mode")?.parse()?;
    let name = req.name.unwrap_or_default();

    let port = state.lock().await.configure_port(gpio, mode, &name).await?;
    Ok(Json(port.into()))
}

pub async fn adopt(
    State(state): State<AppState>,
    body: Result<Json<AdoptRequest>, JsonRejection>,
) -> ApiResult<AdoptResponse> {
    let Json(req) = body?;
    let board_id = require(req.board_id, "board_id")?;

    let identity = state
        .lock()
        .await
        .adopt(&board_id, req.board_name.as_deref())
        .await?;
    Ok(Json(AdoptResponse {
        success: true,
        board_id: identity.id,
        board_name: identity.name,
    }))
}

pub async fn send_ir(
    State(state): State<AppState>,
    body: Result<Json<SendIrRequest>, JsonRejection>,
) -> ApiResult<SendIrResponse> {
    let Json(req) = body?;
    let gpio = Gpio(require(req.output, "output")?);
    let code = require(req.code, "code")?;

    let outcome = state
        .lock()
        .await
        .send_ir(gpio, &code, req.protocol.as_deref(), req.bits)?;
    Ok(Json(SendIrResponse {
        success: true,
        protocol: outcome.code.protocol.to_string(),
        protocol_fallback: outcome.protocol_fallback,
    }))
}

pub async fn test_output(
    State(state): State<AppState>,
    body: Result<Json<TestOutputRequest>, JsonRejection>,
) -> ApiResult<TestOutputResponse> {
    let Json(req) = body?;
    let gpio = Gpio(require(req.output, "output")?);

    let duration_ms = state.lock().await.test_output(gpio, req.duration_ms)?;
    Ok(Json(TestOutputResponse {
        success: true,
        duration_ms,
    }))
}

pub async fn learning_start(
    State(state): State<AppState>,
    body: Result<Json<LearningStartRequest>, JsonRejection>,
) -> ApiResult<LearningStartResponse> {
    let Json(req) = body?;
    let gpio = Gpio(require(req.port, "port")?);

    let timeout = state.lock().await.start_learning(gpio, req.timeout)?;
    Ok(Json(LearningStartResponse {
        success: true,
        port: gpio.number(),
        timeout,
    }))
}

pub async fn learning_stop(State(state): State<AppState>) -> Json<LearningStopResponse> {
    let was_active = state.lock().await.stop_learning();
    Json(LearningStopResponse {
        success: true,
        was_active,
    })
}

pub async fn learning_status(State(state): State<AppState>) -> ApiResult<LearningStatusResponse> {
    let status = state.lock().await.learning_status()?;
    Ok(Json(status.into()))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(uri.path())
}
