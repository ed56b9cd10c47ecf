//! API error type and its JSON body.
//!
//! Every failure is answered with
//! `{"success": false, "error": "<reason>", "message": "<text>"}` where
//! `reason` is a stable machine-readable code.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use irlink_controller::ControllerError;
use irlink_hardware::HardwareError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
#[error("{reason}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub reason: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            message: message.into(),
        }
    }

    fn bad_request(reason: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, reason, message)
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::bad_request("invalid_json", message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::bad_request("missing_field", format!("Missing '{field}' field"))
    }

    pub fn invalid_field(message: impl Into<String>) -> Self {
        Self::bad_request("invalid_field", message)
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("No route for {path}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => Self::invalid_field(e.body_text()),
            other => Self::invalid_json(other.body_text()),
        }
    }
}

impl From<irlink_core::Error> for ApiError {
    fn from(err: irlink_core::Error) -> Self {
        use irlink_core::Error;
        let reason = match &err {
            Error::UnknownPort { .. } => "unknown_port",
            Error::InputOnlyPin { .. } => "input_only_pin",
            Error::InvalidMode(_) => "invalid_mode",
            Error::InvalidBoardId(_) => "invalid_board_id",
            _ => "invalid_field",
        };
        Self::bad_request(reason, err.to_string())
    }
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::Core(e) => e.into(),
            ControllerError::NotOutputPort { .. } => {
                Self::bad_request("not_output_port", err.to_string())
            }
            ControllerError::Hardware(HardwareError::NoTransmitter { .. }) => {
                Self::bad_request("no_transmitter", err.to_string())
            }
            ControllerError::Hardware(HardwareError::InvalidCode { .. }) => {
                Self::invalid_field(err.to_string())
            }
            ControllerError::Hardware(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "hardware_failure",
                err.to_string(),
            ),
            ControllerError::Storage(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_failure",
                err.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(reason = self.reason, message = %self.message, "Request failed");
        } else {
            warn!(reason = self.reason, message = %self.message, "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            error: self.reason,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irlink_core::Gpio;
    use rstest::rstest;

    #[rstest]
    #[case(irlink_core::Error::UnknownPort { gpio: Gpio(7) }, "unknown_port")]
    #[case(irlink_core::Error::InputOnlyPin { gpio: Gpio(34) }, "input_only_pin")]
    #[case(irlink_core::Error::InvalidMode("x".into()), "invalid_mode")]
    #[case(irlink_core::Error::InvalidBoardId("x".into()), "invalid_board_id")]
    fn test_core_error_reasons(#[case] err: irlink_core::Error, #[case] reason: &str) {
        let api = ApiError::from(ControllerError::Core(err));
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.reason, reason);
    }

    #[test]
    fn test_hardware_error_reasons() {
        let api = ApiError::from(ControllerError::Hardware(HardwareError::no_transmitter(
            Gpio(4),
        )));
        assert_eq!(api.reason, "no_transmitter");

        let api = ApiError::from(ControllerError::Hardware(
            HardwareError::initialization_failed(Gpio(4), "busy"),
        ));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.reason, "hardware_failure");
    }

    #[test]
    fn test_storage_error_reason() {
        let api = ApiError::from(ControllerError::Storage(
            irlink_storage::StorageError::Unavailable("down".into()),
        ));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.reason, "storage_failure");
    }
}
