//! Request and response bodies.
//!
//! Request fields are `Option` so a missing field is reported as
//! `missing_field` instead of a generic deserialization failure.

use irlink_controller::{LearningStatus, PortView};
use irlink_core::Port;
use irlink_hardware::IrCode;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Unwrap a required request field.
pub fn require<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::missing_field(field))
}

#[derive(Debug, Deserialize)]
pub struct ConfigurePortRequest {
    pub port: Option<u8>,
    pub mode: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdoptRequest {
    pub board_id: Option<String>,
    pub board_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendIrRequest {
    pub output: Option<u8>,
    pub code: Option<String>,
    pub protocol: Option<String>,
    pub bits: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct TestOutputRequest {
    pub output: Option<u8>,
    pub duration_ms: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LearningStartRequest {
    pub port: Option<u8>,
    /// Seconds; defaulted and clamped by the controller.
    pub timeout: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PortEntry {
    pub port: u8,
    pub gpio: u8,
    pub gpio_name: String,
    pub mode: String,
    pub name: String,
    pub can_input: bool,
    pub can_output: bool,
}

impl From<PortView> for PortEntry {
    fn from(view: PortView) -> Self {
        let gpio = view.port.gpio;
        Self {
            port: gpio.number(),
            gpio: gpio.number(),
            gpio_name: gpio.to_string(),
            mode: view.port.mode.to_string(),
            name: view.port.name,
            can_input: true,
            can_output: view.capability.can_output(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PortsResponse {
    pub total_ports: usize,
    pub ports: Vec<PortEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigurePortResponse {
    pub success: bool,
    pub port: u8,
    pub gpio: u8,
    pub mode: String,
    pub name: String,
}

impl From<Port> for ConfigurePortResponse {
    fn from(port: Port) -> Self {
        Self {
            success: true,
            port: port.gpio.number(),
            gpio: port.gpio.number(),
            mode: port.mode.to_string(),
            name: port.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdoptResponse {
    pub success: bool,
    pub board_id: String,
    pub board_name: String,
}

#[derive(Debug, Serialize)]
pub struct SendIrResponse {
    pub success: bool,
    pub protocol: String,
    pub protocol_fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct TestOutputResponse {
    pub success: bool,
    pub duration_ms: u32,
}

#[derive(Debug, Serialize)]
pub struct LearningStartResponse {
    pub success: bool,
    pub port: u8,
    pub timeout: u32,
}

#[derive(Debug, Serialize)]
pub struct LearningStopResponse {
    pub success: bool,
    pub was_active: bool,
}

#[derive(Debug, Serialize)]
pub struct ReceivedCode {
    pub protocol: String,
    pub code: String,
    pub bits: u16,
}

impl From<IrCode> for ReceivedCode {
    fn from(code: IrCode) -> Self {
        Self {
            protocol: code.protocol.to_string(),
            code: code.value_hex(),
            bits: code.bits,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LearningStatusResponse {
    pub active: bool,
    pub port: Option<u8>,
    pub received_code: Option<ReceivedCode>,
    pub elapsed_seconds: u64,
}

impl From<LearningStatus> for LearningStatusResponse {
    fn from(status: LearningStatus) -> Self {
        Self {
            active: status.active,
            port: status.port.map(|g| g.number()),
            received_code: status.received_code.map(ReceivedCode::from),
            elapsed_seconds: status.elapsed_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irlink_core::{Gpio, PinCapability, PortMode};
    use irlink_hardware::IrProtocol;

    #[test]
    fn test_port_entry_from_view() {
        let entry = PortEntry::from(PortView {
            port: Port::new(Gpio(34), PortMode::IrInput, "sensor"),
            capability: PinCapability::InputOnly,
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["port"], 34);
        assert_eq!(json["gpio_name"], "GPIO34");
        assert_eq!(json["mode"], "ir_input");
        assert_eq!(json["can_input"], true);
        assert_eq!(json["can_output"], false);
    }

    #[test]
    fn test_received_code_shape() {
        let status = LearningStatusResponse::from(LearningStatus {
            active: true,
            port: Some(Gpio(4)),
            received_code: Some(IrCode::new(IrProtocol::Nec, 0x20DF10EF)),
            elapsed_seconds: 3,
        });
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["received_code"]["code"], "0x20DF10EF");
        assert_eq!(json["received_code"]["protocol"], "nec");
        assert_eq!(json["received_code"]["bits"], 32);
        assert_eq!(json["elapsed_seconds"], 3);
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let req: SendIrRequest = serde_json::from_str(r#"{"output": 4}"#).unwrap();
        assert_eq!(req.output, Some(4));
        assert!(req.code.is_none());
        assert!(require(req.code, "code").is_err());
    }
}
