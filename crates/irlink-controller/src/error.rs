use irlink_core::Gpio;
use irlink_hardware::HardwareError;
use irlink_storage::StorageError;
use thiserror::Error;

/// Errors returned by [`BoardController`](crate::BoardController) operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Port model or identity rule violated
    #[error(transparent)]
    Core(#[from] irlink_core::Error),

    /// IR peripheral failure
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// Configuration could not be written
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Send or test on a port that is not an IR output
    #[error("{gpio} is not configured as an IR output")]
    NotOutputPort { gpio: Gpio },
}

pub type Result<T> = std::result::Result<T, ControllerError>;
